//! `autobot lookup` command implementation

use autobot_common::{ContentHash, Country};
use autobot_server::config::Config;

use super::open_store;
use crate::error::Result;
use crate::LookupArgs;

/// Look up one vehicle and print it
pub async fn run(config: &Config, args: &LookupArgs) -> Result<()> {
    let store = open_store(config).await?;

    let vehicle = if let Some(hash) = &args.hash {
        store.lookup_by_hash(hash.parse::<ContentHash>()?).await?
    } else {
        let country: Country = args.country.parse()?;
        match (&args.regnr, &args.vin) {
            (Some(regnr), _) => store.lookup_by_reg_nr(country, regnr, args.disabled).await?,
            (_, Some(vin)) => store.lookup_by_vin(country, vin, args.disabled).await?,
            (None, None) => {
                return Err(anyhow::anyhow!("one of --hash, --regnr or --vin is required").into())
            },
        }
    };

    print!("{}", vehicle.render("\n", "  "));
    Ok(())
}
