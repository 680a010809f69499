//! `autobot query` command implementation
//!
//! Prints vehicles as CSV with a fixed header:
//! `hash,country,regnr,vin,brand,model,fuel_type,first_reg_date,status`.

use anyhow::Context;
use autobot_server::config::Config;
use autobot_server::vehicle::{status_label, Vehicle, DATE_FORMAT};
use serde::Serialize;
use std::io::{self, Write};

use super::open_store;
use crate::error::Result;
use crate::QueryArgs;

#[derive(Serialize)]
struct Row<'a> {
    hash: String,
    country: &'static str,
    regnr: &'a str,
    vin: &'a str,
    brand: &'a str,
    model: &'a str,
    fuel_type: &'a str,
    first_reg_date: String,
    status: &'static str,
}

impl<'a> From<&'a Vehicle> for Row<'a> {
    fn from(v: &'a Vehicle) -> Self {
        Self {
            hash: v.hash().to_string(),
            country: v.country().code(),
            regnr: &v.reg_nr,
            vin: &v.vin,
            brand: &v.brand,
            model: &v.model,
            fuel_type: &v.fuel_type,
            first_reg_date: v.first_reg_date.format(DATE_FORMAT).to_string(),
            status: status_label(v.is_disabled()),
        }
    }
}

/// List up to `--limit` vehicles
pub async fn run(config: &Config, args: &QueryArgs) -> Result<()> {
    let store = open_store(config).await?;
    let vehicles = store.query(args.limit, args.disabled).await;

    write_csv(&vehicles, io::stdout().lock())?;
    Ok(())
}

/// Write `vehicles` as CSV, header included even when there are none
pub fn write_csv<W: Write>(vehicles: &[Vehicle], out: W) -> anyhow::Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer
        .write_record([
            "hash",
            "country",
            "regnr",
            "vin",
            "brand",
            "model",
            "fuel_type",
            "first_reg_date",
            "status",
        ])
        .context("failed to write CSV header")?;
    for vehicle in vehicles {
        writer
            .serialize(Row::from(vehicle))
            .with_context(|| format!("failed to write vehicle {}", vehicle.hash()))?;
    }
    writer.flush().context("failed to flush CSV output")?;
    Ok(())
}
