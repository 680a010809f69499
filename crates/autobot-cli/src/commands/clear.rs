//! `autobot clear` command implementation

use autobot_server::config::Config;
use colored::Colorize;

use super::open_store;
use crate::error::Result;

/// Remove every vehicle, index entry, history entry and sync mark
pub async fn run(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let vehicles = store.len().await;
    store.clear().await?;

    println!("{} {} vehicles and the sync history", "Cleared".green().bold(), vehicles);
    Ok(())
}
