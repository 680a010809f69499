//! `autobot enable` and `autobot disable` command implementations

use autobot_common::ContentHash;
use autobot_server::config::Config;
use colored::Colorize;

use super::open_store;
use crate::error::Result;

/// Make the vehicle with `hash` visible to lookups again
pub async fn enable(config: &Config, hash: &str) -> Result<()> {
    let hash: ContentHash = hash.parse()?;
    open_store(config).await?.enable(hash).await?;
    println!("{} #{}", "Enabled".green().bold(), hash);
    Ok(())
}

/// Hide the vehicle with `hash` from registration number and VIN lookups
pub async fn disable(config: &Config, hash: &str) -> Result<()> {
    let hash: ContentHash = hash.parse()?;
    open_store(config).await?.disable(hash).await?;
    println!("{} #{}", "Disabled".yellow().bold(), hash);
    Ok(())
}
