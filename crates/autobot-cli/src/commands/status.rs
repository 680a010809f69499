//! `autobot status` command implementation
//!
//! Shows the store size, the last sync history entry and the last synced
//! export of every configured provider.

use autobot_server::config::Config;
use colored::Colorize;

use super::open_store;
use crate::error::Result;

/// Show store and provider status
pub async fn run(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let status = store.status().await;

    println!("{}", "Vehicle Store:".cyan().bold());
    match &config.store.path {
        Some(path) => println!("  Snapshot:     {}", path.display()),
        None => println!("  Snapshot:     (in memory)"),
    }
    println!("  Vehicles:     {}", status.vehicles);
    println!("  History size: {}", status.history_size);
    match (status.last_status_at, &status.last_status_message) {
        (Some(at), Some(message)) => {
            println!("  Last status:  {} ({})", message, at.to_rfc3339());
        },
        _ => println!("  Last status:  never synced"),
    }
    println!();

    println!("{}", "Providers:".cyan().bold());
    if config.providers.is_empty() {
        println!("  none configured");
    }
    for (name, provider) in &config.providers {
        let mark = store.sync_mark(name).await;
        println!("{}", name.green());
        println!("  Kind:        {:?}", provider.kind);
        println!("  Schedule:    {}", provider.schedule.as_deref().unwrap_or("manual"));
        println!("  Last synced: {}", mark.as_deref().unwrap_or("never"));
    }

    Ok(())
}
