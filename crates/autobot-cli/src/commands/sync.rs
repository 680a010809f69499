//! `autobot sync` command implementation
//!
//! Runs one sync for a configured provider in the foreground.

use autobot_server::config::Config;
use autobot_server::ingest::SyncOutcome;
use colored::Colorize;

use super::open_store;
use crate::error::{CliError, Result};

/// Sync `provider` now
pub async fn run(config: &Config, provider: &str) -> Result<()> {
    if !config.providers.contains_key(provider) {
        let known: Vec<&str> = config.providers.keys().map(String::as_str).collect();
        let known = if known.is_empty() {
            "none".to_string()
        } else {
            known.join(", ")
        };
        return Err(CliError::UnknownProvider(provider.to_string(), known));
    }

    let store = open_store(config).await?;
    let orchestrator = autobot_server::build_orchestrator(config, store);

    println!("Syncing {}...", provider.cyan());
    let report = orchestrator.sync(provider).await?;

    match report.outcome {
        SyncOutcome::NoNewData => {
            println!(
                "{} latest export {} was already synced",
                "No new data:".yellow().bold(),
                report.filename
            );
        },
        SyncOutcome::Synced => {
            println!("{} {}", "Synced".green().bold(), report.filename);
            println!("  Processed: {}", report.counts.processed);
            println!("  Kept:      {}", report.counts.kept);
            println!("  Stored:    {}", report.counts.stored);
            println!("  Discarded: {}", report.discarded);
            println!("  Duration:  {} ms", report.duration().num_milliseconds());
        },
    }

    Ok(())
}
