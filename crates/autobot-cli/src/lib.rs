//! Autobot CLI Library
//!
//! Command-line interface for the Autobot vehicle registry.
//!
//! # Overview
//!
//! - **Setup**: write a configuration template (`autobot init`)
//! - **Daemon**: run scheduled syncs and the HTTP API (`autobot serve`)
//! - **Sync**: run one sync for a provider (`autobot sync -p dmr`)
//! - **Queries**: look up vehicles, list them as CSV and inspect the store
//!   (`autobot lookup`, `autobot query`, `autobot status`)
//! - **Maintenance**: clear the store, enable or disable vehicles
//!
//! Every command except `init`, `version` and `serve` works directly on the
//! store file named in the configuration.

pub mod commands;
pub mod error;

pub use error::{CliError, Result};

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Autobot - vehicle registry synchronization
#[derive(Parser, Debug)]
#[command(name = "autobot")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file
    #[arg(short, long, env = "AUTOBOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a configuration template
    Init {
        /// Target file
        #[arg(default_value = "autobot.toml")]
        path: PathBuf,
    },

    /// Print version information
    Version,

    /// Run the daemon: scheduled syncs and the HTTP API
    Serve,

    /// Synchronize one provider now
    Sync {
        /// Provider name from the configuration
        #[arg(short, long)]
        provider: String,
    },

    /// Look up a vehicle
    Lookup(LookupArgs),

    /// List vehicles as CSV
    Query(QueryArgs),

    /// Show store and provider status
    Status,

    /// Remove every vehicle and the whole sync history
    Clear,

    /// Make a vehicle visible to lookups again
    Enable {
        /// Content hash of the vehicle
        #[arg(long)]
        hash: String,
    },

    /// Hide a vehicle from registration number and VIN lookups
    Disable {
        /// Content hash of the vehicle
        #[arg(long)]
        hash: String,
    },
}

/// Arguments of `autobot lookup`
#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("key")
        .required(true)
        .args(["hash", "regnr", "vin"]),
))]
pub struct LookupArgs {
    /// Content hash
    #[arg(long)]
    pub hash: Option<String>,

    /// Registration number
    #[arg(long)]
    pub regnr: Option<String>,

    /// Vehicle identification number
    #[arg(long)]
    pub vin: Option<String>,

    /// Registration country
    #[arg(long, default_value = "dk")]
    pub country: String,

    /// Include disabled vehicles
    #[arg(long)]
    pub disabled: bool,
}

/// Arguments of `autobot query`
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Maximum number of vehicles to print
    #[arg(short, long, default_value_t = 100)]
    pub limit: usize,

    /// Include disabled vehicles
    #[arg(long)]
    pub disabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_lookup_requires_one_key() {
        assert!(Cli::try_parse_from(["autobot", "lookup"]).is_err());
        assert!(Cli::try_parse_from(["autobot", "lookup", "--hash", "1", "--vin", "X"]).is_err());

        let cli = Cli::try_parse_from(["autobot", "lookup", "--regnr", "AB12345"]).unwrap();
        match cli.command {
            Commands::Lookup(args) => {
                assert_eq!(args.country, "dk");
                assert!(!args.disabled);
            },
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_sync_takes_provider() {
        let cli = Cli::try_parse_from(["autobot", "sync", "-p", "dmr"]).unwrap();
        assert!(matches!(cli.command, Commands::Sync { provider } if provider == "dmr"));
    }

    #[test]
    fn test_query_defaults() {
        let cli = Cli::try_parse_from(["autobot", "query"]).unwrap();
        assert!(matches!(cli.command, Commands::Query(args) if args.limit == 100 && !args.disabled));

        let cli = Cli::try_parse_from(["autobot", "query", "-l", "5", "--disabled"]).unwrap();
        assert!(matches!(cli.command, Commands::Query(args) if args.limit == 5 && args.disabled));
    }
}
