//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod clear;
pub mod init;
pub mod lookup;
pub mod query;
pub mod serve;
pub mod status;
pub mod sync;
pub mod vehicle;
pub mod version;

use autobot_server::config::Config;
use autobot_server::store::VehicleStore;
use std::path::Path;
use std::sync::Arc;

use crate::error::{CliError, Result};

/// Load the configuration named on the command line, or the default one
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).map_err(CliError::Config)
}

/// Open the store configured in `config`
pub async fn open_store(config: &Config) -> Result<Arc<VehicleStore>> {
    if config.store.path.is_none() {
        tracing::warn!("No store path configured, changes are kept in memory only");
    }
    Ok(autobot_server::open_store(config).await?)
}
