//! Error types for the Autobot CLI
//!
//! Messages are user-facing; every error carries a stable kind that `main`
//! prints alongside the message.

use autobot_common::AutobotError;
use autobot_server::ingest::SyncError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration missing or invalid
    #[error("Configuration error: {0:#}. Run 'autobot init' to create a configuration file.")]
    Config(anyhow::Error),

    /// Provider not present in the configuration
    #[error("Unknown provider '{0}'. Configured providers: {1}")]
    UnknownProvider(String, String),

    #[error(transparent)]
    Autobot(#[from] AutobotError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("{0:#}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Stable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CONFIG_ERROR",
            CliError::UnknownProvider(..) => "UNKNOWN_PROVIDER",
            CliError::Autobot(e) => e.code(),
            CliError::Sync(e) => e.code(),
            CliError::Other(_) => "ERROR",
        }
    }
}
