//! Configuration management
//!
//! Layers, lowest precedence first: built-in defaults, the TOML file
//! (`autobot.toml` unless `AUTOBOT_CONFIG` or `--config` names another) and
//! `AUTOBOT_*` environment variables, where `__` separates nested keys:
//!
//! ```text
//! AUTOBOT_SERVER__PORT=9000
//! AUTOBOT_PIPELINE__DECODE_POLICY=lenient
//! AUTOBOT_PROVIDERS__DMR__PASSWORD=secret
//! ```

use anyhow::Context;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::ingest::config::{PipelineConfig, ProviderConfig};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Configuration file read when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "autobot.toml";

/// Environment variable naming the configuration file.
pub const CONFIG_FILE_ENV: &str = "AUTOBOT_CONFIG";

const ENV_PREFIX: &str = "AUTOBOT_";

/// Written by `autobot init`
pub const TEMPLATE: &str = r#"# Autobot configuration

[server]
host = "127.0.0.1"
port = 8000
shutdown_timeout_secs = 30

[store]
# Snapshot file; the store is kept in memory only when unset
path = "data/vehicles.json"

[pipeline]
workers = 4
queue_capacity = 256
# "strict" aborts a run on an undecodable record, "lenient" skips it
decode_policy = "strict"
record_tag = "Statistik"
primary_type = 1

[providers.dmr]
kind = "ftp"
host = "ftp.example.dk"
port = 21
user = "anonymous"
password = ""
dir = "ESStatistikListeModtag"
file_prefix = "ESStatistikListeModtag-"
file_ext = "zip"
timeout_secs = 300
# sec min hour day-of-month month day-of-week
schedule = "0 0 4 * * *"
country = "dk"
source = "DMR"
"#;

/// Autobot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Vehicle store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Snapshot file; `None` keeps the store in memory only
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load from `path`, `AUTOBOT_CONFIG` or `autobot.toml`, then the environment
    ///
    /// A missing file is fine when it was not named explicitly.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from));

        let file = match explicit {
            Some(file) => {
                if !file.exists() {
                    anyhow::bail!("Configuration file {} does not exist", file.display());
                }
                Some(file)
            },
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            },
        };

        match &file {
            Some(file) => tracing::debug!(config = %file.display(), "Loading configuration file"),
            None => tracing::debug!("No configuration file, using defaults and environment"),
        }

        let config: Config = Self::figment(file.as_deref())
            .extract()
            .context("Failed to load configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Layered sources without validation
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
    }

    /// Parse a TOML document on top of the defaults, ignoring the environment
    pub fn from_toml(toml: &str) -> anyhow::Result<Self> {
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string(toml))
            .extract()
            .context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        self.pipeline.validate().map_err(anyhow::Error::msg)?;

        for (name, provider) in &self.providers {
            provider.validate(name).map_err(anyhow::Error::msg)?;
        }

        if self.providers.is_empty() {
            tracing::warn!("No providers configured - nothing will be synchronized");
        }

        Ok(())
    }

    /// Write the configuration template, refusing to overwrite
    pub fn write_template(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, TEMPLATE)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
