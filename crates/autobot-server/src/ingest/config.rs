//! Ingestion configuration
//!
//! Pipeline tuning and per-provider settings, deserialized from the
//! `[pipeline]` and `[providers.NAME]` sections of the configuration file.

use autobot_common::Country;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What the pipeline does with an excerpt that cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// Abort the whole run
    #[default]
    Strict,
    /// Skip the excerpt and count it as discarded
    Lenient,
}

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Number of concurrent parser workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the excerpt queue and of the result sink
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default)]
    pub decode_policy: DecodePolicy,

    /// Local name of the element enclosing one record
    #[serde(default = "default_record_tag")]
    pub record_tag: String,

    /// Type code of the records that are kept
    #[serde(default = "default_primary_type")]
    pub primary_type: u32,
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}

fn default_record_tag() -> String {
    "Statistik".to_string()
}

fn default_primary_type() -> u32 {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            decode_policy: DecodePolicy::default(),
            record_tag: default_record_tag(),
            primary_type: default_primary_type(),
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("pipeline.workers must be at least 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("pipeline.queue_capacity must be at least 1".to_string());
        }
        if self.record_tag.trim().is_empty() {
            return Err("pipeline.record_tag cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Kind of source a provider talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ftp,
    /// A directory on the local filesystem, mostly for tests and mirrors
    Local,
}

/// Settings of one named provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    #[serde(default)]
    pub host: String,

    #[serde(default = "default_ftp_port")]
    pub port: u16,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Remote directory, or the local directory for `kind = "local"`
    #[serde(default)]
    pub dir: String,

    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Export extension without the dot
    #[serde(default = "default_file_ext")]
    pub file_ext: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Cron expression with a leading seconds field; unscheduled when absent
    #[serde(default)]
    pub schedule: Option<String>,

    #[serde(default)]
    pub country: Country,

    /// Register name recorded on every vehicle from this provider
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_ftp_port() -> u16 {
    21
}

fn default_user() -> String {
    "anonymous".to_string()
}

fn default_file_prefix() -> String {
    "ESStatistikListeModtag-".to_string()
}

fn default_file_ext() -> String {
    "zip".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_source() -> String {
    "DMR".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            host: String::new(),
            port: default_ftp_port(),
            user: default_user(),
            password: String::new(),
            dir: String::new(),
            file_prefix: default_file_prefix(),
            file_ext: default_file_ext(),
            timeout_secs: default_timeout_secs(),
            schedule: None,
            country: Country::default(),
            source: default_source(),
        }
    }
}

impl ProviderConfig {
    /// Provider reading exports from a local directory
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        Self {
            kind: ProviderKind::Local,
            dir: dir.into().to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self, name: &str) -> Result<(), String> {
        if self.file_prefix.is_empty() {
            return Err(format!("providers.{}.file_prefix cannot be empty", name));
        }
        if self.file_ext.is_empty() || self.file_ext.starts_with('.') {
            return Err(format!(
                "providers.{}.file_ext must be an extension without the dot",
                name
            ));
        }
        if self.timeout_secs == 0 {
            return Err(format!("providers.{}.timeout_secs must be positive", name));
        }
        match self.kind {
            ProviderKind::Ftp => {
                if self.host.trim().is_empty() {
                    return Err(format!("providers.{}.host is required for FTP", name));
                }
                if self.port == 0 {
                    return Err(format!("providers.{}.port cannot be 0", name));
                }
            },
            ProviderKind::Local => {
                if self.dir.trim().is_empty() {
                    return Err(format!("providers.{}.dir is required for local", name));
                }
            },
        }
        Ok(())
    }
}
