//! Export providers
//!
//! A [`Provider`] is the only component that talks to a data source. One sync
//! run drives it through `open`, `check_for_latest`, `provide` and `close`:
//!
//! ```rust,ignore
//! let mut provider = build_provider(&config)?;
//! provider.open(&SessionContext::new(store.sync_mark("dmr").await)).await?;
//! let latest = provider.check_for_latest().await?;
//! let stream = provider.provide().await?;
//! provider.close().await?;
//! ```

pub mod ftp;
pub mod local;

pub use ftp::FtpProvider;
pub use local::LocalDirProvider;

use async_trait::async_trait;
use autobot_common::{AutobotError, Result};
use std::sync::Arc;

use super::common::{newest_export, ExportName, ExportStream};
use super::config::{ProviderConfig, ProviderKind};

/// Per-session input handed to [`Provider::open`]
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Filename of the last export that was synced successfully
    pub last_synced: Option<String>,
}

impl SessionContext {
    pub fn new(last_synced: Option<String>) -> Self {
        Self { last_synced }
    }
}

/// Access to one external export source
#[async_trait]
pub trait Provider: Send {
    /// Establish a session; fails with a connection error when unreachable
    async fn open(&mut self, ctx: &SessionContext) -> Result<()>;

    /// Select the newest export and remember it for [`Provider::provide`]
    ///
    /// Returns the baseline itself when nothing newer is listed. Fails with
    /// `NotFound` for an empty listing, or when there is no baseline and no
    /// listed export follows the naming convention.
    async fn check_for_latest(&mut self) -> Result<String>;

    /// Stream the selected export, decompressed according to its extension
    async fn provide(&mut self) -> Result<ExportStream>;

    /// Release the session; idempotent and safe after a failed `open`
    async fn close(&mut self) -> Result<()>;

    /// Short label used in logs
    fn kind(&self) -> &'static str;
}

/// Builds a fresh provider for every run
pub type ProviderFactory = Arc<dyn Fn() -> Result<Box<dyn Provider>> + Send + Sync>;

/// Instantiate the provider described by `config`
pub fn build_provider(config: &ProviderConfig) -> Box<dyn Provider> {
    match config.kind {
        ProviderKind::Ftp => Box::new(FtpProvider::new(config.clone())),
        ProviderKind::Local => Box::new(LocalDirProvider::new(config.clone())),
    }
}

/// Factory for a configured provider
pub fn factory_for(config: ProviderConfig) -> ProviderFactory {
    Arc::new(move || -> Result<Box<dyn Provider>> { Ok(build_provider(&config)) })
}

/// Shared selection rule of every provider
///
/// `listing` holds plain file names. The baseline is the last synced name, or
/// the default `<prefix>20000101-000000.<ext>` when nothing was synced yet.
pub(crate) fn select_latest(
    listing: &[String],
    last_synced: Option<&str>,
    prefix: &str,
    ext: &str,
) -> Result<String> {
    if listing.is_empty() {
        return Err(AutobotError::NotFound("export listing is empty".to_string()));
    }

    let default_baseline = ExportName::baseline(prefix, ext);
    let baseline = last_synced.unwrap_or(&default_baseline);

    match newest_export(listing.iter().map(String::as_str), baseline, prefix, ext) {
        Some(newest) => Ok(newest),
        None if last_synced.is_some() => Ok(baseline.to_string()),
        None => Err(AutobotError::NotFound(format!(
            "no export named {}<YYYYMMDD>-<HHMMSS>.{}",
            prefix, ext
        ))),
    }
}
