//! FTP export provider

use async_trait::async_trait;
use autobot_common::{AutobotError, Result};
use tracing::{debug, info};

use super::{select_latest, Provider, SessionContext};
use crate::ingest::common::ftp::{remote_path, FtpConfig, FtpSession};
use crate::ingest::common::{decompress, Compression, ExportStream};
use crate::ingest::config::ProviderConfig;

/// Reads exports from a directory on an FTP server
pub struct FtpProvider {
    config: ProviderConfig,
    session: Option<FtpSession>,
    last_synced: Option<String>,
    selected: Option<String>,
}

impl FtpProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            session: None,
            last_synced: None,
            selected: None,
        }
    }

    fn ftp_config(&self) -> FtpConfig {
        FtpConfig {
            host: self.config.host.clone(),
            port: self.config.port,
            username: self.config.user.clone(),
            password: self.config.password.clone(),
            timeout: self.config.timeout(),
            ..FtpConfig::default()
        }
    }

    fn session(&mut self) -> Result<&mut FtpSession> {
        self.session
            .as_mut()
            .ok_or_else(|| AutobotError::Connection("FTP provider is not open".to_string()))
    }
}

#[async_trait]
impl Provider for FtpProvider {
    async fn open(&mut self, ctx: &SessionContext) -> Result<()> {
        info!(
            host = %self.config.host,
            port = self.config.port,
            "Connecting to export server"
        );
        self.last_synced = ctx.last_synced.clone();
        self.selected = ctx.last_synced.clone();
        self.session = Some(FtpSession::open(&self.ftp_config()).await?);
        Ok(())
    }

    async fn check_for_latest(&mut self) -> Result<String> {
        let dir = self.config.dir.clone();
        let files = self.session()?.list_files(&dir).await?;

        let latest = select_latest(
            &files,
            self.last_synced.as_deref(),
            &self.config.file_prefix,
            &self.config.file_ext,
        )?;
        debug!(latest = %latest, listed = files.len(), "Selected newest export");
        self.selected = Some(latest.clone());
        Ok(latest)
    }

    async fn provide(&mut self) -> Result<ExportStream> {
        let name = self
            .selected
            .clone()
            .ok_or_else(|| AutobotError::NotFound("no export selected".to_string()))?;
        let path = remote_path(&self.config.dir, &name);

        let size = self.session()?.size(&path).await?;
        info!(file = %path, size, "Streaming export");

        // The transfer owns the connection from here on
        let session = self
            .session
            .take()
            .ok_or_else(|| AutobotError::Connection("FTP provider is not open".to_string()))?;
        let raw = session.retrieve(&path)?;

        decompress(Box::new(raw), Compression::from_filename(&name))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            session.quit().await?;
            debug!("FTP session closed");
        }
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "ftp"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_without_open_is_ok() {
        let mut provider = FtpProvider::new(ProviderConfig::default());
        provider.close().await.unwrap();
        provider.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_operations_require_open_session() {
        let mut provider = FtpProvider::new(ProviderConfig::default());
        let err = provider.check_for_latest().await.unwrap_err();
        assert_eq!(err.code(), "CONNECTION_ERROR");
        let err = provider.provide().await.err().unwrap();
        assert!(err.is_not_found());
    }
}
