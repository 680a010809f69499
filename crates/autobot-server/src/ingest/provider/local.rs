//! Local directory export provider

use async_trait::async_trait;
use autobot_common::{AutobotError, Result};
use std::path::PathBuf;
use tracing::{debug, info};

use super::{select_latest, Provider, SessionContext};
use crate::ingest::common::stream::{spawn_producer, DEFAULT_PIPE_CAPACITY};
use crate::ingest::common::{decompress, Compression, ExportStream};
use crate::ingest::config::ProviderConfig;

/// Reads exports from a directory on the local filesystem
///
/// Used for mirrored exports and in tests. File reads run on their own
/// thread through the same bounded pipe as FTP transfers.
pub struct LocalDirProvider {
    config: ProviderConfig,
    open: bool,
    last_synced: Option<String>,
    selected: Option<String>,
}

impl LocalDirProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            open: false,
            last_synced: None,
            selected: None,
        }
    }

    fn dir(&self) -> PathBuf {
        PathBuf::from(&self.config.dir)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(AutobotError::Connection("local provider is not open".to_string()))
        }
    }
}

#[async_trait]
impl Provider for LocalDirProvider {
    async fn open(&mut self, ctx: &SessionContext) -> Result<()> {
        let dir = self.dir();
        let meta = tokio::fs::metadata(&dir).await.map_err(|e| {
            AutobotError::Connection(format!("cannot access {}: {}", dir.display(), e))
        })?;
        if !meta.is_dir() {
            return Err(AutobotError::Connection(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        info!(dir = %dir.display(), "Opened local export directory");
        self.last_synced = ctx.last_synced.clone();
        self.selected = ctx.last_synced.clone();
        self.open = true;
        Ok(())
    }

    async fn check_for_latest(&mut self) -> Result<String> {
        self.ensure_open()?;

        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(self.dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

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
        self.ensure_open()?;
        let name = self
            .selected
            .clone()
            .ok_or_else(|| AutobotError::NotFound("no export selected".to_string()))?;
        let path = self.dir().join(&name);

        let mut file = std::fs::File::open(&path)
            .map_err(|_| AutobotError::NotFound(format!("no such file {}", path.display())))?;
        info!(file = %path.display(), "Streaming export");

        let raw = spawn_producer("local-read", DEFAULT_PIPE_CAPACITY, move |writer| {
            std::io::copy(&mut file, writer).map(|_| ())
        })?;
        decompress(Box::new(raw), Compression::from_filename(&name))
    }

    async fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}
