//! Persistence backends for the vehicle store

use async_trait::async_trait;
use autobot_common::{AutobotError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::state::StoreState;

/// Where the store keeps its state between restarts
///
/// `persist` is called with the complete state after every committed
/// mutation, while the store's write lock is held. A failed `persist` makes
/// the store roll the mutation back.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Load previously persisted state, `None` if there is none yet
    async fn load(&self) -> Result<Option<StoreState>>;

    async fn persist(&self, state: &StoreState) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Keeps nothing; state lives only as long as the process
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryBackend;

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<StoreState>> {
        Ok(None)
    }

    async fn persist(&self, _state: &StoreState) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// JSON snapshot of the whole store in a single file
///
/// Writes go to a sibling temporary file which is then renamed over the
/// snapshot, so a crash mid-write never leaves a truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct SnapshotFileBackend {
    path: PathBuf,
}

impl SnapshotFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StoreBackend for SnapshotFileBackend {
    async fn load(&self) -> Result<Option<StoreState>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let state: StoreState = serde_json::from_slice(&bytes).map_err(|e| {
            AutobotError::Store(format!(
                "corrupt store snapshot {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!(path = %self.path.display(), vehicles = state.vehicles.len(), "Loaded store snapshot");
        Ok(Some(state))
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        let bytes = serde_json::to_vec(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| persist_error(&self.path, e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|e| persist_error(&temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| persist_error(&self.path, e))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Persisted store snapshot");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "snapshot-file"
    }
}

fn persist_error(path: &Path, err: std::io::Error) -> AutobotError {
    AutobotError::Store(format!("failed to write {}: {}", path.display(), err))
}
