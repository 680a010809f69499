//! Data models for sync runs
//!
//! Models for tracking the per-provider sync state and the outcome of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::SyncCounts;

/// Sync status of one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SyncStatus {
    #[default]
    #[serde(rename = "idle")]
    Idle,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "failed")]
    Failed,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "idle"),
            SyncStatus::Running => write!(f, "running"),
            SyncStatus::Completed => write!(f, "completed"),
            SyncStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SyncStatus::Idle),
            "running" => Ok(SyncStatus::Running),
            "completed" => Ok(SyncStatus::Completed),
            "failed" => Ok(SyncStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid sync status: {}", s)),
        }
    }
}

/// Sync state tracked for every registered provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderState {
    pub status: SyncStatus,
    pub last_run_id: Option<Uuid>,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_finished_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl ProviderState {
    /// Check if a sync is currently running
    pub fn is_running(&self) -> bool {
        self.status == SyncStatus::Running
    }

    /// Check if the last sync failed
    pub fn is_failed(&self) -> bool {
        self.status == SyncStatus::Failed
    }

    /// Get time since the last finished run
    pub fn time_since_last_sync(&self) -> Option<chrono::Duration> {
        self.last_finished_at.map(|t| Utc::now() - t)
    }
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// A new export was ingested
    Synced,
    /// The newest export was already synced; nothing was ingested
    NoNewData,
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub provider: String,
    pub filename: String,
    pub outcome: SyncOutcome,
    pub counts: SyncCounts,
    pub discarded: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_status_round_trip() {
        for status in [
            SyncStatus::Idle,
            SyncStatus::Running,
            SyncStatus::Completed,
            SyncStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<SyncStatus>().unwrap(), status);
        }
        assert!("paused".parse::<SyncStatus>().is_err());
    }

    #[test]
    fn test_provider_state_flags() {
        let state = ProviderState {
            status: SyncStatus::Running,
            ..ProviderState::default()
        };
        assert!(state.is_running());
        assert!(!state.is_failed());
        assert!(state.time_since_last_sync().is_none());
    }
}
