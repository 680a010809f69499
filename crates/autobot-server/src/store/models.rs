//! Value types returned by and persisted with the vehicle store

use autobot_common::{AutobotError, ContentHash, Country};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::vehicle::normalize_identifier;

/// Secondary index key, externally `<COUNTRY>:<UPPER-CASED VALUE>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndexKey {
    pub country: Country,
    pub value: String,
}

impl IndexKey {
    pub fn new(country: Country, value: &str) -> Self {
        Self {
            country,
            value: normalize_identifier(value),
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.country.code(), self.value)
    }
}

impl FromStr for IndexKey {
    type Err = AutobotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (country, value) = s
            .split_once(':')
            .ok_or_else(|| AutobotError::Store(format!("malformed index key '{}'", s)))?;
        Ok(Self::new(country.parse()?, value))
    }
}

impl TryFrom<String> for IndexKey {
    type Error = AutobotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IndexKey> for String {
    fn from(key: IndexKey) -> Self {
        key.to_string()
    }
}

/// Counters attached to a sync log entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    /// Excerpts handled by the pipeline
    pub processed: u64,
    /// Vehicles emitted by the pipeline, duplicates included
    pub kept: u64,
    /// Distinct vehicles written to the store
    pub stored: u64,
}

/// How a history entry came about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogOutcome {
    #[default]
    Info,
    Completed,
    NoNewData,
    Failed,
}

/// One entry of the append-only synchronization history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub logged_at: DateTime<Utc>,
    pub outcome: LogOutcome,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<SyncCounts>,
}

impl SyncLogEntry {
    pub fn new(outcome: LogOutcome, message: impl Into<String>) -> Self {
        Self {
            logged_at: Utc::now(),
            outcome,
            message: message.into(),
            counts: None,
        }
    }

    pub fn with_counts(mut self, counts: SyncCounts) -> Self {
        self.counts = Some(counts);
        self
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == LogOutcome::Failed
    }
}

/// Sync mark and history entry committed together with a batch
#[derive(Debug, Clone)]
pub struct SyncCommit {
    pub provider: String,
    pub filename: String,
    pub entry: SyncLogEntry,
}

/// Result of a single upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// A secondary index entry pointed at another hash and was replaced
    Overridden { previous: ContentHash },
}

/// Aggregate result of a batch upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub inserted: u64,
    pub updated: u64,
    pub overridden: u64,
}

impl BatchOutcome {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Overridden { .. } => self.overridden += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.overridden
    }
}

/// Snapshot of store health for status queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub vehicles: usize,
    pub history_size: usize,
    pub last_status_at: Option<DateTime<Utc>>,
    pub last_status_message: Option<String>,
}
