//! Vehicle data ingestion
//!
//! # Architecture
//!
//! - **provider**: Access to export sources (FTP, local directory)
//! - **common**: Version discovery, decompression and streaming shared by providers
//! - **framework**: Concurrent excerpt pipeline (splitter, parser workers, coordinator)
//! - **dmr**: Parser for Danish Motor Register statistics records
//! - **orchestrator**: Single-flight sync runs per provider
//! - **scheduler**: Cron triggers for scheduled providers
//! - **config**: Pipeline and provider settings
//! - **models**: Sync state and run reports

pub mod common;
pub mod config;
pub mod dmr;
pub mod framework;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod scheduler;

pub use config::{DecodePolicy, PipelineConfig, ProviderConfig, ProviderKind};
pub use models::{ProviderState, SyncOutcome, SyncReport, SyncStatus};
pub use orchestrator::{RegisteredProvider, SyncError, SyncOrchestrator};
pub use scheduler::SyncScheduler;
