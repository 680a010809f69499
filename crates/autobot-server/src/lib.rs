//! Autobot server library
//!
//! Keeps a queryable registry of vehicles synchronized with periodic exports
//! from national vehicle registers.
//!
//! # Overview
//!
//! - **Ingestion**: providers fetch the newest export, a concurrent pipeline
//!   splits and parses it, records are deduplicated by content hash
//! - **Store**: vehicles indexed by hash, registration number and VIN, with an
//!   append-only sync history, optionally snapshotted to a JSON file
//! - **Orchestration**: single-flight sync runs per provider, triggered
//!   manually or by cron schedules
//! - **API**: a small read-mostly HTTP surface built on Axum
//!
//! # Example
//!
//! ```no_run
//! use autobot_server::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     autobot_server::run(config).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod ingest;
pub mod middleware;
pub mod store;
pub mod vehicle;

pub use error::AppError;

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use config::Config;
use ingest::{SyncOrchestrator, SyncScheduler};
use store::VehicleStore;

/// Open the store configured in `config`
pub async fn open_store(config: &Config) -> anyhow::Result<Arc<VehicleStore>> {
    let store = VehicleStore::open_path(config.store.path.as_deref())
        .await
        .context("Failed to open vehicle store")?;
    Ok(Arc::new(store))
}

/// Orchestrator for every configured provider
pub fn build_orchestrator(config: &Config, store: Arc<VehicleStore>) -> SyncOrchestrator {
    SyncOrchestrator::from_config(store, config.pipeline.clone(), &config.providers)
}

/// Run the daemon: scheduled syncs plus the HTTP API, until a shutdown signal
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    info!(vehicles = store.len().await, "Vehicle store ready");

    let orchestrator = Arc::new(build_orchestrator(&config, store.clone()));
    let scheduler = SyncScheduler::new(orchestrator.clone(), &config.providers).await?;
    scheduler.start().await?;

    let served = api::serve(&config.server, api::AppState::new(store)).await;

    orchestrator.shutdown();
    if let Err(e) = scheduler.shutdown().await {
        warn!("Scheduler did not stop cleanly: {:#}", e);
    }

    served
}
