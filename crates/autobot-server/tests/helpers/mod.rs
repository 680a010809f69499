//! Test helpers for Autobot server integration tests
//!
//! This module provides utilities for:
//! - Tracing setup
//! - Export fixtures on disk
//! - Orchestrators wired to a local export directory

#![allow(dead_code)]

pub mod fixtures;

use autobot_server::ingest::{PipelineConfig, ProviderConfig, SyncOrchestrator};
use autobot_server::store::VehicleStore;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub use fixtures::*;

/// Provider name used by [`local_orchestrator`]
pub const PROVIDER: &str = "dmr";

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,autobot_server=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Local provider reading `dir`
pub fn local_provider(dir: &Path) -> ProviderConfig {
    ProviderConfig::local(dir)
}

/// Orchestrator with one local provider named [`PROVIDER`]
pub fn local_orchestrator(
    store: Arc<VehicleStore>,
    dir: &Path,
    pipeline: PipelineConfig,
) -> SyncOrchestrator {
    let mut providers = BTreeMap::new();
    providers.insert(PROVIDER.to_string(), local_provider(dir));
    SyncOrchestrator::from_config(store, pipeline, &providers)
}
