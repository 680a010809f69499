//! Sync orchestrator
//!
//! Drives one provider through a sync run: open a session, select the newest
//! export, stream it through the ingestion pipeline and commit the result to
//! the vehicle store together with the sync mark and a history entry.
//!
//! Every provider has at most one run in flight. A second trigger while a run
//! is active is rejected, never queued. Manual and scheduled triggers both end
//! up in [`SyncOrchestrator::sync`].

use autobot_common::{AutobotError, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use super::config::{PipelineConfig, ProviderConfig};
use super::dmr::DmrParser;
use super::framework::{IngestionPipeline, RecordParser};
use super::models::{ProviderState, SyncOutcome, SyncReport, SyncStatus};
use super::provider::{factory_for, Provider, ProviderFactory, SessionContext};
use crate::store::{LogOutcome, SyncCommit, SyncCounts, SyncLogEntry, VehicleStore};

/// Errors returned by [`SyncOrchestrator::sync`]
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("provider '{0}' is already syncing")]
    AlreadyRunning(String),

    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error(transparent)]
    Failed(#[from] AutobotError),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::AlreadyRunning(_) => "ALREADY_RUNNING",
            SyncError::UnknownProvider(_) => "UNKNOWN_PROVIDER",
            SyncError::Failed(e) => e.code(),
        }
    }
}

/// A provider registered under a name
#[derive(Clone)]
pub struct RegisteredProvider {
    pub factory: ProviderFactory,
    pub parser: Arc<dyn RecordParser>,
    /// Bound on every provider operation
    pub timeout: Duration,
}

impl RegisteredProvider {
    pub fn from_config(config: &ProviderConfig, pipeline: &PipelineConfig) -> Self {
        Self {
            factory: factory_for(config.clone()),
            parser: Arc::new(DmrParser::new(
                config.country,
                pipeline.primary_type,
                config.source.clone(),
            )),
            timeout: config.timeout(),
        }
    }
}

pub struct SyncOrchestrator {
    store: Arc<VehicleStore>,
    pipeline_config: PipelineConfig,
    providers: HashMap<String, RegisteredProvider>,
    states: StdMutex<HashMap<String, ProviderState>>,
    shutdown: CancellationToken,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<VehicleStore>, pipeline_config: PipelineConfig) -> Self {
        Self {
            store,
            pipeline_config,
            providers: HashMap::new(),
            states: StdMutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Orchestrator with one DMR provider per configured entry
    pub fn from_config(
        store: Arc<VehicleStore>,
        pipeline_config: PipelineConfig,
        providers: &BTreeMap<String, ProviderConfig>,
    ) -> Self {
        let mut orchestrator = Self::new(store, pipeline_config);
        for (name, config) in providers {
            let registered = RegisteredProvider::from_config(config, &orchestrator.pipeline_config);
            orchestrator.register(name.clone(), registered);
        }
        orchestrator
    }

    /// Register or replace a provider
    pub fn register(&mut self, name: impl Into<String>, provider: RegisteredProvider) {
        let name = name.into();
        if let Ok(mut states) = self.states.lock() {
            states.entry(name.clone()).or_default();
        }
        self.providers.insert(name, provider);
    }

    pub fn store(&self) -> &Arc<VehicleStore> {
        &self.store
    }

    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn status(&self, name: &str) -> Option<ProviderState> {
        self.states.lock().ok()?.get(name).cloned()
    }

    pub fn statuses(&self) -> BTreeMap<String, ProviderState> {
        self.states
            .lock()
            .map(|states| states.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Cancel in-flight pipeline runs; they fail and keep the store unchanged
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Run one sync for `name`
    pub async fn sync(&self, name: &str) -> std::result::Result<SyncReport, SyncError> {
        let registered = self
            .providers
            .get(name)
            .cloned()
            .ok_or_else(|| SyncError::UnknownProvider(name.to_string()))?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let guard = self.begin(name, run_id, started_at)?;

        let span = info_span!("sync", %run_id, provider = %name, file = field::Empty);
        let result = self
            .run(name, &registered, run_id, started_at)
            .instrument(span.clone())
            .await;

        match result {
            Ok(report) => {
                span.in_scope(|| {
                    info!(
                        outcome = ?report.outcome,
                        processed = report.counts.processed,
                        stored = report.counts.stored,
                        duration_ms = report.duration().num_milliseconds(),
                        "Sync finished"
                    )
                });
                guard.finish(SyncStatus::Completed, None);
                Ok(report)
            },
            Err(e) => {
                span.in_scope(|| error!(error = %e, "Sync failed"));
                let entry = SyncLogEntry::new(
                    LogOutcome::Failed,
                    format!("sync of '{}' failed: {}", name, e),
                );
                if let Err(log_err) = self.store.append_log(entry).await {
                    warn!(provider = %name, error = %log_err, "Could not record failed sync");
                }
                guard.finish(SyncStatus::Failed, Some(e.to_string()));
                Err(SyncError::Failed(e))
            },
        }
    }

    /// Mark `name` as running unless a run is already in flight
    fn begin(
        &self,
        name: &str,
        run_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> std::result::Result<RunGuard<'_>, SyncError> {
        let mut states = self
            .states
            .lock()
            .map_err(|_| AutobotError::Store("provider state lock poisoned".to_string()))?;
        let state = states.entry(name.to_string()).or_default();
        if state.is_running() {
            return Err(SyncError::AlreadyRunning(name.to_string()));
        }
        state.status = SyncStatus::Running;
        state.last_run_id = Some(run_id);
        state.last_started_at = Some(started_at);
        state.last_error = None;

        Ok(RunGuard {
            states: &self.states,
            name: name.to_string(),
            done: false,
        })
    }

    async fn run(
        &self,
        name: &str,
        registered: &RegisteredProvider,
        run_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<SyncReport> {
        let mut provider = (registered.factory)()?;
        let last_synced = self.store.sync_mark(name).await;

        let result = self
            .drive(provider.as_mut(), name, registered, last_synced, run_id, started_at)
            .await;

        match bounded(registered.timeout, "close", provider.close()).await {
            Ok(()) => {},
            Err(e) => warn!(kind = provider.kind(), error = %e, "Closing provider session failed"),
        }
        result
    }

    async fn drive(
        &self,
        provider: &mut dyn Provider,
        name: &str,
        registered: &RegisteredProvider,
        last_synced: Option<String>,
        run_id: Uuid,
        started_at: DateTime<Utc>,
    ) -> Result<SyncReport> {
        let timeout = registered.timeout;
        info!(kind = provider.kind(), baseline = ?last_synced, "Opening provider session");

        bounded(timeout, "open", provider.open(&SessionContext::new(last_synced.clone()))).await?;
        let latest = bounded(timeout, "check_for_latest", provider.check_for_latest()).await?;
        Span::current().record("file", latest.as_str());

        let report = |outcome, counts, discarded| SyncReport {
            run_id,
            provider: name.to_string(),
            filename: latest.clone(),
            outcome,
            counts,
            discarded,
            started_at,
            finished_at: Utc::now(),
        };

        if last_synced.as_deref() == Some(latest.as_str()) {
            info!("No new export since last sync");
            self.store
                .append_log(SyncLogEntry::new(
                    LogOutcome::NoNewData,
                    format!("no new data for '{}', latest is still {}", name, latest),
                ))
                .await?;
            return Ok(report(SyncOutcome::NoNewData, SyncCounts::default(), 0));
        }

        info!("Ingesting new export");
        let stream = bounded(timeout, "provide", provider.provide()).await?;

        let pipeline =
            IngestionPipeline::new(registered.parser.clone(), self.pipeline_config.clone());
        let output = pipeline.run(stream, &self.shutdown).await?;

        let counts = SyncCounts {
            processed: output.processed,
            kept: output.kept,
            stored: output.vehicles.len() as u64,
        };
        let entry = SyncLogEntry::new(
            LogOutcome::Completed,
            format!(
                "synced {} for '{}': {} processed, {} kept, {} stored, {} discarded",
                latest, name, counts.processed, counts.kept, counts.stored, output.discarded
            ),
        )
        .with_counts(counts);

        self.store
            .upsert_batch(
                output.vehicles,
                Some(SyncCommit {
                    provider: name.to_string(),
                    filename: latest.clone(),
                    entry,
                }),
            )
            .await?;

        Ok(report(SyncOutcome::Synced, counts, output.discarded))
    }
}

/// Apply the provider timeout to one operation
async fn bounded<T>(
    timeout: Duration,
    what: &str,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, operation).await.map_err(|_| {
        AutobotError::Connection(format!("provider {} timed out after {:?}", what, timeout))
    })?
}

/// Leaves the provider state consistent when a run future is dropped mid-flight
struct RunGuard<'a> {
    states: &'a StdMutex<HashMap<String, ProviderState>>,
    name: String,
    done: bool,
}

impl RunGuard<'_> {
    fn finish(mut self, status: SyncStatus, error: Option<String>) {
        self.set(status, error);
        self.done = true;
    }

    fn set(&self, status: SyncStatus, error: Option<String>) {
        if let Ok(mut states) = self.states.lock() {
            let state = states.entry(self.name.clone()).or_default();
            state.status = status;
            state.last_finished_at = Some(Utc::now());
            state.last_error = error;
        }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.set(SyncStatus::Failed, Some("sync run was interrupted".to_string()));
        }
    }
}
