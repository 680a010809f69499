//! Sync scheduler
//!
//! Registers one cron job per provider that has a `schedule`. Scheduled runs
//! go through [`SyncOrchestrator::sync`] like manual ones, so a tick that
//! fires while the provider is still syncing is skipped.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use super::config::ProviderConfig;
use super::orchestrator::{SyncError, SyncOrchestrator};

pub struct SyncScheduler {
    scheduler: JobScheduler,
    jobs: usize,
}

impl SyncScheduler {
    /// Build the scheduler and add a job for every scheduled provider
    ///
    /// Providers without a schedule only sync when triggered manually.
    pub async fn new(
        orchestrator: Arc<SyncOrchestrator>,
        providers: &BTreeMap<String, ProviderConfig>,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .context("failed to create sync scheduler")?;

        let mut jobs = 0;
        for (name, config) in providers {
            let Some(cron) = config.schedule.as_deref() else {
                info!(provider = %name, "Provider has no schedule, manual sync only");
                continue;
            };

            let job = sync_job(cron, name.clone(), orchestrator.clone())
                .with_context(|| format!("invalid schedule '{}' for provider '{}'", cron, name))?;
            scheduler
                .add(job)
                .await
                .with_context(|| format!("failed to schedule provider '{}'", name))?;

            info!(provider = %name, schedule = cron, "Scheduled provider sync");
            jobs += 1;
        }

        Ok(Self { scheduler, jobs })
    }

    pub fn job_count(&self) -> usize {
        self.jobs
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .context("failed to start sync scheduler")?;
        info!(jobs = self.jobs, "Sync scheduler started");
        Ok(())
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .context("failed to stop sync scheduler")?;
        info!("Sync scheduler stopped");
        Ok(())
    }
}

fn sync_job(
    cron: &str,
    provider: String,
    orchestrator: Arc<SyncOrchestrator>,
) -> std::result::Result<Job, tokio_cron_scheduler::JobSchedulerError> {
    Job::new_async(cron, move |_uuid, _lock| {
        let provider = provider.clone();
        let orchestrator = orchestrator.clone();
        Box::pin(async move {
            match orchestrator.sync(&provider).await {
                Ok(report) => info!(
                    provider = %provider,
                    file = %report.filename,
                    outcome = ?report.outcome,
                    "Scheduled sync finished"
                ),
                Err(SyncError::AlreadyRunning(_)) => {
                    warn!(provider = %provider, "Previous sync still running, skipping tick")
                },
                Err(e) => error!(provider = %provider, error = %e, "Scheduled sync failed"),
            }
        })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ingest::config::PipelineConfig;
    use crate::store::VehicleStore;

    fn orchestrator(providers: &BTreeMap<String, ProviderConfig>) -> Arc<SyncOrchestrator> {
        Arc::new(SyncOrchestrator::from_config(
            Arc::new(VehicleStore::in_memory()),
            PipelineConfig::default(),
            providers,
        ))
    }

    #[tokio::test]
    async fn test_only_scheduled_providers_get_jobs() {
        let mut providers = BTreeMap::new();
        providers.insert(
            "nightly".to_string(),
            ProviderConfig {
                schedule: Some("0 0 4 * * *".to_string()),
                ..ProviderConfig::local("/tmp")
            },
        );
        providers.insert("manual".to_string(), ProviderConfig::local("/tmp"));

        let scheduler = SyncScheduler::new(orchestrator(&providers), &providers)
            .await
            .unwrap();
        assert_eq!(scheduler.job_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_cron_is_rejected() {
        let mut providers = BTreeMap::new();
        providers.insert(
            "broken".to_string(),
            ProviderConfig {
                schedule: Some("every night".to_string()),
                ..ProviderConfig::local("/tmp")
            },
        );

        let err = SyncScheduler::new(orchestrator(&providers), &providers)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("broken"));
    }
}
