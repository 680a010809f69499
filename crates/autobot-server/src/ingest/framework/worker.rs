//! Parser worker
//!
//! Workers pull excerpts from the shared queue, parse them and push the
//! resulting vehicles into the result sink. Each worker keeps its own
//! counters, which the coordinator sums once every worker has finished.

use autobot_common::AutobotError;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::parser::RecordParser;
use super::types::{Excerpt, PipelineStats};
use crate::ingest::config::DecodePolicy;
use crate::vehicle::Vehicle;

pub(crate) type SharedQueue = Arc<Mutex<mpsc::Receiver<Excerpt>>>;

/// First fatal error of a run; later ones are dropped
#[derive(Debug, Default, Clone)]
pub(crate) struct FatalSlot {
    inner: Arc<StdMutex<Option<AutobotError>>>,
}

impl FatalSlot {
    /// Record `err` unless an earlier error is already recorded
    pub(crate) fn record(&self, err: AutobotError) {
        if let Ok(mut slot) = self.inner.lock() {
            if slot.is_none() {
                *slot = Some(err);
            }
        }
    }

    pub(crate) fn take(&self) -> Option<AutobotError> {
        self.inner.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// One member of the worker pool
pub(crate) struct ParserWorker {
    pub id: usize,
    pub parser: Arc<dyn RecordParser>,
    pub policy: DecodePolicy,
    pub queue: SharedQueue,
    pub sink: mpsc::Sender<Vehicle>,
    pub cancel: CancellationToken,
    pub fatal: FatalSlot,
}

impl ParserWorker {
    async fn next_excerpt(&self) -> Option<Excerpt> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            excerpt = async { self.queue.lock().await.recv().await } => excerpt,
        }
    }

    /// Work until the queue is drained or the run is cancelled
    pub async fn run(self) -> PipelineStats {
        let mut stats = PipelineStats::default();

        while let Some(excerpt) = self.next_excerpt().await {
            stats.processed += 1;

            match self.parser.parse_excerpt(&excerpt.text) {
                Ok(Some(vehicle)) => {
                    stats.kept += 1;
                    let sent = tokio::select! {
                        _ = self.cancel.cancelled() => false,
                        sent = self.sink.send(vehicle) => sent.is_ok(),
                    };
                    if !sent {
                        break;
                    }
                },
                Ok(None) => {},
                Err(e) if e.is_fatal() && self.policy == DecodePolicy::Strict => {
                    warn!(
                        worker = self.id,
                        excerpt = excerpt.index,
                        error = %e,
                        "Undecodable {} excerpt, aborting run",
                        self.parser.record_type()
                    );
                    self.fatal.record(e);
                    self.cancel.cancel();
                    break;
                },
                Err(e) => {
                    stats.discarded += 1;
                    debug!(
                        worker = self.id,
                        excerpt = excerpt.index,
                        error = %e,
                        "Discarded {} excerpt",
                        self.parser.record_type()
                    );
                },
            }
        }

        debug!(
            worker = self.id,
            processed = stats.processed,
            kept = stats.kept,
            discarded = stats.discarded,
            "Worker finished"
        );
        stats
    }
}
