//! Ingestion pipeline coordinator
//!
//! Runs one export through the pipeline:
//! 1. Split: a blocking thread cuts the byte stream into record excerpts and
//!    feeds them into a bounded queue
//! 2. Parse: a fixed pool of workers decodes excerpts concurrently into a
//!    bounded result sink
//! 3. Collect: results are deduplicated by content hash as they arrive
//!
//! The first fatal error cancels the run-scoped token; the splitter and all
//! workers stop, outstanding results are drained, every worker is joined and
//! the error is returned.

use autobot_common::{AutobotError, ContentHash, ParseError, Result};
use std::collections::HashMap;
use std::io::BufReader;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::parser::RecordParser;
use super::splitter::ExcerptSplitter;
use super::types::{PipelineOutput, PipelineStats, SplitSummary};
use super::worker::{FatalSlot, ParserWorker};
use crate::ingest::common::ExportStream;
use crate::ingest::config::{DecodePolicy, PipelineConfig};
use crate::vehicle::Vehicle;

/// Concurrent export parser
#[derive(Clone)]
pub struct IngestionPipeline {
    parser: Arc<dyn RecordParser>,
    config: PipelineConfig,
}

impl IngestionPipeline {
    pub fn new(parser: Arc<dyn RecordParser>, config: PipelineConfig) -> Self {
        Self { parser, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse a whole export
    ///
    /// Cancelling `cancel` stops the run early; the run then fails. Output
    /// order is unspecified.
    #[instrument(skip_all, fields(record_type = self.parser.record_type(), workers = self.config.workers))]
    pub async fn run(&self, source: ExportStream, cancel: &CancellationToken) -> Result<PipelineOutput> {
        let token = cancel.child_token();
        let capacity = self.config.queue_capacity.max(1);
        let fatal = FatalSlot::default();

        let (excerpt_tx, excerpt_rx) = mpsc::channel(capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<Vehicle>(capacity);

        let splitter = ExcerptSplitter::new(self.config.record_tag.clone());
        let split_token = token.clone();
        let split = tokio::task::spawn_blocking(move || {
            splitter.split(BufReader::new(source), |excerpt| {
                !split_token.is_cancelled() && excerpt_tx.blocking_send(excerpt).is_ok()
            })
        });

        let queue = Arc::new(Mutex::new(excerpt_rx));
        let workers: Vec<_> = (0..self.config.workers.max(1))
            .map(|id| {
                tokio::spawn(
                    ParserWorker {
                        id,
                        parser: self.parser.clone(),
                        policy: self.config.decode_policy,
                        queue: queue.clone(),
                        sink: result_tx.clone(),
                        cancel: token.clone(),
                        fatal: fatal.clone(),
                    }
                    .run(),
                )
            })
            .collect();
        drop(queue);
        drop(result_tx);

        // Ends once every worker has dropped its sink
        let mut vehicles: HashMap<ContentHash, Vehicle> = HashMap::new();
        while let Some(vehicle) = result_rx.recv().await {
            vehicles.insert(vehicle.hash(), vehicle);
        }

        let mut stats = PipelineStats::default();
        for joined in futures::future::join_all(workers).await {
            match joined {
                Ok(worker_stats) => stats += worker_stats,
                Err(e) => fatal.record(AutobotError::Parse(ParseError::Fatal(format!(
                    "parser worker failed: {}",
                    e
                )))),
            }
        }

        match split.await {
            Ok(Ok(summary)) => self.check_split(summary, &mut stats, &fatal),
            Ok(Err(e)) => fatal.record(AutobotError::Io(e)),
            Err(e) => fatal.record(AutobotError::Parse(ParseError::Fatal(format!(
                "excerpt splitter failed: {}",
                e
            )))),
        }

        if let Some(err) = fatal.take() {
            warn!(error = %err, processed = stats.processed, "Pipeline run aborted");
            return Err(err);
        }
        if cancel.is_cancelled() {
            return Err(AutobotError::Parse(ParseError::Fatal(
                "pipeline run was cancelled".to_string(),
            )));
        }

        info!(
            processed = stats.processed,
            kept = stats.kept,
            discarded = stats.discarded,
            distinct = vehicles.len(),
            "Pipeline run finished"
        );

        Ok(PipelineOutput {
            vehicles: vehicles.into_values().collect(),
            processed: stats.processed,
            kept: stats.kept,
            discarded: stats.discarded,
        })
    }

    /// Treat records the splitter could not hand out as undecodable excerpts
    ///
    /// That covers records that are not valid UTF-8 and a record left open
    /// at the end of the export.
    fn check_split(&self, summary: SplitSummary, stats: &mut PipelineStats, fatal: &FatalSlot) {
        let undecodable = summary.invalid_utf8 + u64::from(summary.truncated);
        if undecodable == 0 {
            return;
        }
        stats.processed += undecodable;
        match self.config.decode_policy {
            DecodePolicy::Strict if summary.truncated => {
                fatal.record(AutobotError::Parse(ParseError::Fatal(format!(
                    "export ended inside a <{}> record after {} lines",
                    self.config.record_tag, summary.lines
                ))))
            },
            DecodePolicy::Strict => fatal.record(AutobotError::Parse(ParseError::Fatal(format!(
                "{} <{}> records are not valid UTF-8",
                summary.invalid_utf8, self.config.record_tag
            )))),
            DecodePolicy::Lenient => {
                warn!(
                    invalid_utf8 = summary.invalid_utf8,
                    truncated = summary.truncated,
                    "Skipped undecodable records"
                );
                stats.discarded += undecodable;
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::vehicle::tests::sample_vehicle;
    use std::io::Cursor;

    /// Parses `<R>reg;vin;kind</R>` lines, kind 1 is kept, "bad" fails decoding
    struct LineParser;

    impl RecordParser for LineParser {
        fn parse_excerpt(&self, excerpt: &str) -> Result<Option<Vehicle>> {
            let body = excerpt
                .trim()
                .trim_start_matches("<R>")
                .trim_end_matches("</R>");
            let fields: Vec<&str> = body.split(';').collect();
            match fields.as_slice() {
                [reg, vin, "1"] => Ok(Some(sample_vehicle(reg, vin))),
                [_, _, _] => Ok(None),
                _ if body == "skip" => Err(AutobotError::Parse(ParseError::Recoverable(
                    "bad date".to_string(),
                ))),
                _ => Err(AutobotError::Parse(ParseError::Fatal(format!("cannot decode {}", body)))),
            }
        }

        fn record_type(&self) -> &str {
            "line"
        }
    }

    fn pipeline(policy: DecodePolicy, workers: usize) -> IngestionPipeline {
        let config = PipelineConfig {
            record_tag: "R".to_string(),
            queue_capacity: 2,
            ..PipelineConfig::default()
        }
        .with_workers(workers)
        .with_decode_policy(policy);
        IngestionPipeline::new(Arc::new(LineParser), config)
    }

    fn source(records: &[&str]) -> ExportStream {
        let body: String = records.iter().map(|r| format!("<R>{}</R>\n", r)).collect();
        Box::new(Cursor::new(format!("<Export>\n{}</Export>\n", body)))
    }

    #[tokio::test]
    async fn test_counts_and_dedup() {
        let output = pipeline(DecodePolicy::Strict, 2)
            .run(
                source(&["AA1;V1;1", "BB2;V2;1", "AA1;V1;1", "CC3;V3;2"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(output.processed, 4);
        assert_eq!(output.kept, 3);
        assert_eq!(output.discarded, 0);
        assert_eq!(output.vehicles.len(), 2);
    }

    #[tokio::test]
    async fn test_recoverable_errors_are_discarded() {
        let output = pipeline(DecodePolicy::Strict, 3)
            .run(source(&["AA1;V1;1", "skip"]), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.processed, 2);
        assert_eq!(output.discarded, 1);
    }

    #[tokio::test]
    async fn test_strict_policy_aborts() {
        let records: Vec<String> = (0..200).map(|i| format!("R{};V{};1", i, i)).collect();
        let mut refs: Vec<&str> = records.iter().map(String::as_str).collect();
        refs.insert(50, "garbage");

        let err = pipeline(DecodePolicy::Strict, 4)
            .run(source(&refs), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AutobotError::Parse(ParseError::Fatal(_))));
    }

    #[tokio::test]
    async fn test_lenient_policy_skips() {
        let output = pipeline(DecodePolicy::Lenient, 2)
            .run(source(&["AA1;V1;1", "garbage"]), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.processed, 2);
        assert_eq!(output.kept, 1);
        assert_eq!(output.discarded, 1);
    }

    #[tokio::test]
    async fn test_truncated_export() {
        let truncated: ExportStream = Box::new(Cursor::new("<R>AA1;V1;1</R>\n<R>\nBB2"));
        let err = pipeline(DecodePolicy::Strict, 1)
            .run(truncated, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PARSE_ERROR");
    }

    #[tokio::test]
    async fn test_cancelled_run_fails() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = pipeline(DecodePolicy::Strict, 2)
            .run(source(&["AA1;V1;1"]), &cancel)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_export() {
        let output = pipeline(DecodePolicy::Strict, 2)
            .run(source(&[]), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.processed, 0);
        assert!(output.vehicles.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8_follows_decode_policy() {
        let export = || -> ExportStream {
            Box::new(Cursor::new(b"<R>AA1;V1;1</R>\n<R>BB2;V\xff;1</R>\n".to_vec()))
        };

        let output = pipeline(DecodePolicy::Lenient, 2)
            .run(export(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.processed, 2);
        assert_eq!(output.kept, 1);
        assert_eq!(output.discarded, 1);

        let err = pipeline(DecodePolicy::Strict, 2)
            .run(export(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AutobotError::Parse(ParseError::Fatal(_))));
    }
}
