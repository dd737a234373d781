//! Sweep orchestration
//!
//! The coordinator drives one batch end to end: it enumerates combinations,
//! checks cancellation before starting each one, executes the query through
//! the gateway, classifies the row count, hands proceeding combinations to
//! the writer, and records every outcome with the aggregator. Failures are
//! isolated at the combination boundary; a broken combination never aborts
//! the batch, only cancellation does.

use crate::adapters::gateway::DataGateway;
use crate::core::export::cancel::CancelToken;
use crate::core::export::enumerate::CombinationIter;
use crate::core::export::summary::{Aggregator, SweepSummary};
use crate::core::export::validate::{classify_row_count, Verdict};
use crate::domain::{Combination, ExecutionResult, FilterDimensionSet, QuerySpec, Result};
use crate::journal::{Journal, Level, SkipJournal};
use crate::writer::ArtifactWriter;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use uuid::Uuid;

const MODULE: &str = "sweep";

/// Drives one batch of combinations from enumeration to summary
pub struct SweepCoordinator {
    gateway: Arc<dyn DataGateway>,
    writer: Arc<dyn ArtifactWriter>,
    journal: Arc<Journal>,
    skips: SkipJournal,
    dry_run: bool,
    status_tx: watch::Sender<String>,
    status_rx: watch::Receiver<String>,
}

impl SweepCoordinator {
    /// Create a coordinator over the given gateway, writer, and journals
    pub fn new(
        gateway: Arc<dyn DataGateway>,
        writer: Arc<dyn ArtifactWriter>,
        journal: Arc<Journal>,
        skips: SkipJournal,
        dry_run: bool,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(String::from("idle"));
        Self {
            gateway,
            writer,
            journal,
            skips,
            dry_run,
            status_tx,
            status_rx,
        }
    }

    /// Incremental status line, refreshed after every combination
    pub fn status(&self) -> watch::Receiver<String> {
        self.status_rx.clone()
    }

    /// Run one batch to completion or cancellation
    ///
    /// Per-combination errors are recorded as Errored and do not propagate;
    /// the returned summary always covers every combination that started.
    pub async fn run(
        &self,
        filters: &FilterDimensionSet,
        query: &QuerySpec,
        cancel: &CancelToken,
    ) -> Result<SweepSummary> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let total = filters.total_combinations();

        tracing::info!(
            run_id = %run_id,
            total,
            view = %query.view,
            range = %query.range_label(),
            dry_run = self.dry_run,
            "Sweep started"
        );
        self.journal.record(
            Level::Info,
            MODULE,
            run_id,
            format!("run started: {total} combinations against {}", query.view),
        );

        let mut aggregator = Aggregator::with_sender(run_id, total, self.status_tx.clone());
        let mut batch_cancelled = false;

        for combination in CombinationIter::new(filters) {
            // Boundary check: a combination that has not started is never
            // counted, only in-flight interruptions are.
            if cancel.is_cancelled() {
                batch_cancelled = true;
                self.journal.record(
                    Level::Warn,
                    MODULE,
                    run_id,
                    format!(
                        "cancellation observed before combination {}; stopping",
                        combination.sequence
                    ),
                );
                break;
            }

            let result = self.process(&combination, query, cancel).await;
            let interrupted = result.outcome == crate::domain::Outcome::Cancelled;
            aggregator.record(&result);

            if interrupted {
                batch_cancelled = true;
                break;
            }
        }

        let summary = aggregator.finish(started.elapsed(), batch_cancelled);
        self.journal.record(
            Level::Info,
            MODULE,
            run_id,
            format!(
                "run finished: {} processed, {} generated, {} errored, dropped log entries {}",
                summary.counters.processed,
                summary.counters.generated,
                summary.counters.errored,
                self.journal.dropped()
            ),
        );
        summary.log_summary();

        Ok(summary)
    }

    /// Process one combination; never returns an error
    async fn process(
        &self,
        combination: &Combination,
        query: &QuerySpec,
        cancel: &CancelToken,
    ) -> ExecutionResult {
        let started = Instant::now();
        self.journal.record(
            Level::Info,
            MODULE,
            combination.sequence,
            format!("processing {combination}"),
        );

        let reply = match self.gateway.execute(combination, query).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    sequence = combination.sequence,
                    error = %e,
                    "Combination query failed"
                );
                self.journal.record(
                    Level::Error,
                    MODULE,
                    combination.sequence,
                    format!("query failed: {e}"),
                );
                return ExecutionResult::errored(started.elapsed());
            }
        };

        let verdict = classify_row_count(reply.row_count);
        if let Some(reason) = verdict.skip_reason() {
            self.skips.record(combination, query, reason, reply.row_count);
            self.journal.record(
                Level::Info,
                MODULE,
                combination.sequence,
                format!("skipped ({reason}): {} rows", reply.row_count),
            );
            return match verdict {
                Verdict::NoData => ExecutionResult::no_data(started.elapsed()),
                _ => ExecutionResult::row_limit_exceeded(reply.row_count, started.elapsed()),
            };
        }

        if self.dry_run {
            self.journal.record(
                Level::Info,
                MODULE,
                combination.sequence,
                format!("dry run: would write {} rows", reply.row_count),
            );
            return ExecutionResult::success(reply.row_count, started.elapsed(), None);
        }

        match self
            .writer
            .write(combination, query, &reply.schema, reply.rows, cancel)
            .await
        {
            Ok(report) => {
                self.journal.record(
                    Level::Info,
                    MODULE,
                    combination.sequence,
                    format!(
                        "completed: {} rows -> {}",
                        report.rows_written,
                        report.path.display()
                    ),
                );
                ExecutionResult::success(reply.row_count, started.elapsed(), Some(report.path))
            }
            Err(e) if e.is_interrupted() => {
                self.journal.record(
                    Level::Warn,
                    MODULE,
                    combination.sequence,
                    "write interrupted by cancellation; artifact abandoned".to_string(),
                );
                ExecutionResult::cancelled(reply.row_count, started.elapsed())
            }
            Err(e) => {
                tracing::warn!(
                    sequence = combination.sequence,
                    error = %e,
                    "Artifact write failed"
                );
                self.journal.record(
                    Level::Error,
                    MODULE,
                    combination.sequence,
                    format!("write failed: {e}"),
                );
                ExecutionResult::errored(started.elapsed())
            }
        }
    }
}
