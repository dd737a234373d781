//! Result classification and batch summary
//!
//! The aggregator is the single logical writer of the batch counters: it
//! receives each [`ExecutionResult`] from the orchestrator (always from the
//! same worker), increments exactly one bucket, and publishes a best-effort
//! status string for the CLI. At batch end it produces the summary the
//! caller renders.

use crate::domain::{ExecutionResult, ProcessingCounters};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// Single-writer aggregator for one batch
pub struct Aggregator {
    run_id: Uuid,
    counters: ProcessingCounters,
    total: u64,
    artifacts: Vec<PathBuf>,
    status_tx: watch::Sender<String>,
}

impl Aggregator {
    /// Create an aggregator for a batch of `total` combinations
    pub fn new(run_id: Uuid, total: u64) -> (Self, watch::Receiver<String>) {
        let (status_tx, status_rx) = watch::channel(String::from("starting"));
        (
            Self {
                run_id,
                counters: ProcessingCounters::new(),
                total,
                artifacts: Vec::new(),
                status_tx,
            },
            status_rx,
        )
    }

    /// Create an aggregator publishing status through an existing channel
    pub fn with_sender(run_id: Uuid, total: u64, status_tx: watch::Sender<String>) -> Self {
        let _ = status_tx.send(String::from("starting"));
        Self {
            run_id,
            counters: ProcessingCounters::new(),
            total,
            artifacts: Vec::new(),
            status_tx,
        }
    }

    /// Record one execution result; increments exactly one counter bucket
    /// and refreshes the status line
    pub fn record(&mut self, result: &ExecutionResult) {
        self.counters.record(result.outcome);
        if let Some(path) = &result.artifact {
            self.artifacts.push(path.clone());
        }

        // Best effort: a closed receiver must never affect the sweep.
        let _ = self.status_tx.send(format!(
            "processing combination {} of {}",
            self.counters.processed, self.total
        ));
    }

    /// Counters recorded so far
    pub fn counters(&self) -> &ProcessingCounters {
        &self.counters
    }

    /// Finish the batch and build the summary
    pub fn finish(self, elapsed: Duration, cancelled: bool) -> SweepSummary {
        let status = if cancelled { "cancelled" } else { "completed" };
        let _ = self.status_tx.send(status.to_string());

        SweepSummary {
            run_id: self.run_id,
            total_combinations: self.total,
            counters: self.counters,
            artifacts: self.artifacts,
            elapsed,
            cancelled,
        }
    }
}

/// Final structured summary of a sweep, consumed by the CLI
#[derive(Debug, Clone)]
pub struct SweepSummary {
    /// Batch correlation id
    pub run_id: Uuid,

    /// Combinations the enumerator would have yielded
    pub total_combinations: u64,

    /// Outcome counters
    pub counters: ProcessingCounters,

    /// Artifact paths, one per success
    pub artifacts: Vec<PathBuf>,

    /// Wall-clock duration of the batch
    pub elapsed: Duration,

    /// Whether the batch was interrupted by cancellation
    pub cancelled: bool,
}

impl SweepSummary {
    /// Success rate as a percentage; 0.0 when nothing was processed
    pub fn success_rate(&self) -> f64 {
        self.counters.success_rate()
    }

    /// Whether every processed combination succeeded or was skipped cleanly
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.counters.errored == 0
    }

    /// Log the summary through tracing
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            total = self.total_combinations,
            processed = self.counters.processed,
            generated = self.counters.generated,
            skipped_no_data = self.counters.skipped_no_data,
            skipped_row_limit = self.counters.skipped_row_limit,
            cancelled_count = self.counters.cancelled,
            errored = self.counters.errored,
            duration_secs = self.elapsed.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            cancelled = self.cancelled,
            "Sweep completed"
        );
    }

    /// Human-readable block for the CLI
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let state = if self.cancelled {
            "CANCELLED"
        } else {
            "COMPLETED"
        };
        out.push_str(&format!("Sweep {state} (run {})\n", self.run_id));
        out.push_str(&format!(
            "  combinations processed: {} of {}\n",
            self.counters.processed, self.total_combinations
        ));
        out.push_str(&format!(
            "  files generated:        {}\n",
            self.counters.generated
        ));
        out.push_str(&format!(
            "  skipped (no data):      {}\n",
            self.counters.skipped_no_data
        ));
        out.push_str(&format!(
            "  skipped (row limit):    {}\n",
            self.counters.skipped_row_limit
        ));
        out.push_str(&format!(
            "  cancelled in flight:    {}\n",
            self.counters.cancelled
        ));
        out.push_str(&format!(
            "  errored:                {}\n",
            self.counters.errored
        ));
        out.push_str(&format!(
            "  success rate:           {:.0}%\n",
            self.success_rate()
        ));
        out.push_str(&format!(
            "  elapsed:                {:.1}s\n",
            self.elapsed.as_secs_f64()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Outcome;
    use std::path::PathBuf;

    fn result(outcome: Outcome) -> ExecutionResult {
        ExecutionResult {
            outcome,
            rows: 1,
            elapsed: Duration::from_millis(5),
            artifact: match outcome {
                Outcome::Success => Some(PathBuf::from("/tmp/a.xlsx")),
                _ => None,
            },
        }
    }

    #[test]
    fn test_record_updates_status_line() {
        let (mut agg, status_rx) = Aggregator::new(Uuid::new_v4(), 4);
        agg.record(&result(Outcome::Success));
        assert_eq!(*status_rx.borrow(), "processing combination 1 of 4");
        agg.record(&result(Outcome::NoData));
        assert_eq!(*status_rx.borrow(), "processing combination 2 of 4");
    }

    #[test]
    fn test_finish_builds_summary_with_artifacts() {
        let run_id = Uuid::new_v4();
        let (mut agg, _rx) = Aggregator::new(run_id, 2);
        agg.record(&result(Outcome::Success));
        agg.record(&result(Outcome::NoData));

        let summary = agg.finish(Duration::from_secs(3), false);
        assert_eq!(summary.run_id, run_id);
        assert_eq!(summary.counters.processed, 2);
        assert_eq!(summary.artifacts.len(), 1);
        assert_eq!(summary.success_rate(), 50.0);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_cancelled_summary_status() {
        let (agg, status_rx) = Aggregator::new(Uuid::new_v4(), 10);
        let summary = agg.finish(Duration::from_secs(1), true);
        assert!(summary.cancelled);
        assert!(!summary.is_clean());
        assert_eq!(*status_rx.borrow(), "cancelled");
    }

    #[test]
    fn test_render_text_reports_counts() {
        let (mut agg, _rx) = Aggregator::new(Uuid::new_v4(), 2);
        agg.record(&result(Outcome::Success));
        agg.record(&result(Outcome::NoData));
        let text = agg.finish(Duration::from_secs(1), false).render_text();

        assert!(text.contains("COMPLETED"));
        assert!(text.contains("files generated:        1"));
        assert!(text.contains("success rate:           50%"));
    }

    #[test]
    fn test_status_receiver_drop_does_not_panic() {
        let (mut agg, status_rx) = Aggregator::new(Uuid::new_v4(), 1);
        drop(status_rx);
        agg.record(&result(Outcome::Success));
        assert_eq!(agg.counters().processed, 1);
    }
}
