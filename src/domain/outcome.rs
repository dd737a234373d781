//! Execution outcomes and batch counters
//!
//! Every combination ends in exactly one outcome, and every outcome
//! increments exactly one counter bucket. The counters have a single writer
//! (the sweep worker) and are read only through the returned summary.

use std::path::PathBuf;
use std::time::Duration;

/// Outcome tag for a single processed combination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Artifact written
    Success,
    /// Query returned zero rows; skipped
    NoData,
    /// Query exceeded the row ceiling; skipped
    RowLimitExceeded,
    /// Cancellation observed while the combination was in flight
    Cancelled,
    /// Data access or write failure; batch continued
    Errored,
}

impl Outcome {
    /// Stable tag used in journals and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "Success",
            Outcome::NoData => "NoData",
            Outcome::RowLimitExceeded => "RowLimitExceeded",
            Outcome::Cancelled => "Cancelled",
            Outcome::Errored => "Errored",
        }
    }
}

/// Result of processing one combination, consumed by the aggregator
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Outcome tag
    pub outcome: Outcome,

    /// Row count reported by the gateway (0 for errored combinations where
    /// the count was never obtained)
    pub rows: u64,

    /// Time spent on this combination
    pub elapsed: Duration,

    /// Artifact path, present only on success
    pub artifact: Option<PathBuf>,
}

impl ExecutionResult {
    /// Successful export with a written artifact
    pub fn success(rows: u64, elapsed: Duration, artifact: Option<PathBuf>) -> Self {
        Self {
            outcome: Outcome::Success,
            rows,
            elapsed,
            artifact,
        }
    }

    /// Zero-row skip
    pub fn no_data(elapsed: Duration) -> Self {
        Self {
            outcome: Outcome::NoData,
            rows: 0,
            elapsed,
            artifact: None,
        }
    }

    /// Over-ceiling skip
    pub fn row_limit_exceeded(rows: u64, elapsed: Duration) -> Self {
        Self {
            outcome: Outcome::RowLimitExceeded,
            rows,
            elapsed,
            artifact: None,
        }
    }

    /// Cancellation observed while in flight
    pub fn cancelled(rows: u64, elapsed: Duration) -> Self {
        Self {
            outcome: Outcome::Cancelled,
            rows,
            elapsed,
            artifact: None,
        }
    }

    /// Per-combination failure
    pub fn errored(elapsed: Duration) -> Self {
        Self {
            outcome: Outcome::Errored,
            rows: 0,
            elapsed,
            artifact: None,
        }
    }
}

/// Mutable aggregate counters for one batch
///
/// Invariant: `processed` always equals the sum of the five outcome buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingCounters {
    /// Combinations that reached a recorded outcome
    pub processed: u64,

    /// Artifacts written
    pub generated: u64,

    /// Zero-row skips
    pub skipped_no_data: u64,

    /// Over-ceiling skips
    pub skipped_row_limit: u64,

    /// Combinations interrupted by cancellation while in flight
    pub cancelled: u64,

    /// Per-combination failures
    pub errored: u64,
}

impl ProcessingCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record exactly one outcome
    pub fn record(&mut self, outcome: Outcome) {
        self.processed += 1;
        match outcome {
            Outcome::Success => self.generated += 1,
            Outcome::NoData => self.skipped_no_data += 1,
            Outcome::RowLimitExceeded => self.skipped_row_limit += 1,
            Outcome::Cancelled => self.cancelled += 1,
            Outcome::Errored => self.errored += 1,
        }
        debug_assert!(self.is_consistent());
    }

    /// Whether the bucket-sum invariant holds
    pub fn is_consistent(&self) -> bool {
        self.processed
            == self.generated
                + self.skipped_no_data
                + self.skipped_row_limit
                + self.cancelled
                + self.errored
    }

    /// Success rate as a percentage; 0.0 when nothing was processed
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        (self.generated as f64 / self.processed as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_increments_exactly_one_bucket() {
        let mut counters = ProcessingCounters::new();

        counters.record(Outcome::Success);
        counters.record(Outcome::NoData);
        counters.record(Outcome::RowLimitExceeded);
        counters.record(Outcome::Cancelled);
        counters.record(Outcome::Errored);

        assert_eq!(counters.processed, 5);
        assert_eq!(counters.generated, 1);
        assert_eq!(counters.skipped_no_data, 1);
        assert_eq!(counters.skipped_row_limit, 1);
        assert_eq!(counters.cancelled, 1);
        assert_eq!(counters.errored, 1);
        assert!(counters.is_consistent());
    }

    #[test]
    fn test_success_rate_guards_division_by_zero() {
        let counters = ProcessingCounters::new();
        assert_eq!(counters.success_rate(), 0.0);
    }

    #[test]
    fn test_success_rate_half() {
        let mut counters = ProcessingCounters::new();
        counters.record(Outcome::Success);
        counters.record(Outcome::NoData);
        assert_eq!(counters.success_rate(), 50.0);
    }

    #[test]
    fn test_outcome_tags_are_stable() {
        assert_eq!(Outcome::Success.as_str(), "Success");
        assert_eq!(Outcome::RowLimitExceeded.as_str(), "RowLimitExceeded");
    }

    #[test]
    fn test_execution_result_constructors() {
        let elapsed = Duration::from_millis(10);

        let r = ExecutionResult::success(5, elapsed, Some(PathBuf::from("/tmp/a.xlsx")));
        assert_eq!(r.outcome, Outcome::Success);
        assert!(r.artifact.is_some());

        let r = ExecutionResult::no_data(elapsed);
        assert_eq!(r.outcome, Outcome::NoData);
        assert_eq!(r.rows, 0);

        let r = ExecutionResult::row_limit_exceeded(2_000_000, elapsed);
        assert_eq!(r.outcome, Outcome::RowLimitExceeded);
        assert!(r.artifact.is_none());
    }
}
