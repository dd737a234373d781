//! Batch export engine
//!
//! Everything between a validated filter set and the final summary: lazy
//! combination enumeration, cooperative cancellation, row-count
//! classification, orchestration, and single-writer aggregation.

pub mod cancel;
pub mod coordinator;
pub mod enumerate;
pub mod summary;
pub mod validate;

pub use cancel::{cancel_pair, CancelToken, CancelTrigger};
pub use coordinator::SweepCoordinator;
pub use enumerate::CombinationIter;
pub use summary::{Aggregator, SweepSummary};
pub use validate::{classify_row_count, Verdict, ROW_LIMIT};
