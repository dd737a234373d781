//! Domain models and types for GridSweep.
//!
//! This module contains the core domain models, types, and business rules.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Filter dimensions and combinations** ([`FilterDimensionSet`], [`Combination`])
//! - **Batch query parameters** ([`QuerySpec`])
//! - **Outcomes and counters** ([`Outcome`], [`ExecutionResult`], [`ProcessingCounters`])
//! - **Error types** ([`SweepError`], [`DataAccessError`], [`WriteError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SweepError>`]:
//!
//! ```rust
//! use gridsweep::domain::{Result, SweepError};
//!
//! fn example() -> Result<()> {
//!     Err(SweepError::Validation("invalid input".to_string()))
//! }
//! ```

pub mod errors;
pub mod filters;
pub mod outcome;
pub mod query;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{DataAccessError, SweepError, WriteError};
pub use filters::{Combination, FilterDimension, FilterDimensionSet, WILDCARD};
pub use outcome::{ExecutionResult, Outcome, ProcessingCounters};
pub use query::QuerySpec;
pub use result::Result;
