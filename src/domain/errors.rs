//! Domain error types
//!
//! This module defines the error hierarchy for GridSweep. All errors are
//! domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main GridSweep error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Batch-level input validation errors, rejected before the sweep starts
    #[error("Validation error: {0}")]
    Validation(String),

    /// Per-combination query failures
    #[error("Data access error: {0}")]
    DataAccess(#[from] DataAccessError),

    /// Per-combination artifact write failures
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Data access errors
///
/// Errors that occur when executing a combination's query against the data
/// source. These errors don't expose the underlying database driver types.
#[derive(Debug, Error)]
pub enum DataAccessError {
    /// Failed to connect to the database
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Could not obtain a connection from the pool
    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Query exceeded the configured command timeout
    #[error("Query timed out after {0} seconds")]
    Timeout(u64),

    /// Query object name is not a usable identifier
    #[error("Invalid query object name: {0}")]
    InvalidObjectName(String),

    /// A result row could not be decoded
    #[error("Failed to decode row: {0}")]
    RowDecode(String),
}

/// Artifact write errors
///
/// Errors that occur while streaming a combination's rows into a workbook
/// or persisting the artifact to disk.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Filesystem I/O failure
    #[error("I/O failure writing artifact: {0}")]
    Io(String),

    /// Spreadsheet engine failure
    #[error("Spreadsheet engine failure: {0}")]
    Engine(String),

    /// Formatting pass failure
    #[error("Formatting failure: {0}")]
    Formatting(String),

    /// Output directory could not be created or is not writable
    #[error("Output directory unavailable: {0}")]
    OutputDirectory(String),

    /// The row source failed mid-stream
    #[error("Row source failed mid-stream: {0}")]
    RowSource(String),

    /// Cancellation observed between write chunks; the artifact was abandoned
    #[error("Write interrupted by cancellation")]
    Interrupted,
}

impl WriteError {
    /// Whether this write failure is the cooperative cancellation exit
    /// rather than a genuine error.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, WriteError::Interrupted)
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for SweepError {
    fn from(err: std::io::Error) -> Self {
        SweepError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SweepError {
    fn from(err: serde_json::Error) -> Self {
        SweepError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SweepError {
    fn from(err: toml::de::Error) -> Self {
        SweepError::Configuration(format!("TOML parse error: {err}"))
    }
}
