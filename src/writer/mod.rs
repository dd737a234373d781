//! Streaming artifact writers
//!
//! One artifact per combination, produced in a single streaming pass over
//! the row source followed by a single formatting pass. The concrete writer
//! is [`xlsx::SheetWriter`]; the trait exists so the orchestrator can be
//! exercised without a spreadsheet engine.

pub mod name;
pub mod pool;
pub mod xlsx;

use crate::adapters::gateway::{ColumnMeta, RowSource};
use crate::core::export::cancel::CancelToken;
use crate::domain::{Combination, QuerySpec, WriteError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

pub use pool::WorkbookPool;
pub use xlsx::SheetWriter;

/// Result of a successful artifact write
#[derive(Debug, Clone)]
pub struct WriteReport {
    /// Data rows written (header excluded)
    pub rows_written: u64,

    /// Time spent streaming, formatting, and persisting
    pub elapsed: Duration,

    /// Where the artifact landed
    pub path: PathBuf,
}

/// Materializes one combination's rows into an artifact
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Stream all rows into a new artifact and persist it
    ///
    /// The cancel token is observed between internal chunks; an interrupted
    /// write abandons the artifact and returns [`WriteError::Interrupted`].
    async fn write(
        &self,
        combination: &Combination,
        query: &QuerySpec,
        schema: &[ColumnMeta],
        rows: RowSource,
        cancel: &CancelToken,
    ) -> Result<WriteReport, WriteError>;
}
