//! Data access gateway
//!
//! The gateway executes one combination's parameterized query and returns
//! the row count, the result schema, and a forward-only single-pass row
//! source. It is the seam between the sweep engine and the concrete
//! transport; [`postgres::PostgresGateway`] is the production
//! implementation.

pub mod postgres;

use crate::domain::{Combination, DataAccessError, QuerySpec};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures::stream::BoxStream;

pub use postgres::PostgresGateway;

/// One typed cell produced by the row source
#[derive(Debug, Clone, PartialEq)]
pub enum CellData {
    /// SQL NULL
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

/// Schema of one result column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Column name, written verbatim into the artifact header row
    pub name: String,
}

/// Forward-only, single-pass row source
pub type RowSource = BoxStream<'static, Result<Vec<CellData>, DataAccessError>>;

/// Gateway reply for one combination
pub struct QueryReply {
    /// Total rows the data query will yield
    pub row_count: u64,

    /// Result schema in column order
    pub schema: Vec<ColumnMeta>,

    /// The data rows; consumed at most once
    pub rows: RowSource,
}

/// Executes one combination's query against the data source
///
/// Implementations are responsible for parameter binding; wildcard dimension
/// values bind no predicate. The call is bounded by the configured command
/// timeout so a single combination cannot stall the batch indefinitely.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Execute the query for one combination
    async fn execute(
        &self,
        combination: &Combination,
        query: &QuerySpec,
    ) -> Result<QueryReply, DataAccessError>;
}
