//! PostgreSQL gateway implementation
//!
//! Executes combination queries against a view or table over a pooled
//! connection. The row source streams directly off the wire; rows are never
//! collected into an intermediate buffer.

use crate::adapters::gateway::{CellData, ColumnMeta, DataGateway, QueryReply, RowSource};
use crate::config::schema::DatabaseConfig;
use crate::domain::{Combination, DataAccessError, QuerySpec, WILDCARD};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use futures::StreamExt;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{NoTls, Row};

/// PostgreSQL data access gateway
///
/// Holds a connection pool sized from configuration. Each `execute` call
/// runs a count query first, then prepares and streams the data query.
pub struct PostgresGateway {
    pool: Pool,
    date_column: String,
    command_timeout: Duration,
}

impl PostgresGateway {
    /// Create a new gateway from database configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is malformed or the pool
    /// cannot be built.
    pub fn new(config: &DatabaseConfig) -> Result<Self, DataAccessError> {
        let pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                DataAccessError::ConnectionFailed(format!("Invalid connection string: {e}"))
            })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(Some(Duration::from_secs(config.connection_timeout_seconds)))
            .create_timeout(Some(Duration::from_secs(config.connection_timeout_seconds)))
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| {
                DataAccessError::ConnectionFailed(format!("Failed to create connection pool: {e}"))
            })?;

        Ok(Self {
            pool,
            date_column: config.date_column.clone(),
            command_timeout: Duration::from_secs(config.command_timeout_seconds),
        })
    }

    /// Test the connection by running a trivial query
    pub async fn test_connection(&self) -> Result<(), DataAccessError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DataAccessError::PoolExhausted(e.to_string()))?;

        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| DataAccessError::ConnectionFailed(e.to_string()))?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Build the WHERE clause and owned parameter list for a combination
    ///
    /// `$1`/`$2` are always the date range; each non-wildcard dimension adds
    /// one equality predicate on the column named after the dimension.
    fn build_query(
        &self,
        combination: &Combination,
        query: &QuerySpec,
    ) -> Result<(String, Vec<OwnedParam>), DataAccessError> {
        let view = sanitize_identifier(&query.view)?;
        let date_column = sanitize_identifier(&self.date_column)?;

        let mut clause = format!(
            "FROM {view} WHERE {date_column} >= $1 AND {date_column} <= $2"
        );
        let mut params: Vec<OwnedParam> = vec![
            OwnedParam::Date(query.date_from),
            OwnedParam::Date(query.date_to),
        ];

        for (name, value) in combination.pairs() {
            if value == WILDCARD {
                continue;
            }
            let column = sanitize_identifier(name)?;
            params.push(OwnedParam::Text(value.to_string()));
            clause.push_str(&format!(" AND {column} = ${}", params.len()));
        }

        Ok((clause, params))
    }

    async fn run_count(
        &self,
        client: &deadpool_postgres::Object,
        clause: &str,
        params: &[OwnedParam],
    ) -> Result<u64, DataAccessError> {
        let sql = format!("SELECT COUNT(*) {clause}");
        let refs = param_refs(params);

        let row = tokio::time::timeout(self.command_timeout, client.query_one(&sql, &refs))
            .await
            .map_err(|_| DataAccessError::Timeout(self.command_timeout.as_secs()))?
            .map_err(|e| DataAccessError::QueryFailed(e.to_string()))?;

        let count: i64 = row.get(0);
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl DataGateway for PostgresGateway {
    async fn execute(
        &self,
        combination: &Combination,
        query: &QuerySpec,
    ) -> Result<QueryReply, DataAccessError> {
        let (clause, params) = self.build_query(combination, query)?;

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| DataAccessError::PoolExhausted(e.to_string()))?;

        let row_count = self.run_count(&client, &clause, &params).await?;

        tracing::debug!(
            sequence = combination.sequence,
            combination = %combination,
            row_count,
            "Count query completed"
        );

        // Prepare the data query up front so the schema is known before any
        // data row is read.
        let data_sql = format!("SELECT * {clause}");
        let statement = tokio::time::timeout(self.command_timeout, client.prepare(&data_sql))
            .await
            .map_err(|_| DataAccessError::Timeout(self.command_timeout.as_secs()))?
            .map_err(|e| DataAccessError::QueryFailed(e.to_string()))?;

        let schema: Vec<ColumnMeta> = statement
            .columns()
            .iter()
            .map(|c| ColumnMeta {
                name: c.name().to_string(),
            })
            .collect();
        let column_types: Vec<Type> =
            statement.columns().iter().map(|c| c.type_().clone()).collect();

        let refs = param_refs(&params);
        let row_stream = tokio::time::timeout(
            self.command_timeout,
            client.query_raw(&statement, refs.iter().map(|p| *p as &dyn ToSql)),
        )
        .await
        .map_err(|_| DataAccessError::Timeout(self.command_timeout.as_secs()))?
        .map_err(|e| DataAccessError::QueryFailed(e.to_string()))?;

        // The pooled connection object moves into the stream state so it
        // stays checked out until the caller drops the row source. The
        // degraded flags persist across rows so each undecodable column is
        // reported once per query, not once per cell.
        let degraded = vec![false; column_types.len()];
        let rows: RowSource = futures::stream::unfold(
            (Box::pin(row_stream), client, column_types, degraded),
            |(mut stream, client, types, mut degraded)| async move {
                match stream.next().await {
                    Some(Ok(row)) => {
                        let decoded = decode_row(&row, &types, &mut degraded);
                        Some((decoded, (stream, client, types, degraded)))
                    }
                    Some(Err(e)) => Some((
                        Err(DataAccessError::QueryFailed(e.to_string())),
                        (stream, client, types, degraded),
                    )),
                    None => None,
                }
            },
        )
        .boxed();

        Ok(QueryReply {
            row_count,
            schema,
            rows,
        })
    }
}

/// Owned query parameter, kept alive for the duration of the statement
enum OwnedParam {
    Text(String),
    Date(NaiveDate),
}

fn param_refs(params: &[OwnedParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| match p {
            OwnedParam::Text(v) => v as &(dyn ToSql + Sync),
            OwnedParam::Date(v) => v as &(dyn ToSql + Sync),
        })
        .collect()
}

/// Validate a (possibly schema-qualified) SQL identifier
///
/// Only plain identifiers are accepted; anything else is rejected rather
/// than quoted, since view and column names come from configuration and
/// dimension declarations, not from row data.
fn sanitize_identifier(name: &str) -> Result<&str, DataAccessError> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .next()
                .map(|c| c.is_ascii_alphabetic() || c == '_')
                .unwrap_or(false)
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let mut parts = name.split('.');
    let ok = match (parts.next(), parts.next(), parts.next()) {
        (Some(only), None, _) => valid_part(only),
        (Some(schema), Some(object), None) => valid_part(schema) && valid_part(object),
        _ => false,
    };

    if ok {
        Ok(name)
    } else {
        Err(DataAccessError::InvalidObjectName(name.to_string()))
    }
}

/// Decode one wire row into typed cells
///
/// Unsupported column types degrade to text where the driver allows it and
/// to NULL otherwise; every column that degrades to NULL is reported once
/// via `degraded`. A decode failure on a supported type is an error.
fn decode_row(
    row: &Row,
    types: &[Type],
    degraded: &mut [bool],
) -> Result<Vec<CellData>, DataAccessError> {
    let mut cells = Vec::with_capacity(types.len());

    for (i, ty) in types.iter().enumerate() {
        let cell = if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(i)
                .map(|v| v.map(|v| CellData::Int(v as i64)))
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(i)
                .map(|v| v.map(|v| CellData::Int(v as i64)))
        } else if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(i)
                .map(|v| v.map(CellData::Int))
        } else if *ty == Type::FLOAT4 {
            row.try_get::<_, Option<f32>>(i)
                .map(|v| v.map(|v| CellData::Float(v as f64)))
        } else if *ty == Type::FLOAT8 {
            row.try_get::<_, Option<f64>>(i)
                .map(|v| v.map(CellData::Float))
        } else if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(i)
                .map(|v| v.map(CellData::Bool))
        } else if *ty == Type::DATE {
            row.try_get::<_, Option<NaiveDate>>(i)
                .map(|v| v.map(CellData::Date))
        } else if *ty == Type::TIMESTAMP {
            row.try_get::<_, Option<NaiveDateTime>>(i)
                .map(|v| v.map(CellData::Timestamp))
        } else if *ty == Type::TIMESTAMPTZ {
            row.try_get::<_, Option<DateTime<Utc>>>(i)
                .map(|v| v.map(|v| CellData::Timestamp(v.naive_utc())))
        } else if *ty == Type::NUMERIC {
            row.try_get::<_, Option<Decimal>>(i)
                .map(|v| v.map(numeric_cell))
        } else if *ty == Type::UUID {
            row.try_get::<_, Option<uuid::Uuid>>(i)
                .map(|v| v.map(|v| CellData::Text(v.to_string())))
        } else if *ty == Type::TEXT
            || *ty == Type::VARCHAR
            || *ty == Type::BPCHAR
            || *ty == Type::NAME
        {
            row.try_get::<_, Option<String>>(i)
                .map(|v| v.map(CellData::Text))
        } else {
            // Unknown type: degrade to text when the driver can, NULL when
            // it cannot.
            match row.try_get::<_, Option<String>>(i) {
                Ok(v) => Ok(v.map(CellData::Text)),
                Err(_) => {
                    if mark_degraded(degraded, i) {
                        tracing::warn!(
                            column_index = i,
                            column_type = %ty,
                            "Unsupported column type; cells written as empty"
                        );
                    }
                    Ok(Some(CellData::Null))
                }
            }
        };

        match cell {
            Ok(Some(value)) => cells.push(value),
            Ok(None) => cells.push(CellData::Null),
            Err(e) => {
                return Err(DataAccessError::RowDecode(format!(
                    "column {i} ({ty}): {e}"
                )))
            }
        }
    }

    Ok(cells)
}

/// Convert a NUMERIC value to a cell
///
/// Values representable as f64 become numeric cells; anything outside that
/// range is carried as text so no digits are lost.
fn numeric_cell(value: Decimal) -> CellData {
    match value.to_f64() {
        Some(f) if f.is_finite() => CellData::Float(f),
        _ => CellData::Text(value.to_string()),
    }
}

/// Flip the degraded flag for a column; true only on the first call
fn mark_degraded(degraded: &mut [bool], index: usize) -> bool {
    match degraded.get_mut(index) {
        Some(flag) => !std::mem::replace(flag, true),
        None => false,
    }
}
