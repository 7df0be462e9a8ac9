//! PostgreSQL client implementation.
//!
//! Opens a fresh, private connection per call and closes it before returning,
//! so no connection state is ever shared between tool invocations. Statement
//! execution is bounded both server side (`statement_timeout`) and client
//! side (`tokio::time::timeout`).

use crate::config::ConnectionConfig;
use crate::db::{profile, ColumnInfo, DatabaseClient, QueryExecution, Row, Value};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column as SqlxColumn, Connection, Either, Executor, Row as SqlxRow, TypeInfo};
use std::time::Duration;
use tracing::debug;

/// Statement execution timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 10;

/// Server-side timeout matching `QUERY_TIMEOUT_SECS`.
const STATEMENT_TIMEOUT_SQL: &str = "SET statement_timeout = 10000;";

/// PostgreSQL database client.
#[derive(Debug, Clone)]
pub struct PostgresClient {
    config: ConnectionConfig,
}

impl PostgresClient {
    /// Creates a client for the given connection parameters.
    ///
    /// No connection is opened here; each call opens its own.
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    async fn open_connection(&self) -> Result<PgConnection> {
        let conn_str = self.config.to_connection_string()?;
        debug!("opening connection to {}", self.config.display_string());
        PgConnection::connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, &self.config))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn run_sql(&self, sql: &str) -> Result<QueryExecution> {
        let mut conn = self.open_connection().await?;

        let result = match tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            run_on_connection(&mut conn, sql),
        )
        .await
        {
            Ok(inner) => inner,
            Err(_) => Err(ChatError::query(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))),
        };

        // The connection is private to this call; close it on every path.
        let _ = conn.close().await;

        result
    }

    async fn database_profile(&self) -> String {
        profile::build(&self.config).await
    }
}

/// Executes the full SQL text and materializes the first statement's result.
///
/// The connection runs in autocommit mode, so each completed statement
/// commits and releases its implicit locks. Later statements of a
/// multi-statement text are driven to completion but their output is dropped.
async fn run_on_connection(conn: &mut PgConnection, sql: &str) -> Result<QueryExecution> {
    conn.execute(STATEMENT_TIMEOUT_SQL)
        .await
        .map_err(|e| ChatError::query(format_query_error(e)))?;

    let mut first = FirstStatement::new();

    let mut stream = conn.fetch_many(sql);
    while let Some(step) = stream
        .try_next()
        .await
        .map_err(|e| ChatError::query(format_query_error(e)))?
    {
        match step {
            Either::Right(row) => first.observe_row(row),
            Either::Left(done) => first.observe_complete(done.rows_affected()),
        }
    }
    drop(stream);

    if first.rows.is_empty() {
        if first.complete && first.affected > 0 {
            // No row set but a row count: the DDL/DML fallback path.
            return Ok(QueryExecution::Affected {
                rows: first.affected,
            });
        }
        return Ok(QueryExecution::Rows {
            columns: Vec::new(),
            rows: Vec::new(),
        });
    }

    let columns: Vec<ColumnInfo> = first.rows[0]
        .columns()
        .iter()
        .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
        .collect();

    let rows: Vec<Row> = first.rows.iter().map(convert_row).collect();

    Ok(QueryExecution::Rows { columns, rows })
}

/// Accumulates the first statement's output from a multi-statement stream.
///
/// The stream yields rows interleaved with per-statement completion markers.
/// Rows are captured until the first completion marker arrives; everything
/// after it (later statements of the text) is drained and dropped.
#[derive(Debug)]
struct FirstStatement<R> {
    rows: Vec<R>,
    affected: u64,
    complete: bool,
}

impl<R> FirstStatement<R> {
    fn new() -> Self {
        Self {
            rows: Vec::new(),
            affected: 0,
            complete: false,
        }
    }

    fn observe_row(&mut self, row: R) {
        if !self.complete {
            self.rows.push(row);
        }
    }

    fn observe_complete(&mut self, rows_affected: u64) {
        if !self.complete {
            self.affected = rows_affected;
            self.complete = true;
        }
    }
}

/// Converts a sqlx PgRow to our Row type.
pub(crate) fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Decodes a single column into a `Value`, falling back to the text form for
/// types without a dedicated variant.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    let typed = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool),

        "INT2" | "SMALLINT" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64)),

        "INT4" | "INT" | "INTEGER" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(v as i64)),

        "INT8" | "BIGINT" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int),

        "FLOAT4" | "REAL" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64)),

        "FLOAT8" | "DOUBLE PRECISION" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float),

        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bytes),

        _ => None,
    };

    if let Some(value) = typed {
        return value;
    }

    row.try_get::<Option<String>, _>(index)
        .ok()
        .flatten()
        .map(Value::String)
        .unwrap_or(Value::Null)
}

/// Maps sqlx connection errors to user-facing messages.
pub(crate) fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> ChatError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        ChatError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        ChatError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        ChatError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        ChatError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        ChatError::connection(error.to_string())
    }
}

/// Formats a query error with the PostgreSQL detail and hint if available.
pub(crate) fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests needing a live server are gated on DATABASE_URL.

    fn get_test_client() -> Option<PostgresClient> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let config = ConnectionConfig::from_connection_string(&url).ok()?;
        Some(PostgresClient::new(config))
    }

    #[tokio::test]
    async fn test_select_one() {
        let Some(client) = get_test_client() else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        };

        match client.run_sql("SELECT 1 AS num").await.unwrap() {
            QueryExecution::Rows { columns, rows } => {
                assert_eq!(columns.len(), 1);
                assert_eq!(columns[0].name, "num");
                assert_eq!(rows.len(), 1);
            }
            other => panic!("expected Rows, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_error_surfaces_message() {
        let Some(client) = get_test_client() else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        };

        let err = client
            .run_sql("SELECT * FROM nonexistent_table_xyz")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nonexistent_table_xyz"));
    }

    #[tokio::test]
    async fn test_multi_statement_returns_first_result() {
        let Some(client) = get_test_client() else {
            eprintln!("Skipping test: DATABASE_URL not set");
            return;
        };

        match client.run_sql("SELECT 1 AS a; SELECT 2 AS b").await.unwrap() {
            QueryExecution::Rows { columns, rows } => {
                assert_eq!(columns[0].name, "a");
                assert_eq!(rows.len(), 1);
            }
            other => panic!("expected Rows, got {:?}", other),
        }
    }

    #[test]
    fn test_first_statement_keeps_rows_before_first_completion() {
        let mut first = FirstStatement::new();
        first.observe_row(1);
        first.observe_row(2);
        first.observe_complete(0);
        first.observe_row(3);
        first.observe_complete(0);

        assert_eq!(first.rows, vec![1, 2]);
        assert!(first.complete);
    }

    #[test]
    fn test_first_statement_drops_later_statement_rows() {
        // "SELECT 1 AS a; SELECT 2 AS b": one row, a marker, one more row,
        // another marker. Only the first row set survives.
        let mut first = FirstStatement::new();
        first.observe_row("a-row");
        first.observe_complete(1);
        first.observe_row("b-row");
        first.observe_complete(1);

        assert_eq!(first.rows, vec!["a-row"]);
    }

    #[test]
    fn test_first_statement_captures_first_affected_count_only() {
        let mut first = FirstStatement::<()>::new();
        first.observe_complete(7);
        first.observe_complete(99);

        assert_eq!(first.affected, 7);
        assert!(first.rows.is_empty());
    }

    #[test]
    fn test_first_statement_empty_stream_is_incomplete() {
        let first = FirstStatement::<()>::new();

        assert!(!first.complete);
        assert_eq!(first.affected, 0);
        assert!(first.rows.is_empty());
    }

    #[test]
    fn test_map_connection_error_refused() {
        let config = ConnectionConfig {
            host: Some("localhost".to_string()),
            port: 5432,
            database: Some("sakila".to_string()),
            user: Some("sakila".to_string()),
            password: None,
        };
        let err = map_connection_error(
            sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
            &config,
        );
        assert!(err.to_string().contains("Cannot connect to localhost:5432"));
    }
}
