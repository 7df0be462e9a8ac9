//! Database abstraction layer.
//!
//! A trait-based interface over the backing store so the query pipeline and
//! the agent loop can be tested without a live PostgreSQL server.

mod mock;
mod postgres;
pub mod profile;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use types::{ColumnInfo, QueryExecution, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Interface the query pipeline needs from the backing store.
///
/// Implementations open a private, scoped connection per call and release it
/// on every exit path; no connection state is shared across calls.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Runs a SQL text and materializes the first statement's result.
    ///
    /// Later statements in a multi-statement text execute without captured
    /// output. Rows are returned in full; truncation is the caller's job.
    async fn run_sql(&self, sql: &str) -> Result<QueryExecution>;

    /// Builds the best-effort schema/profile snapshot used to prime prompts.
    ///
    /// Never fails: a total connection failure degrades to an embedded error
    /// string, and individual section failures degrade to placeholders.
    async fn database_profile(&self) -> String;
}

#[async_trait]
impl<T: DatabaseClient + ?Sized> DatabaseClient for std::sync::Arc<T> {
    async fn run_sql(&self, sql: &str) -> Result<QueryExecution> {
        (**self).run_sql(sql).await
    }

    async fn database_profile(&self) -> String {
        (**self).database_profile().await
    }
}
