//! Mock database clients for testing.
//!
//! The mock counts store calls so tests can assert that rejected requests
//! never reach the backing store.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ColumnInfo, DatabaseClient, QueryExecution, Row};
use crate::error::{ChatError, Result};

/// A database client that returns a scripted result for every query.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
    affected: Option<u64>,
    profile: String,
    calls: AtomicUsize,
}

impl MockDatabaseClient {
    /// Creates a mock that returns an empty row set.
    pub fn new() -> Self {
        Self {
            profile: "=== TABLE SCHEMA ===\n\nTable: mock\n  - id: integer (NOT NULL)\n"
                .to_string(),
            ..Self::default()
        }
    }

    /// Scripts a fixed row set response.
    pub fn with_rows(mut self, columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        self.columns = columns;
        self.rows = rows;
        self.affected = None;
        self
    }

    /// Scripts a rows-affected response (the defensive no-row-set path).
    pub fn with_affected(mut self, rows: u64) -> Self {
        self.affected = Some(rows);
        self
    }

    /// Scripts the profile snapshot text.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Number of `run_sql` calls that reached this client.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn run_sql(&self, _sql: &str) -> Result<QueryExecution> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(rows) = self.affected {
            return Ok(QueryExecution::Affected { rows });
        }

        Ok(QueryExecution::Rows {
            columns: self.columns.clone(),
            rows: self.rows.clone(),
        })
    }

    async fn database_profile(&self) -> String {
        self.profile.clone()
    }
}

/// A database client whose every query fails with a fixed message.
#[derive(Debug)]
pub struct FailingDatabaseClient {
    message: String,
    calls: AtomicUsize,
}

impl FailingDatabaseClient {
    /// Creates a client that fails with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `run_sql` calls that reached this client.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn run_sql(&self, _sql: &str) -> Result<QueryExecution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ChatError::query(self.message.clone()))
    }

    async fn database_profile(&self) -> String {
        format!("Error generating database profile: {}", self.message)
    }
}
