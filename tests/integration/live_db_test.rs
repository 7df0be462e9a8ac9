//! Live database tests.
//!
//! These require a running PostgreSQL database; set DATABASE_URL to run them.

use sakila_chat::config::ConnectionConfig;
use sakila_chat::db::{DatabaseClient, PostgresClient, QueryExecution};
use sakila_chat::query::execute_sql;

/// Helper to create a client from the environment, or skip.
fn get_test_client() -> Option<PostgresClient> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    Some(PostgresClient::new(config))
}

#[tokio::test]
async fn test_simple_select_returns_rows() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client
        .run_sql("SELECT 1 AS num, 'hello' AS greeting")
        .await
        .unwrap();

    match result {
        QueryExecution::Rows { columns, rows } => {
            assert_eq!(columns.len(), 2);
            assert_eq!(columns[0].name, "num");
            assert_eq!(columns[1].name, "greeting");
            assert_eq!(rows.len(), 1);
        }
        other => panic!("Expected rows, got {:?}", other),
    }
}

#[tokio::test]
async fn test_syntax_error_is_reported() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client.run_sql("SELEC 1").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_consecutive_calls_use_fresh_connections() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    // Each call opens and closes its own connection, so a failure in one
    // must not poison the next.
    let _ = client.run_sql("SELECT broken syntax").await;
    let result = client.run_sql("SELECT 1").await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_multi_statement_returns_first_result_set() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = client.run_sql("SELECT 1 AS a; SELECT 2 AS b").await.unwrap();

    match result {
        QueryExecution::Rows { columns, rows } => {
            assert_eq!(columns[0].name, "a");
            assert_eq!(rows.len(), 1);
        }
        other => panic!("Expected rows, got {:?}", other),
    }
}

#[tokio::test]
async fn test_full_pipeline_against_live_database() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let rendered = execute_sql(&client, "SELECT 1 AS num", 30).await;

    assert!(rendered.starts_with("Columns: num"));
    assert!(rendered.contains("(1)"));
}

#[tokio::test]
async fn test_profile_snapshot_has_all_sections() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let profile = client.database_profile().await;

    assert!(profile.contains("=== TABLE SCHEMA ==="));
    assert!(profile.contains("=== SAMPLE ROWS (LIMIT 1 PER TABLE) ==="));
    assert!(profile.contains("=== PRIMARY KEYS ==="));
    assert!(profile.contains("=== FOREIGN KEYS ==="));
    assert!(profile.contains("=== FUNCTIONS (User-defined) ==="));
    assert!(profile.contains("=== CUSTOM DATA TYPES ==="));
    assert!(profile.contains("=== VIEWS ==="));
}
