//! End-to-end tests for the guarded SQL tool pipeline.
//!
//! Exercises classification, guarding, execution and rendering as one unit,
//! the way the agent loop calls it.

use sakila_chat::db::{ColumnInfo, FailingDatabaseClient, MockDatabaseClient, Value};
use sakila_chat::query::{execute_sql, DEFAULT_LIMIT, MAX_LIMIT};

fn actor_db(rows: usize) -> MockDatabaseClient {
    let columns = vec![
        ColumnInfo::new("actor_id", "integer"),
        ColumnInfo::new("first_name", "varchar"),
    ];
    let rows = (0..rows)
        .map(|i| vec![Value::Int(i as i64 + 1), Value::from(format!("ACTOR{}", i))])
        .collect();
    MockDatabaseClient::new().with_rows(columns, rows)
}

#[tokio::test]
async fn test_mutation_never_reaches_the_database() {
    let db = actor_db(3);

    let rendered = execute_sql(&db, "UPDATE actor SET first_name = 'X'", 30).await;

    assert_eq!(rendered, "User is not allowed to modify the database");
    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_data_modifying_cte_never_reaches_the_database() {
    let db = actor_db(3);

    let rendered = execute_sql(
        &db,
        "WITH gone AS (DELETE FROM rental RETURNING *) SELECT count(*) FROM gone",
        30,
    )
    .await;

    assert_eq!(rendered, "User is not allowed to modify the database");
    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_select_into_never_reaches_the_database() {
    let db = actor_db(3);

    let rendered = execute_sql(&db, "SELECT * INTO actor_backup FROM actor", 30).await;

    assert_eq!(rendered, "User is not allowed to modify the database");
    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_too_many_statements_rejected_before_execution() {
    let db = actor_db(3);
    let sql = vec!["SELECT 1"; 11].join("; ");

    let rendered = execute_sql(&db, &sql, 30).await;

    assert_eq!(
        rendered,
        "Too many queries in the request. Please limit to 10 queries at once."
    );
    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_select_renders_columns_and_rows() {
    let db = actor_db(2);

    let rendered = execute_sql(&db, "SELECT actor_id, first_name FROM actor", 30).await;

    assert_eq!(
        rendered,
        "Columns: actor_id, first_name\n\nResults:\n(1, ACTOR0)\n(2, ACTOR1)\n"
    );
    assert_eq!(db.call_count(), 1);
}

#[tokio::test]
async fn test_results_truncated_to_effective_limit() {
    let db = actor_db(10);

    let rendered = execute_sql(&db, "SELECT actor_id, first_name FROM actor", 4).await;

    assert_eq!(rendered.matches('(').count(), 4);
    assert!(rendered.ends_with("\n...and 6 more rows"));
}

#[tokio::test]
async fn test_non_positive_limit_defaults_with_advisory() {
    let db = actor_db(1);

    let rendered = execute_sql(&db, "SELECT actor_id, first_name FROM actor", 0).await;

    assert!(rendered.starts_with(&format!(
        "Limit must be positive. Defaulting to {}.\n",
        DEFAULT_LIMIT
    )));
    assert!(rendered.contains("Columns: actor_id, first_name"));
}

#[tokio::test]
async fn test_excessive_limit_capped_with_advisory() {
    let db = actor_db(1);

    let rendered = execute_sql(&db, "SELECT actor_id, first_name FROM actor", 5000).await;

    assert!(rendered.starts_with(&format!(
        "Limit exceeds maximum of {}. Capping to {}.\n",
        MAX_LIMIT, MAX_LIMIT
    )));
}

#[tokio::test]
async fn test_empty_result_set_message() {
    let db = MockDatabaseClient::new().with_rows(vec![ColumnInfo::new("x", "integer")], vec![]);

    let rendered = execute_sql(&db, "SELECT x FROM actor WHERE false", 30).await;

    assert_eq!(rendered, "Query executed successfully but returned no rows.");
}

#[tokio::test]
async fn test_database_failure_is_rendered_not_raised() {
    let db = FailingDatabaseClient::new("relation \"actr\" does not exist");

    let rendered = execute_sql(&db, "SELECT * FROM actr", 30).await;

    assert_eq!(
        rendered,
        "Error executing query: relation \"actr\" does not exist"
    );
}

#[tokio::test]
async fn test_pipeline_is_idempotent_for_selects() {
    let db = actor_db(2);

    let first = execute_sql(&db, "SELECT actor_id, first_name FROM actor", 30).await;
    let second = execute_sql(&db, "SELECT actor_id, first_name FROM actor", 30).await;

    assert_eq!(first, second);
    assert_eq!(db.call_count(), 2);
}
