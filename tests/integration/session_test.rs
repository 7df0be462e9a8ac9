//! Session orchestration tests against mock LLM and database backends.

use std::sync::Arc;

use sakila_chat::agent::Session;
use sakila_chat::db::{ColumnInfo, MockDatabaseClient, Value};
use sakila_chat::llm::MockLlmClient;

fn film_count_db() -> Arc<MockDatabaseClient> {
    Arc::new(MockDatabaseClient::new().with_rows(
        vec![ColumnInfo::new("count", "int8")],
        vec![vec![Value::Int(1000)]],
    ))
}

#[tokio::test]
async fn test_question_flows_through_tool_to_analyst() {
    let db = film_count_db();
    let mut session = Session::new(
        Box::new(MockLlmClient::new()),
        Box::new(db.clone()),
        "=== TABLE SCHEMA ===\nfilm".to_string(),
    );

    let answer = session.ask("How many films are there?").await.unwrap();

    assert_eq!(db.call_count(), 1);
    assert_eq!(
        answer,
        "Based on the query results, here is the answer to your question."
    );
}

#[tokio::test]
async fn test_modification_request_is_refused_without_touching_the_database() {
    let db = film_count_db();
    let mut session = Session::new(
        Box::new(MockLlmClient::new()),
        Box::new(db.clone()),
        "profile".to_string(),
    );

    let answer = session.ask("drop the rental table").await;

    assert!(answer.is_ok());
    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_off_topic_question_is_refused_without_touching_the_database() {
    let db = film_count_db();
    let mut session = Session::new(
        Box::new(MockLlmClient::new()),
        Box::new(db.clone()),
        "profile".to_string(),
    );

    session.ask("what is the weather in Paris?").await.unwrap();

    assert_eq!(db.call_count(), 0);
}

#[tokio::test]
async fn test_custom_scripted_conversation() {
    let db = film_count_db();
    let llm = MockLlmClient::new()
        .with_response(
            "New user question",
            "```sql\nSELECT COUNT(*) FROM film;\n```",
        )
        .with_response("Columns: count", "(1000)\nTERMINATE")
        .with_response("Query Results:", "There are 1000 films in the catalog.");
    let mut session = Session::new(Box::new(llm), Box::new(db.clone()), "profile".to_string());

    let answer = session.ask("film count please").await.unwrap();

    assert_eq!(answer, "There are 1000 films in the catalog.");
    assert_eq!(db.call_count(), 1);
}

#[tokio::test]
async fn test_history_survives_across_questions() {
    let db = film_count_db();
    let mut session = Session::new(
        Box::new(MockLlmClient::new()),
        Box::new(db.clone()),
        "profile".to_string(),
    );

    session.ask("How many films are there?").await.unwrap();
    session.ask("How many films are there again?").await.unwrap();

    assert_eq!(session.history_len(), 2);
}
