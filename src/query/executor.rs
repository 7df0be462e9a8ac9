//! Execution of guarded requests against a database client.
//!
//! Runs the statement, then truncates the materialized rows to the effective
//! limit. The total row count always reflects the true cardinality before
//! truncation; the store never sees an SQL-level LIMIT. Every store error is
//! converted into a `Failure` outcome, so this function is total.

use tracing::debug;

use super::ExecutionOutcome;
use crate::db::{DatabaseClient, QueryExecution};
use crate::error::ChatError;
use crate::query::guard::GuardedRequest;

/// Executes a guarded request and materializes its outcome.
pub async fn execute(db: &dyn DatabaseClient, request: &GuardedRequest) -> ExecutionOutcome {
    match db.run_sql(&request.sql).await {
        Ok(QueryExecution::Rows { columns, mut rows }) => {
            let total_rows = rows.len();
            let shown_rows = total_rows.min(request.effective_limit);
            rows.truncate(shown_rows);

            debug!(
                total_rows,
                shown_rows,
                limit = request.effective_limit,
                "query returned a row set"
            );

            ExecutionOutcome::Rows {
                columns,
                rows,
                total_rows,
                shown_rows,
            }
        }
        Ok(QueryExecution::Affected { rows }) => {
            // Unreachable behind the read-only gate, handled anyway.
            debug!(rows, "query reported affected rows only");
            ExecutionOutcome::Affected { rows }
        }
        Err(e) => ExecutionOutcome::Failure {
            message: failure_message(e),
        },
    }
}

/// Strips the error-category prefix so the rendered text carries only the
/// underlying store message.
fn failure_message(error: ChatError) -> String {
    match error {
        ChatError::Connection(msg)
        | ChatError::Query(msg)
        | ChatError::Llm(msg)
        | ChatError::Config(msg)
        | ChatError::Internal(msg) => msg,
    }
}
