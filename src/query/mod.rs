//! Guarded SQL tool pipeline: classify, guard, execute, render.
//!
//! `execute_sql` is the single tool exposed to the model-driven agents. It is
//! total: every input produces a rendered string, never an error.

pub mod executor;
pub mod guard;
pub mod render;

pub use guard::{DEFAULT_LIMIT, MAX_LIMIT, MAX_STATEMENTS, NOT_READ_ONLY_MSG};

use crate::db::{ColumnInfo, DatabaseClient, Row};

/// Outcome of one tool call, after guarding and (possibly) execution.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// Classification or limit failure; no execution was attempted.
    Rejected { reason: String },

    /// A materialized row set. `shown_rows == min(total_rows, effective_limit)`
    /// and `rows.len() == shown_rows`.
    Rows {
        columns: Vec<ColumnInfo>,
        rows: Vec<Row>,
        total_rows: usize,
        shown_rows: usize,
    },

    /// A statement that returned no row set. Defensive path; the read-only
    /// gate makes it unreachable in practice.
    Affected { rows: u64 },

    /// A backing-store error, surfaced verbatim.
    Failure { message: String },
}

/// Executes a SQL request with the given row limit and renders the result.
///
/// This is the tool-call boundary consumed by the orchestration layer; the
/// rejection and advisory strings it produces are a wire contract.
pub async fn execute_sql(db: &dyn DatabaseClient, sql: &str, limit: i64) -> String {
    let guarded = match guard::guard(sql, limit) {
        Ok(guarded) => guarded,
        Err(rejection) => {
            return render::render(
                &ExecutionOutcome::Rejected {
                    reason: rejection.message(),
                },
                &[],
            );
        }
    };

    let outcome = executor::execute(db, &guarded).await;
    render::render(&outcome, &guarded.advisories)
}
