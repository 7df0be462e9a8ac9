//! Deterministic text rendering of execution outcomes.
//!
//! Pure string assembly. All truncation decisions were already made by the
//! guard and executor; the exact output strings here are part of the tool's
//! wire contract with the orchestration layer.

use super::ExecutionOutcome;
use crate::db::Row;

/// Renders an outcome and its advisories into the single text blob returned
/// to the tool caller.
///
/// Advisories prefix row-set outcomes only; rejection, rows-affected and
/// failure outcomes stand alone.
pub fn render(outcome: &ExecutionOutcome, advisories: &[String]) -> String {
    match outcome {
        ExecutionOutcome::Rejected { reason } => reason.clone(),

        ExecutionOutcome::Rows {
            total_rows: 0, ..
        } => {
            let mut out = advisory_prefix(advisories);
            out.push_str("Query executed successfully but returned no rows.");
            out
        }

        ExecutionOutcome::Rows {
            columns,
            rows,
            total_rows,
            shown_rows,
        } => {
            let mut out = advisory_prefix(advisories);
            let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
            out.push_str(&format!("Columns: {}\n\nResults:\n", names.join(", ")));
            for row in rows {
                out.push_str(&render_row(row));
                out.push('\n');
            }
            if total_rows > shown_rows {
                out.push_str(&format!("\n...and {} more rows", total_rows - shown_rows));
            }
            out
        }

        ExecutionOutcome::Affected { rows } => {
            format!("Query executed successfully. Rows affected: {}", rows)
        }

        ExecutionOutcome::Failure { message } => {
            format!("Error executing query: {}", message)
        }
    }
}

/// One line per advisory, each newline-terminated.
fn advisory_prefix(advisories: &[String]) -> String {
    let mut out = String::new();
    for advisory in advisories {
        out.push_str(advisory);
        out.push('\n');
    }
    out
}

/// Renders a row as its ordered-field text form, e.g. `(1, PENELOPE, NULL)`.
fn render_row(row: &Row) -> String {
    let fields: Vec<String> = row.iter().map(|v| v.to_display_string()).collect();
    format!("({})", fields.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnInfo, Value};
    use pretty_assertions::assert_eq;

    fn rows_outcome(total: usize, shown: usize) -> ExecutionOutcome {
        let rows = (0..shown)
            .map(|i| vec![Value::Int(i as i64), Value::from(format!("name{}", i))])
            .collect();
        ExecutionOutcome::Rows {
            columns: vec![
                ColumnInfo::new("actor_id", "integer"),
                ColumnInfo::new("first_name", "varchar"),
            ],
            rows,
            total_rows: total,
            shown_rows: shown,
        }
    }

    #[test]
    fn test_render_rejection_is_verbatim() {
        let outcome = ExecutionOutcome::Rejected {
            reason: "User is not allowed to modify the database".to_string(),
        };
        assert_eq!(
            render(&outcome, &[]),
            "User is not allowed to modify the database"
        );
    }

    #[test]
    fn test_render_rejection_ignores_advisories() {
        let outcome = ExecutionOutcome::Rejected {
            reason: "nope".to_string(),
        };
        let advisories = vec!["Limit must be positive. Defaulting to 30.".to_string()];
        assert_eq!(render(&outcome, &advisories), "nope");
    }

    #[test]
    fn test_render_zero_rows() {
        let outcome = rows_outcome(0, 0);
        assert_eq!(
            render(&outcome, &[]),
            "Query executed successfully but returned no rows."
        );
    }

    #[test]
    fn test_render_zero_rows_with_advisory() {
        let outcome = rows_outcome(0, 0);
        let advisories = vec!["Limit must be positive. Defaulting to 30.".to_string()];
        assert_eq!(
            render(&outcome, &advisories),
            "Limit must be positive. Defaulting to 30.\n\
             Query executed successfully but returned no rows."
        );
    }

    #[test]
    fn test_render_rows_without_truncation() {
        let outcome = rows_outcome(2, 2);
        assert_eq!(
            render(&outcome, &[]),
            "Columns: actor_id, first_name\n\nResults:\n(0, name0)\n(1, name1)\n"
        );
    }

    #[test]
    fn test_render_rows_with_truncation_suffix() {
        let outcome = rows_outcome(200, 2);
        let text = render(&outcome, &[]);
        assert!(text.starts_with("Columns: actor_id, first_name\n\nResults:\n"));
        assert!(text.ends_with("\n...and 198 more rows"));
    }

    #[test]
    fn test_render_rows_with_advisory_prefix() {
        let outcome = rows_outcome(1, 1);
        let advisories = vec!["Limit exceeds maximum of 100. Capping to 100.".to_string()];
        let text = render(&outcome, &advisories);
        assert!(text.starts_with(
            "Limit exceeds maximum of 100. Capping to 100.\nColumns: "
        ));
    }

    #[test]
    fn test_render_affected() {
        let outcome = ExecutionOutcome::Affected { rows: 7 };
        assert_eq!(
            render(&outcome, &[]),
            "Query executed successfully. Rows affected: 7"
        );
    }

    #[test]
    fn test_render_failure() {
        let outcome = ExecutionOutcome::Failure {
            message: "relation \"actr\" does not exist".to_string(),
        };
        assert_eq!(
            render(&outcome, &[]),
            "Error executing query: relation \"actr\" does not exist"
        );
    }

    #[test]
    fn test_render_null_values() {
        let outcome = ExecutionOutcome::Rows {
            columns: vec![ColumnInfo::new("x", "integer")],
            rows: vec![vec![Value::Null]],
            total_rows: 1,
            shown_rows: 1,
        };
        let text = render(&outcome, &[]);
        assert!(text.contains("(NULL)"));
    }
}
