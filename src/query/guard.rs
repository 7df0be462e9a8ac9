//! Request-level limits for SQL tool calls.
//!
//! Enforces the statement-count cap and clamps the requested row limit into
//! its valid range, producing advisory notices for the rendered output.

use crate::safety::{classify_sql, Classification};

/// Default row limit applied when the requested limit is not positive.
pub const DEFAULT_LIMIT: i64 = 30;

/// Hard cap on the row limit.
pub const MAX_LIMIT: i64 = 100;

/// Maximum number of ';'-separated statements per request.
pub const MAX_STATEMENTS: usize = 10;

/// Rejection message for requests containing non-retrieval statements.
/// The orchestration layer pattern-matches on this exact string.
pub const NOT_READ_ONLY_MSG: &str = "User is not allowed to modify the database";

/// A request that passed classification and limit checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedRequest {
    /// The SQL text, unmodified.
    pub sql: String,
    /// The clamped row limit, always in [1, MAX_LIMIT].
    pub effective_limit: usize,
    /// Non-fatal notices about automatic limit adjustments.
    pub advisories: Vec<String>,
}

/// Why a request was refused before execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// At least one statement is not a pure retrieval.
    NotReadOnly,
    /// More than `MAX_STATEMENTS` ';'-separated segments.
    TooManyStatements,
}

impl Rejection {
    /// The exact wire string for this rejection.
    pub fn message(&self) -> String {
        match self {
            Self::NotReadOnly => NOT_READ_ONLY_MSG.to_string(),
            Self::TooManyStatements => format!(
                "Too many queries in the request. Please limit to {} queries at once.",
                MAX_STATEMENTS
            ),
        }
    }
}

/// Validates a request and clamps its limit.
///
/// Both gates must pass: the parser-based classification and the cheap
/// structural count of ';'-separated segments. No database call happens here.
pub fn guard(sql: &str, limit: i64) -> Result<GuardedRequest, Rejection> {
    match classify_sql(sql) {
        Classification::ReadOnly { .. } => {}
        Classification::NotReadOnly => return Err(Rejection::NotReadOnly),
    }

    if sql.split(';').count() > MAX_STATEMENTS {
        return Err(Rejection::TooManyStatements);
    }

    let mut advisories = Vec::new();
    // The clamp branches are mutually exclusive: a non-positive limit can
    // never also exceed the maximum.
    let effective_limit = if limit <= 0 {
        advisories.push(format!(
            "Limit must be positive. Defaulting to {}.",
            DEFAULT_LIMIT
        ));
        DEFAULT_LIMIT as usize
    } else if limit > MAX_LIMIT {
        advisories.push(format!(
            "Limit exceeds maximum of {}. Capping to {}.",
            MAX_LIMIT, MAX_LIMIT
        ));
        MAX_LIMIT as usize
    } else {
        limit as usize
    };

    Ok(GuardedRequest {
        sql: sql.to_string(),
        effective_limit,
        advisories,
    })
}
