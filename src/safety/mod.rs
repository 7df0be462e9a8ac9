//! Read-only classification of SQL requests.
//!
//! Parses a SQL text and decides whether every statement in it is a pure
//! retrieval. This is the only gate standing between model-generated SQL and
//! the database, so anything unparseable or unrecognized is not read-only.

mod parser;

pub use parser::classify_sql;

/// Outcome of classifying a SQL request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Every parsed statement is a pure retrieval. An empty input classifies
    /// as read-only with zero statements.
    ReadOnly {
        /// Number of parsed statements.
        statements: usize,
    },
    /// At least one statement mutates data or schema, could not be parsed,
    /// or is of an unrecognized kind.
    NotReadOnly,
}

impl Classification {
    /// Returns true if the request may be executed.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly { .. })
    }
}
