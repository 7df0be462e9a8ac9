//! SQL parsing and read-only classification logic.
//!
//! Uses sqlparser-rs with the PostgreSQL dialect, so semicolons inside string
//! literals do not create false statement boundaries. A statement is read-only
//! only when it is a `SELECT`-class query with no data-modifying CTEs or
//! derived tables anywhere inside it.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use super::Classification;

/// Classifies a SQL text as read-only or not.
///
/// The whole text is read-only iff every parsed statement is. A parse failure
/// classifies as not read-only (conservative default).
pub fn classify_sql(sql: &str) -> Classification {
    let statements = match Parser::parse_sql(&PostgreSqlDialect {}, sql) {
        Ok(statements) => statements,
        Err(_) => return Classification::NotReadOnly,
    };

    for statement in &statements {
        if !is_read_only_statement(statement) {
            return Classification::NotReadOnly;
        }
    }

    Classification::ReadOnly {
        statements: statements.len(),
    }
}

/// Returns true only for pure retrieval statements.
fn is_read_only_statement(statement: &Statement) -> bool {
    match statement {
        // Queries may smuggle DML through CTEs (WITH x AS (DELETE ...)),
        // so the body has to be walked.
        Statement::Query(query) => is_read_only_query(query),

        // Everything else (INSERT/UPDATE/DELETE, DDL, transaction control,
        // SET, COPY, ...) is treated as a mutation attempt.
        _ => false,
    }
}

/// Walks a query, including its WITH clause, for data-modifying operations.
fn is_read_only_query(query: &Query) -> bool {
    if let Some(with) = &query.with {
        if !with.cte_tables.iter().all(|cte| is_read_only_query(&cte.query)) {
            return false;
        }
    }

    is_read_only_set_expr(&query.body)
}

fn is_read_only_set_expr(set_expr: &SetExpr) -> bool {
    match set_expr {
        // DML wrapped in a CTE body surfaces here.
        SetExpr::Delete(_) | SetExpr::Update(_) | SetExpr::Insert(_) | SetExpr::Merge(_) => false,

        SetExpr::Query(query) => is_read_only_query(query),

        SetExpr::Select(select) => is_read_only_select(select),

        // UNION / INTERSECT / EXCEPT: both sides must be clean.
        SetExpr::SetOperation { left, right, .. } => {
            is_read_only_set_expr(left) && is_read_only_set_expr(right)
        }

        // Bare VALUES and TABLE cannot contain subqueries.
        SetExpr::Values(_) | SetExpr::Table(_) => true,
    }
}

/// Checks a SELECT for an INTO target and its FROM clause for derived
/// tables hiding mutations.
fn is_read_only_select(select: &Select) -> bool {
    // SELECT ... INTO <table> creates a table.
    if select.into.is_some() {
        return false;
    }

    select.from.iter().all(is_read_only_table_with_joins)
}

fn is_read_only_table_with_joins(twj: &TableWithJoins) -> bool {
    if !is_read_only_table_factor(&twj.relation) {
        return false;
    }

    twj.joins
        .iter()
        .all(|join| is_read_only_table_factor(&join.relation))
}

fn is_read_only_table_factor(factor: &TableFactor) -> bool {
    match factor {
        TableFactor::Derived { subquery, .. } => is_read_only_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => is_read_only_table_with_joins(table_with_joins),
        // Plain tables, table functions, etc.
        _ => true,
    }
}
