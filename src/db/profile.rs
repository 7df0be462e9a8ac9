//! Best-effort database profile snapshot.
//!
//! Builds the one-time text report (schema, sample rows, keys, functions,
//! types, views) used to prime the SQL-expert prompt. Each section is
//! independently best-effort: a failing section degrades to a placeholder,
//! and only a total connection failure degrades the whole profile to an
//! embedded error string. Nothing here may abort process startup.

use std::collections::BTreeMap;

use sqlx::postgres::PgConnection;
use sqlx::{Column as SqlxColumn, Connection, Row as SqlxRow};
use tracing::warn;

use crate::config::ConnectionConfig;
use crate::db::postgres::{convert_row, map_connection_error};

/// Builds the profile text, degrading to an error string on total failure.
pub async fn build(config: &ConnectionConfig) -> String {
    let conn_str = match config.to_connection_string() {
        Ok(conn_str) => conn_str,
        Err(e) => return format!("Error generating database profile: {}", e),
    };

    let mut conn = match PgConnection::connect(&conn_str).await {
        Ok(conn) => conn,
        Err(e) => {
            let mapped = map_connection_error(e, config);
            warn!("profile snapshot unavailable: {}", mapped);
            return format!("Error generating database profile: {}", mapped);
        }
    };

    let mut out: Vec<String> = Vec::new();

    let schema = table_schema_section(&mut conn, &mut out).await;
    sample_rows_section(&mut conn, &schema, &mut out).await;
    primary_keys_section(&mut conn, &mut out).await;
    foreign_keys_section(&mut conn, &mut out).await;
    functions_section(&mut conn, &mut out).await;
    custom_types_section(&mut conn, &mut out).await;
    views_section(&mut conn, &mut out).await;

    let _ = conn.close().await;

    out.join("\n")
}

/// Table/column listing, keyed by table for the sample-row section.
async fn table_schema_section(
    conn: &mut PgConnection,
    out: &mut Vec<String>,
) -> BTreeMap<String, Vec<String>> {
    out.push("=== TABLE SCHEMA ===\n".to_string());

    let rows: Vec<(String, String, String, String)> = match sqlx::query_as(
        r#"
        SELECT table_name::text, column_name::text, data_type::text, is_nullable::text
        FROM information_schema.columns
        WHERE table_schema = 'public'
        ORDER BY table_name, ordinal_position
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("failed to fetch table schema: {}", e);
            out.push("<could not fetch>".to_string());
            return BTreeMap::new();
        }
    };

    let mut schema: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (table, column, data_type, is_nullable) in rows {
        let nullability = if is_nullable == "YES" { "NULL" } else { "NOT NULL" };
        schema
            .entry(table)
            .or_default()
            .push(format!("  - {}: {} ({})", column, data_type, nullability));
    }

    for (table, columns) in &schema {
        out.push(format!("Table: {}\n{}\n", table, columns.join("\n")));
    }

    schema
}

/// One sample row per table; each table is independently best-effort.
async fn sample_rows_section(
    conn: &mut PgConnection,
    schema: &BTreeMap<String, Vec<String>>,
    out: &mut Vec<String>,
) {
    out.push("\n=== SAMPLE ROWS (LIMIT 1 PER TABLE) ===\n".to_string());

    for table in schema.keys() {
        let sql = format!("SELECT * FROM \"{}\" LIMIT 1", table);
        match sqlx::query(&sql).fetch_optional(&mut *conn).await {
            Ok(Some(row)) => {
                let values = convert_row(&row);
                let fields: Vec<String> = row
                    .columns()
                    .iter()
                    .zip(values.iter())
                    .map(|(col, value)| format!("{}={}", col.name(), value))
                    .collect();
                out.push(format!("Sample from {}:\n  {}\n", table, fields.join(", ")));
            }
            Ok(None) => out.push(format!("Sample from {}: <empty table>\n", table)),
            Err(e) => {
                warn!("failed to fetch sample row for {}: {}", table, e);
                out.push(format!("Sample from {}: <could not fetch>\n", table));
            }
        }
    }
}

async fn primary_keys_section(conn: &mut PgConnection, out: &mut Vec<String>) {
    out.push("\n=== PRIMARY KEYS ===\n".to_string());

    let rows: Vec<(String, String)> = match sqlx::query_as(
        r#"
        SELECT tc.table_name::text, kc.column_name::text
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kc
            ON tc.constraint_name = kc.constraint_name
        WHERE tc.constraint_type = 'PRIMARY KEY'
          AND tc.table_schema = 'public'
        ORDER BY tc.table_name
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("failed to fetch primary keys: {}", e);
            out.push("<could not fetch>".to_string());
            return;
        }
    };

    for (table, column) in rows {
        out.push(format!("{}: {}", table, column));
    }
}

async fn foreign_keys_section(conn: &mut PgConnection, out: &mut Vec<String>) {
    out.push("\n\n=== FOREIGN KEYS ===\n".to_string());

    let rows: Vec<(String, String, String, String)> = match sqlx::query_as(
        r#"
        SELECT
            tc.table_name::text AS foreign_table,
            kcu.column_name::text AS foreign_column,
            ccu.table_name::text AS primary_table,
            ccu.column_name::text AS primary_column
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
        JOIN information_schema.constraint_column_usage ccu
            ON ccu.constraint_name = tc.constraint_name
        WHERE tc.constraint_type = 'FOREIGN KEY'
          AND tc.table_schema = 'public'
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("failed to fetch foreign keys: {}", e);
            out.push("<could not fetch>".to_string());
            return;
        }
    };

    for (foreign_table, foreign_column, primary_table, primary_column) in rows {
        out.push(format!(
            "{}.{} -> {}.{}",
            foreign_table, foreign_column, primary_table, primary_column
        ));
    }
}

async fn functions_section(conn: &mut PgConnection, out: &mut Vec<String>) {
    out.push("\n\n=== FUNCTIONS (User-defined) ===\n".to_string());

    let rows: Vec<(String, String)> = match sqlx::query_as(
        r#"
        SELECT p.proname::text AS function_name,
               pg_catalog.pg_get_functiondef(p.oid)::text AS definition
        FROM pg_proc p
        JOIN pg_namespace n ON p.pronamespace = n.oid
        WHERE n.nspname = 'public'
          AND p.prokind = 'f'
        ORDER BY p.proname
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("failed to fetch functions: {}", e);
            out.push("<could not fetch>".to_string());
            return;
        }
    };

    if rows.is_empty() {
        out.push("<No custom functions>\n".to_string());
    } else {
        for (name, definition) in rows {
            out.push(format!("Function: {}\n{}\n", name, definition));
        }
    }
}

async fn custom_types_section(conn: &mut PgConnection, out: &mut Vec<String>) {
    out.push("\n\n=== CUSTOM DATA TYPES ===\n".to_string());

    let rows: Vec<(String, String)> = match sqlx::query_as(
        r#"
        SELECT t.typname::text AS type_name, t.typtype::text
        FROM pg_type t
        JOIN pg_namespace n ON t.typnamespace = n.oid
        WHERE n.nspname = 'public'
          AND t.typtype IN ('e', 'd', 'c')
        ORDER BY t.typname
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("failed to fetch custom types: {}", e);
            out.push("<could not fetch>".to_string());
            return;
        }
    };

    if rows.is_empty() {
        out.push("<No custom types>\n".to_string());
    } else {
        for (name, typtype) in rows {
            let kind = match typtype.as_str() {
                "e" => "ENUM",
                "d" => "DOMAIN",
                "c" => "COMPOSITE",
                _ => "UNKNOWN",
            };
            out.push(format!("{} ({})", name, kind));
        }
    }
}

async fn views_section(conn: &mut PgConnection, out: &mut Vec<String>) {
    out.push("\n\n=== VIEWS ===\n".to_string());

    let rows: Vec<(String, String)> = match sqlx::query_as(
        r#"
        SELECT table_name::text, view_definition::text
        FROM information_schema.views
        WHERE table_schema = 'public'
        ORDER BY table_name
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    {
        Ok(rows) => rows,
        Err(e) => {
            warn!("failed to fetch views: {}", e);
            out.push("<could not fetch>".to_string());
            return;
        }
    };

    for (name, definition) in rows {
        out.push(format!("View: {}\n{}\n", name, definition));
    }
}
