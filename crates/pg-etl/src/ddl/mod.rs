//! Declarative table creation and removal.
//!
//! Every operation issues one statement at a time and stops at the first
//! rejection. Nothing here is transactional: [`create_schema`] drops every
//! named table before creating any, so a failure part-way through leaves the
//! earlier tables dropped (or recreated empty). Wrap calls in a transaction on
//! the connection if that matters.

use tracing::{debug, warn};

use crate::core::identifier::quote_identifier;
use crate::core::schema::{ColumnDefinition, Schema};
use crate::core::traits::Connection;
use crate::error::{EtlError, Result};

/// Column type used for every column of a temporary import table.
pub const TEMPORARY_COLUMN_TYPE: &str = "text";

/// Build `CREATE TABLE "t" ("c" type, ...)`.
pub fn create_table_sql(table: &str, columns: &[ColumnDefinition]) -> Result<String> {
    let column_defs = columns
        .iter()
        .map(|c| Ok(format!("{} {}", quote_identifier(&c.name)?, c.data_type)))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table)?,
        column_defs.join(", ")
    ))
}

/// Column names for a temporary table: missing or empty names become their
/// zero-based position.
pub fn temporary_column_names<S: AsRef<str>>(columns: &[Option<S>]) -> Vec<String> {
    columns
        .iter()
        .enumerate()
        .map(|(index, name)| match name.as_ref().map(|n| n.as_ref()) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => index.to_string(),
        })
        .collect()
}

/// Build `CREATE TEMPORARY TABLE "t" ("c" text, ...)`.
pub fn create_temporary_table_sql<S: AsRef<str>>(
    table: &str,
    columns: &[Option<S>],
) -> Result<String> {
    let column_defs = temporary_column_names(columns)
        .iter()
        .map(|name| Ok(format!("{} {}", quote_identifier(name)?, TEMPORARY_COLUMN_TYPE)))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TEMPORARY TABLE {} ({})",
        quote_identifier(table)?,
        column_defs.join(", ")
    ))
}

/// Build `DROP TABLE IF EXISTS "t"`.
pub fn drop_table_sql(table: &str) -> Result<String> {
    Ok(format!("DROP TABLE IF EXISTS {}", quote_identifier(table)?))
}

/// Create a table with the given columns.
///
/// Fails with [`EtlError::Ddl`] if the table already exists.
pub async fn create_table(
    conn: &dyn Connection,
    table: &str,
    columns: &[ColumnDefinition],
) -> Result<()> {
    let sql = create_table_sql(table, columns)?;
    conn.execute(&sql)
        .await
        .map_err(|e| EtlError::ddl(table, e))?;

    debug!("Created table {}", table);
    Ok(())
}

/// Create a session-scoped table whose columns are all `text`.
pub async fn create_temporary_table<S: AsRef<str>>(
    conn: &dyn Connection,
    table: &str,
    columns: &[Option<S>],
) -> Result<()> {
    let sql = create_temporary_table_sql(table, columns)?;
    conn.execute(&sql)
        .await
        .map_err(|e| EtlError::ddl(table, e))?;

    debug!("Created temporary table {} ({} columns)", table, columns.len());
    Ok(())
}

/// Drop tables in reverse of the given order, one statement each.
///
/// Later tables are assumed to depend on earlier ones. Missing tables are
/// not an error.
pub async fn drop_tables<S: AsRef<str>>(conn: &dyn Connection, tables: &[S]) -> Result<()> {
    for table in tables.iter().rev() {
        let table = table.as_ref();
        let sql = drop_table_sql(table)?;
        conn.execute(&sql)
            .await
            .map_err(|e| EtlError::ddl(table, e))?;

        debug!("Dropped table {}", table);
    }
    Ok(())
}

/// Drop every table of `schema` (reverse order), then create them all in
/// declaration order.
pub async fn create_schema(conn: &dyn Connection, schema: &Schema) -> Result<()> {
    drop_tables(conn, &schema.table_names()).await?;
    for table in schema.tables() {
        create_table(conn, &table.name, &table.columns).await?;
    }
    Ok(())
}

/// Drop and recreate only the named tables of `schema`.
///
/// Tables are processed in `schema`'s order, not the order of `tables`.
/// Names not declared in `schema` are skipped with a warning.
pub async fn recreate_tables<S: AsRef<str>>(
    conn: &dyn Connection,
    schema: &Schema,
    tables: &[S],
) -> Result<()> {
    for name in tables.iter().map(|t| t.as_ref()) {
        if schema.find(name).is_none() {
            warn!("Skipping {}: not declared in the schema", name);
        }
    }
    create_schema(conn, &schema.subset(tables)).await
}
