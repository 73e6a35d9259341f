//! Table-to-table copies driven by column mappings.
//!
//! [`copy_table`] compiles one projection per target column and moves all
//! rows with a single `INSERT ... SELECT`, so the data never leaves the
//! server.

mod mapping;

pub use mapping::{ColumnMapping, ColumnSource};

use tracing::debug;

use crate::core::identifier::quote_identifier;
use crate::core::schema::Schema;
use crate::core::traits::Connection;
use crate::error::{EtlError, Result};

/// Build `INSERT INTO "target" (...) SELECT ... FROM "source"`.
///
/// The target must be declared in `schema`, and every mapped column must be
/// declared on it (its type drives [`ColumnSource::Column`] casts).
pub fn copy_table_sql(
    schema: &Schema,
    source: &str,
    target: &str,
    columns: &[ColumnMapping],
) -> Result<String> {
    let table = schema
        .find(target)
        .ok_or_else(|| EtlError::UnknownTable(target.to_string()))?;

    let mut names = Vec::with_capacity(columns.len());
    let mut values = Vec::with_capacity(columns.len());
    for mapping in columns {
        let target_type =
            table
                .column_type(&mapping.name)
                .ok_or_else(|| EtlError::UnknownColumn {
                    table: target.to_string(),
                    column: mapping.name.clone(),
                })?;
        names.push(quote_identifier(&mapping.name)?);
        values.push(mapping.compile(target_type)?);
    }

    Ok(format!(
        "INSERT INTO {} ({}) SELECT {} FROM {}",
        quote_identifier(target)?,
        names.join(", "),
        values.join(", "),
        quote_identifier(source)?
    ))
}

/// Copy rows from `source` into `target`, returning the number inserted.
pub async fn copy_table(
    conn: &dyn Connection,
    schema: &Schema,
    source: &str,
    target: &str,
    columns: &[ColumnMapping],
) -> Result<u64> {
    let sql = copy_table_sql(schema, source, target, columns)?;
    let rows = conn
        .execute(&sql)
        .await
        .map_err(|e| EtlError::dml(target, e))?;

    debug!("Copied {} rows from {} into {}", rows, source, target);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::{ColumnDefinition, TableDefinition};
    use crate::drivers::RecordingConnection;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(vec![TableDefinition::new(
            "people",
            vec![
                ColumnDefinition::new("name", "text"),
                ColumnDefinition::new("age", "integer"),
                ColumnDefinition::new("source", "text"),
                ColumnDefinition::new("notes", "text"),
            ],
        )])
    }

    fn mappings() -> Vec<ColumnMapping> {
        serde_json::from_value(json!([
            {"name": "name", "sourceExpression": "trim(\"Name\")"},
            {"name": "age", "sourceName": "Age"},
            {"name": "source", "sourceValue": "survey"},
            {"name": "notes"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_copy_table_sql() {
        let sql = copy_table_sql(&schema(), "raw_people", "people", &mappings()).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"people\" (\"name\", \"age\", \"source\", \"notes\") \
             SELECT trim(\"Name\"), CAST(\"Age\" AS integer), 'survey', NULL \
             FROM \"raw_people\""
        );
    }

    #[test]
    fn test_unknown_target_table() {
        let err = copy_table_sql(&schema(), "raw", "missing", &mappings()).unwrap_err();
        assert!(matches!(err, EtlError::UnknownTable(t) if t == "missing"));
    }

    #[test]
    fn test_unknown_target_column() {
        let columns = vec![ColumnMapping::new("height", ColumnSource::Null)];
        let err = copy_table_sql(&schema(), "raw", "people", &columns).unwrap_err();
        assert!(matches!(err, EtlError::UnknownColumn { column, .. } if column == "height"));
    }

    #[tokio::test]
    async fn test_copy_table_executes_single_statement() {
        let conn = RecordingConnection::new();
        copy_table(&conn, &schema(), "raw_people", "people", &mappings())
            .await
            .unwrap();
        let statements = conn.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("INSERT INTO \"people\""));
    }

    #[tokio::test]
    async fn test_copy_table_rejection_is_dml_error() {
        let conn = RecordingConnection::new().rejecting("INSERT INTO");
        let err = copy_table(&conn, &schema(), "raw_people", "people", &mappings())
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::Dml { table, .. } if table == "people"));
    }
}
