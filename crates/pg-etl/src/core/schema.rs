//! Declarative table definitions managed by the engine.
//!
//! A [`Schema`] is an ordered list of [`TableDefinition`]s. Order matters:
//! tables are created in declaration order and dropped in reverse, so a table
//! may reference any table declared before it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::identifier::validate_identifier_length;
use crate::error::{EtlError, Result};

/// Column of a declared table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    /// Column name.
    pub name: String,

    /// Database type expression (e.g. `integer`, `numeric(10,2)`).
    ///
    /// Emitted verbatim into DDL and casts. This is trusted configuration,
    /// never end-user input.
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnDefinition {
    /// Create a column definition.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A declared table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name, unique within its schema.
    #[serde(alias = "table")]
    pub name: String,

    /// Columns in declaration order.
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// Create a table definition.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Declared type of a column, if present.
    pub fn column_type(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.data_type.as_str())
    }

    /// Check column invariants: non-empty, uniquely named, typed.
    ///
    /// Table and column names must also fit the server's identifier length,
    /// since a truncated name no longer matches the one tasks refer to.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(EtlError::Config("table name is required".into()));
        }
        validate_identifier_length(&self.name)?;
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.is_empty() {
                return Err(EtlError::Config(format!(
                    "table {}: column name is required",
                    self.name
                )));
            }
            validate_identifier_length(&column.name)?;
            if column.data_type.trim().is_empty() {
                return Err(EtlError::Config(format!(
                    "table {}: column {} has no type",
                    self.name, column.name
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(EtlError::Config(format!(
                    "table {}: duplicate column {}",
                    self.name, column.name
                )));
            }
        }
        Ok(())
    }
}

/// Ordered list of table definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: Vec<TableDefinition>,
}

impl Schema {
    /// Create a schema from definitions in creation order.
    pub fn new(tables: Vec<TableDefinition>) -> Self {
        Self { tables }
    }

    /// Definitions in creation order.
    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }

    /// Table names in creation order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Look up a declared table by name.
    pub fn find(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Definitions whose names appear in `names`, in this schema's order.
    ///
    /// The order of `names` is irrelevant; names not declared here are
    /// ignored.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Schema {
        let wanted: HashSet<&str> = names.iter().map(|n| n.as_ref()).collect();
        Schema::new(
            self.tables
                .iter()
                .filter(|t| wanted.contains(t.name.as_str()))
                .cloned()
                .collect(),
        )
    }

    /// Check schema invariants: unique table names and valid tables.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for table in &self.tables {
            table.validate()?;
            if !seen.insert(table.name.as_str()) {
                return Err(EtlError::Config(format!(
                    "duplicate table {} in schema",
                    table.name
                )));
            }
        }
        Ok(())
    }
}

impl From<Vec<TableDefinition>> for Schema {
    fn from(tables: Vec<TableDefinition>) -> Self {
        Self::new(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::new(vec![
            TableDefinition::new("a", vec![ColumnDefinition::new("id", "integer")]),
            TableDefinition::new(
                "b",
                vec![
                    ColumnDefinition::new("id", "integer"),
                    ColumnDefinition::new("a_id", "integer"),
                ],
            ),
            TableDefinition::new("c", vec![ColumnDefinition::new("note", "text")]),
        ])
    }

    #[test]
    fn test_subset_preserves_schema_order() {
        let subset = sample().subset(&["c", "a", "missing"]);
        assert_eq!(subset.table_names(), vec!["a", "c"]);
    }

    #[test]
    fn test_find_and_column_type() {
        let schema = sample();
        let b = schema.find("b").unwrap();
        assert_eq!(b.column_type("a_id"), Some("integer"));
        assert_eq!(b.column_type("nope"), None);
        assert!(schema.find("z").is_none());
    }

    #[test]
    fn test_deserialize_accepts_table_alias() {
        let yaml = r#"
- table: people
  columns:
    - name: name
      type: text
    - name: age
      type: integer
"#;
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema.table_names(), vec!["people"]);
        assert_eq!(schema.tables()[0].columns[1].data_type, "integer");
    }

    #[test]
    fn test_validate_rejects_duplicate_table() {
        let mut tables = sample().tables().to_vec();
        tables.push(TableDefinition::new("a", vec![]));
        let err = Schema::new(tables).validate().unwrap_err();
        assert!(err.to_string().contains("duplicate table a"));
    }

    #[test]
    fn test_validate_rejects_duplicate_column() {
        let table = TableDefinition::new(
            "t",
            vec![
                ColumnDefinition::new("x", "text"),
                ColumnDefinition::new("x", "integer"),
            ],
        );
        assert!(table
            .validate()
            .unwrap_err()
            .to_string()
            .contains("duplicate column x"));
    }

    #[test]
    fn test_validate_rejects_names_the_server_would_truncate() {
        let long = "c".repeat(64);
        let table = TableDefinition::new("t", vec![ColumnDefinition::new(long.as_str(), "text")]);
        assert!(matches!(table.validate(), Err(EtlError::Quoting(_))));

        let table = TableDefinition::new(long.as_str(), vec![]);
        assert!(matches!(table.validate(), Err(EtlError::Quoting(_))));

        let table = TableDefinition::new("c".repeat(63), vec![]);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_ok());
    }
}
