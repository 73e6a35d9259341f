//! Per-column rules for table-to-table copies.
//!
//! A mapping says how to compute one target column from the source table:
//! raw SQL, a constant, a cast source column, or null. Two input shapes are
//! accepted:
//!
//! ```yaml
//! # explicit
//! - { name: region, kind: value, value: "EU" }
//! - { name: age, kind: column, value: age_text }
//! - { name: full_name, kind: expression, value: "first || ' ' || last" }
//! - { name: notes, kind: "null" }
//! # legacy
//! - { name: age, sourceName: age_text }
//! - { name: region, sourceValue: "EU" }
//! ```
//!
//! The legacy shape picks, in order, `sourceExpression`, `sourceValue`,
//! `sourceName` by presence. A `sourceValue` of `0`, `false` or `""` is a
//! value; only an absent (or explicit `null`) field falls through.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::identifier::{quote_identifier, quote_literal, NULL_LITERAL};
use crate::error::Result;

/// Where a target column's value comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ColumnSource {
    /// Raw SQL over the source table's columns. Trusted configuration,
    /// emitted verbatim.
    Expression(String),
    /// A constant, quoted as a literal.
    Value(Value),
    /// A source column, cast to the target column's declared type.
    Column(String),
    /// SQL `NULL`.
    Null,
}

/// Rule for one target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawColumnMapping")]
pub struct ColumnMapping {
    /// Target column name.
    pub name: String,
    /// Value source.
    #[serde(flatten)]
    pub source: ColumnSource,
}

impl ColumnMapping {
    pub fn new(name: impl Into<String>, source: ColumnSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    /// Compile to a projection expression.
    ///
    /// `target_type` is the declared type of the target column, used for
    /// [`ColumnSource::Column`] casts.
    pub fn compile(&self, target_type: &str) -> Result<String> {
        match &self.source {
            ColumnSource::Expression(sql) => Ok(sql.clone()),
            ColumnSource::Value(value) => quote_literal(value),
            ColumnSource::Column(column) => Ok(format!(
                "CAST({} AS {})",
                quote_identifier(column)?,
                target_type
            )),
            ColumnSource::Null => Ok(NULL_LITERAL.to_string()),
        }
    }
}

/// Accepted input for a [`ColumnMapping`], either shape.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawColumnMapping {
    name: String,
    kind: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    source_expression: Option<String>,
    #[serde(default)]
    source_value: Option<Value>,
    source_name: Option<String>,
}

impl TryFrom<RawColumnMapping> for ColumnMapping {
    type Error = String;

    fn try_from(raw: RawColumnMapping) -> std::result::Result<Self, Self::Error> {
        if raw.name.is_empty() {
            return Err("column mapping requires a name".into());
        }

        let source = match raw.kind.as_deref() {
            Some(kind) => explicit_source(&raw.name, kind, raw.value)?,
            None => legacy_source(&raw.name, raw.source_expression, raw.source_value, raw.source_name)?,
        };

        Ok(ColumnMapping {
            name: raw.name,
            source,
        })
    }
}

fn explicit_source(
    name: &str,
    kind: &str,
    value: Option<Value>,
) -> std::result::Result<ColumnSource, String> {
    let text = |value: Option<Value>| match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        _ => Err(format!(
            "column {}: kind '{}' requires a non-empty string value",
            name, kind
        )),
    };

    match kind {
        "expression" => text(value).map(ColumnSource::Expression),
        "column" => text(value).map(ColumnSource::Column),
        "value" => Ok(ColumnSource::Value(value.unwrap_or(Value::Null))),
        "null" => Ok(ColumnSource::Null),
        other => Err(format!(
            "column {}: unknown kind '{}' (expected expression, value, column or null)",
            name, other
        )),
    }
}

fn legacy_source(
    name: &str,
    expression: Option<String>,
    value: Option<Value>,
    column: Option<String>,
) -> std::result::Result<ColumnSource, String> {
    if let Some(expression) = expression {
        if expression.is_empty() {
            return Err(format!("column {}: sourceExpression is empty", name));
        }
        return Ok(ColumnSource::Expression(expression));
    }
    // serde maps an explicit `null` to None as well.
    if let Some(value) = value {
        return Ok(ColumnSource::Value(value));
    }
    if let Some(column) = column {
        if column.is_empty() {
            return Err(format!("column {}: sourceName is empty", name));
        }
        return Ok(ColumnSource::Column(column));
    }
    Ok(ColumnSource::Null)
}
