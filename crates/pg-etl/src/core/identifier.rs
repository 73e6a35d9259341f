//! Identifier and literal quoting for dynamically built SQL.
//!
//! Table and column names cannot be bound as statement parameters, and the
//! bulk-load command does not accept parameters at all, so every DDL, DML and
//! COPY string in this crate is assembled from text. Names pass through
//! [`quote_identifier`] and values through [`quote_literal`].
//!
//! Column types and `sourceExpression` mappings are the two exceptions: they
//! come from pipeline configuration and are emitted verbatim.

use serde_json::Value;

use crate::error::{EtlError, Result};

/// PostgreSQL truncates identifiers longer than NAMEDATALEN - 1 bytes.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// SQL null literal.
pub const NULL_LITERAL: &str = "NULL";

/// Validate an identifier before quoting.
///
/// Rejects empty names and names containing a null byte. Long names are
/// accepted; the server truncates them to [`MAX_IDENTIFIER_LENGTH`] bytes.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EtlError::Quoting("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(EtlError::Quoting(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    Ok(())
}

/// Reject a name the server would truncate.
///
/// Applied to names declared in pipeline configuration, where a truncated
/// name would no longer match the one tasks refer to. Names inferred from a
/// source header are not checked.
pub fn validate_identifier_length(name: &str) -> Result<()> {
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(EtlError::Quoting(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }
    Ok(())
}

/// Quote a PostgreSQL identifier.
///
/// Always wraps in double quotes and doubles any embedded double quote, so
/// the name is taken literally (including case).
///
/// ```
/// use pg_etl::core::identifier::quote_identifier;
///
/// assert_eq!(quote_identifier("users").unwrap(), "\"users\"");
/// assert_eq!(quote_identifier("a\"b").unwrap(), "\"a\"\"b\"");
/// ```
pub fn quote_identifier(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Quote a text value as a standard-conforming string literal.
///
/// Single quotes are doubled. Backslashes are not escape characters in
/// standard-conforming strings and are kept as-is.
pub fn quote_text(value: &str) -> Result<String> {
    if value.contains('\0') {
        return Err(EtlError::Quoting(format!(
            "Literal contains null byte: {:?}",
            value
        )));
    }
    Ok(format!("'{}'", value.replace('\'', "''")))
}

/// Quote a JSON value as a SQL literal.
///
/// - `null` becomes the bare `NULL` literal
/// - strings are quoted with [`quote_text`]
/// - numbers are quoted in their textual form and left to the server's
///   implicit cast (`'42'`)
/// - booleans use the server's short form (`'t'`, `'f'`)
/// - arrays and objects are quoted as their JSON text and cast to `jsonb`
pub fn quote_literal(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(NULL_LITERAL.to_string()),
        Value::String(s) => quote_text(s),
        Value::Bool(b) => quote_text(if *b { "t" } else { "f" }),
        Value::Number(n) => quote_text(&n.to_string()),
        Value::Array(_) | Value::Object(_) => {
            Ok(format!("{}::jsonb", quote_text(&value.to_string())?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("Column With Spaces").is_ok());
        assert!(validate_identifier("日本語").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let result = validate_identifier("");
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let result = validate_identifier("table\0name");
        assert!(result.unwrap_err().to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_length_boundary() {
        assert!(validate_identifier_length(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
        let result = validate_identifier_length(&"a".repeat(MAX_IDENTIFIER_LENGTH + 1));
        assert!(result.unwrap_err().to_string().contains("maximum length"));
    }

    #[test]
    fn test_quote_identifier_accepts_long_names() {
        let long = "ü".repeat(MAX_IDENTIFIER_LENGTH);
        assert_eq!(quote_identifier(&long).unwrap(), format!("\"{}\"", long));
    }

    #[test]
    fn test_quote_identifier_escapes_double_quote() {
        assert_eq!(quote_identifier("t").unwrap(), "\"t\"");
        assert_eq!(quote_identifier("MixedCase").unwrap(), "\"MixedCase\"");
        assert_eq!(quote_identifier("a\"b\"c").unwrap(), "\"a\"\"b\"\"c\"");
    }

    #[test]
    fn test_quote_identifier_injection_stays_inside_quotes() {
        assert_eq!(
            quote_identifier("x\"; DROP TABLE users; --").unwrap(),
            "\"x\"\"; DROP TABLE users; --\""
        );
    }

    #[test]
    fn test_quote_text() {
        assert_eq!(quote_text("").unwrap(), "''");
        assert_eq!(quote_text("'").unwrap(), "''''");
        assert_eq!(quote_text("O'Brien").unwrap(), "'O''Brien'");
        assert_eq!(quote_text("\\").unwrap(), "'\\'");
        assert!(quote_text("a\0b").is_err());
    }

    #[test]
    fn test_quote_literal_values() {
        assert_eq!(quote_literal(&Value::Null).unwrap(), "NULL");
        assert_eq!(quote_literal(&json!("abc")).unwrap(), "'abc'");
        assert_eq!(quote_literal(&json!(42)).unwrap(), "'42'");
        assert_eq!(quote_literal(&json!(0)).unwrap(), "'0'");
        assert_eq!(quote_literal(&json!(1.5)).unwrap(), "'1.5'");
        assert_eq!(quote_literal(&json!(true)).unwrap(), "'t'");
        assert_eq!(quote_literal(&json!(false)).unwrap(), "'f'");
        assert_eq!(
            quote_literal(&json!({"k": "it's"})).unwrap(),
            "'{\"k\":\"it''s\"}'::jsonb"
        );
        assert_eq!(quote_literal(&json!([1, "a"])).unwrap(), "'[1,\"a\"]'::jsonb");
    }
}
