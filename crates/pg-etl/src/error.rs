//! Error types for the ingestion engine.

use std::fmt;

use thiserror::Error;

/// Failure reported by a [`Connection`](crate::core::Connection) or one of its
/// bulk-load channels.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Error returned by the PostgreSQL client.
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    /// Statement rejected by a non-PostgreSQL connection (recording, tests).
    #[error("{0}")]
    Rejected(String),
}

/// Which side of a bulk load signalled the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOrigin {
    /// The byte stream being loaded.
    Source,
    /// The bulk-load channel opened on the connection.
    Channel,
}

impl fmt::Display for StreamOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamOrigin::Source => f.write_str("source stream"),
            StreamOrigin::Channel => f.write_str("bulk-load channel"),
        }
    }
}

/// Main error type for ingestion operations.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Configuration error (invalid YAML, missing fields, bad options)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Task names a command absent from the registry
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Task params do not match the command's payload shape
    #[error("Invalid parameters for command {command}: {message}")]
    InvalidParams { command: String, message: String },

    /// Identifier or literal rejected before quoting
    #[error("Quoting error: {0}")]
    Quoting(String),

    /// Could not open a session to the target
    #[error("Failed to connect to PostgreSQL: {0}")]
    Connect(#[source] ConnectionError),

    /// DDL statement rejected by the connection
    #[error("DDL failed for table {table}: {source}")]
    Ddl {
        table: String,
        #[source]
        source: ConnectionError,
    },

    /// DML statement rejected by the connection
    #[error("DML failed for table {table}: {source}")]
    Dml {
        table: String,
        #[source]
        source: ConnectionError,
    },

    /// Table not declared in the supplied schema
    #[error("Table {0} is not declared in the schema")]
    UnknownTable(String),

    /// Mapped column not declared for its table
    #[error("Column {column} is not declared for table {table}")]
    UnknownColumn { table: String, column: String },

    /// Source stream or bulk-load channel failed while streaming
    #[error("Bulk load into {table} failed on the {origin}: {source}")]
    Stream {
        table: String,
        origin: StreamOrigin,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse error while sniffing a header
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EtlError {
    /// Create a DDL error for a table.
    pub fn ddl(table: impl Into<String>, source: ConnectionError) -> Self {
        EtlError::Ddl {
            table: table.into(),
            source,
        }
    }

    /// Create a DML error for a table.
    pub fn dml(table: impl Into<String>, source: ConnectionError) -> Self {
        EtlError::Dml {
            table: table.into(),
            source,
        }
    }

    /// Create a streaming error.
    pub fn stream(
        table: impl Into<String>,
        origin: StreamOrigin,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        EtlError::Stream {
            table: table.into(),
            origin,
            source: source.into(),
        }
    }

    /// Create an invalid-params error.
    pub fn invalid_params(command: impl Into<String>, message: impl fmt::Display) -> Self {
        EtlError::InvalidParams {
            command: command.into(),
            message: message.to_string(),
        }
    }

    /// Process exit code for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            EtlError::Config(_)
            | EtlError::Yaml(_)
            | EtlError::Json(_)
            | EtlError::UnknownCommand(_)
            | EtlError::InvalidParams { .. }
            | EtlError::Quoting(_)
            | EtlError::UnknownTable(_)
            | EtlError::UnknownColumn { .. } => 2,
            EtlError::Connect(_) | EtlError::Ddl { .. } | EtlError::Dml { .. } => 3,
            EtlError::Stream { .. } | EtlError::Csv(_) => 4,
            EtlError::Io(_) => 5,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_message() {
        let err = EtlError::UnknownCommand("explode".into());
        assert_eq!(err.to_string(), "Unknown command: explode");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_format_detailed_includes_cause() {
        let err = EtlError::ddl("users", ConnectionError::Rejected("relation exists".into()));
        let detailed = err.format_detailed();
        assert!(detailed.contains("DDL failed for table users"));
        assert!(detailed.contains("Caused by:\n  1: relation exists"));
    }

    #[test]
    fn test_stream_error_names_origin() {
        let err = EtlError::stream("t", StreamOrigin::Source, "disk went away");
        assert_eq!(
            err.to_string(),
            "Bulk load into t failed on the source stream: disk went away"
        );
        assert_eq!(err.exit_code(), 4);
    }
}
