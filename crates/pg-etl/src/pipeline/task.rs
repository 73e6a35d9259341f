//! Task records and the payloads of the built-in commands.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::schema::{ColumnDefinition, Schema};
use crate::error::{EtlError, Result};
use crate::load::{ImportOptions, LoadResult};
use crate::transfer::ColumnMapping;

/// Names of the commands every default registry provides.
pub const BUILTIN_COMMANDS: [&str; 7] = [
    "createSchema",
    "createTable",
    "createTemporaryTable",
    "recreateTables",
    "dropTables",
    "copyTable",
    "importTable",
];

/// One unit of work in a pipeline.
///
/// `params` is forwarded untouched to the command named by `command`; its
/// shape depends on that command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Registry key of the command to run.
    pub command: String,

    /// Logged before the command runs.
    #[serde(default)]
    pub description: String,

    /// Command payload.
    #[serde(default)]
    pub params: Value,
}

impl Task {
    pub fn new(command: impl Into<String>, description: impl Into<String>, params: Value) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
            params,
        }
    }

    /// Whether `command` is one of the built-in commands.
    pub fn is_builtin(&self) -> bool {
        BUILTIN_COMMANDS.contains(&self.command.as_str())
    }
}

/// Payload of a built-in command, checked before anything is executed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", content = "params", rename_all = "camelCase")]
pub enum TaskParams {
    CreateSchema(CreateSchemaParams),
    CreateTable(CreateTableParams),
    CreateTemporaryTable(CreateTemporaryTableParams),
    RecreateTables(TableListParams),
    DropTables(TableListParams),
    CopyTable(CopyTableParams),
    ImportTable(ImportTableParams),
}

impl TaskParams {
    /// Parse the payload of a task naming a built-in command.
    ///
    /// Missing (`null`) params are read as an empty object.
    pub fn from_task(task: &Task) -> Result<Self> {
        if !task.is_builtin() {
            return Err(EtlError::UnknownCommand(task.command.clone()));
        }
        let params = match &task.params {
            Value::Null => json!({}),
            other => other.clone(),
        };
        serde_json::from_value(json!({ "command": task.command, "params": params }))
            .map_err(|e| EtlError::invalid_params(&task.command, e))
    }
}

/// `createSchema`: drop and recreate every table of a schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateSchemaParams {
    /// Schema to create instead of the pipeline's own.
    #[serde(default)]
    pub schema: Option<Schema>,
}

/// `createTable`: create one table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTableParams {
    pub table: String,
    pub columns: Vec<ColumnDefinition>,
}

/// `createTemporaryTable`: create a session-scoped all-text table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTemporaryTableParams {
    pub table: String,
    /// Column names; `null` or empty entries are named by position.
    pub columns: Vec<Option<String>>,
}

/// `recreateTables` and `dropTables`: a list of table names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableListParams {
    pub tables: Vec<String>,
}

/// `copyTable`: move rows between two existing tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyTableParams {
    pub source: String,
    pub target: String,
    pub columns: Vec<ColumnMapping>,
}

/// `importTable`: load a CSV file into a table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportTableParams {
    /// Path of the CSV file.
    pub source: PathBuf,
    pub target: String,
    #[serde(default)]
    pub options: ImportOptions,
}

/// What a finished task produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskOutput {
    /// The command ran and has nothing to report.
    Completed,
    /// Rows inserted by a table copy.
    Rows(u64),
    /// Outcome of a bulk load.
    Loaded(LoadResult),
}

impl fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutput::Completed => write!(f, "completed"),
            TaskOutput::Rows(rows) => write!(f, "{} rows copied", rows),
            TaskOutput::Loaded(load) => write!(
                f,
                "{} rows ({} bytes) loaded into {}",
                load.rows, load.bytes, load.table
            ),
        }
    }
}
