//! Registry of commands a task may name.
//!
//! The [`CommandRegistry`] is constructed explicitly and handed to the
//! dispatcher; there is no global command table. Custom commands are added
//! with [`CommandRegistry::register`] and may replace a built-in one.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::task::{Task, TaskOutput, TaskParams, BUILTIN_COMMANDS};
use super::TaskContext;
use crate::ddl;
use crate::error::Result;
use crate::load;
use crate::transfer;

/// An operation a task can invoke.
#[async_trait]
pub trait Command: Send + Sync {
    /// Run `task` against the context's connection and schema.
    async fn run(&self, ctx: &TaskContext<'_>, task: &Task) -> Result<TaskOutput>;
}

/// Name to command mapping.
#[derive(Default, Clone)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the seven built-in commands.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtin: Arc<dyn Command> = Arc::new(Builtin);
        for name in BUILTIN_COMMANDS {
            registry.commands.insert(name.to_string(), builtin.clone());
        }
        registry
    }

    /// Register `command` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, command: impl Command + 'static) {
        self.commands.insert(name.into(), Arc::new(command));
    }

    /// Look up a command.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Handler shared by every built-in command; the task's command name selects
/// the operation through its parsed [`TaskParams`].
struct Builtin;

#[async_trait]
impl Command for Builtin {
    async fn run(&self, ctx: &TaskContext<'_>, task: &Task) -> Result<TaskOutput> {
        let conn = ctx.connection;
        match TaskParams::from_task(task)? {
            TaskParams::CreateSchema(p) => {
                let schema = p.schema.as_ref().unwrap_or(ctx.schema);
                schema.validate()?;
                ddl::create_schema(conn, schema).await?;
                Ok(TaskOutput::Completed)
            }
            TaskParams::CreateTable(p) => {
                ddl::create_table(conn, &p.table, &p.columns).await?;
                Ok(TaskOutput::Completed)
            }
            TaskParams::CreateTemporaryTable(p) => {
                ddl::create_temporary_table(conn, &p.table, &p.columns).await?;
                Ok(TaskOutput::Completed)
            }
            TaskParams::RecreateTables(p) => {
                ddl::recreate_tables(conn, ctx.schema, &p.tables).await?;
                Ok(TaskOutput::Completed)
            }
            TaskParams::DropTables(p) => {
                ddl::drop_tables(conn, &p.tables).await?;
                Ok(TaskOutput::Completed)
            }
            TaskParams::CopyTable(p) => {
                let rows =
                    transfer::copy_table(conn, ctx.schema, &p.source, &p.target, &p.columns)
                        .await?;
                Ok(TaskOutput::Rows(rows))
            }
            TaskParams::ImportTable(p) => {
                let result =
                    load::import_table(conn, ctx.schema, &p.source, &p.target, &p.options)
                        .await?;
                Ok(TaskOutput::Loaded(result))
            }
        }
    }
}
