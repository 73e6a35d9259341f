//! Task dispatch.
//!
//! A pipeline is an ordered list of [`Task`]s. Each task names a command in a
//! [`CommandRegistry`]; [`run_task`] resolves it, logs the task description
//! and awaits the command. [`run_pipeline`] runs tasks one after another and
//! stops at the first failure.
//!
//! Commands share a [`TaskContext`]: one connection (temporary tables
//! created by one task are visible to the next) and the declared schema.

mod registry;
mod task;

pub use registry::{Command, CommandRegistry};
pub use task::{
    CopyTableParams, CreateSchemaParams, CreateTableParams, CreateTemporaryTableParams,
    ImportTableParams, TableListParams, Task, TaskOutput, TaskParams, BUILTIN_COMMANDS,
};

use tracing::{debug, info};

use crate::core::schema::Schema;
use crate::core::traits::Connection;
use crate::error::{EtlError, Result};

/// Collaborators available to every command.
#[derive(Clone, Copy)]
pub struct TaskContext<'a> {
    pub connection: &'a dyn Connection,
    pub schema: &'a Schema,
}

impl<'a> TaskContext<'a> {
    pub fn new(connection: &'a dyn Connection, schema: &'a Schema) -> Self {
        Self { connection, schema }
    }
}

/// Run one task.
///
/// Fails with [`EtlError::UnknownCommand`] if the registry has no entry for
/// the task's command; otherwise returns whatever the command returns.
pub async fn run_task(
    task: &Task,
    ctx: &TaskContext<'_>,
    registry: &CommandRegistry,
) -> Result<TaskOutput> {
    let command = registry
        .get(&task.command)
        .ok_or_else(|| EtlError::UnknownCommand(task.command.clone()))?;

    if task.description.is_empty() {
        info!("{}", task.command);
    } else {
        info!("{}", task.description);
    }
    command.run(ctx, task).await
}

/// Run tasks in order, stopping at the first failure.
pub async fn run_pipeline(
    tasks: &[Task],
    ctx: &TaskContext<'_>,
    registry: &CommandRegistry,
) -> Result<Vec<TaskOutput>> {
    let mut outputs = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        debug!("Task {}/{}: {}", index + 1, tasks.len(), task.command);
        outputs.push(run_task(task, ctx, registry).await?);
    }
    info!("Pipeline complete: {} tasks", outputs.len());
    Ok(outputs)
}
