//! # pg-etl
//!
//! Schema-driven ingestion into PostgreSQL.
//!
//! A pipeline declares a set of tables and an ordered list of tasks. Tasks
//! name commands that:
//!
//! - **Create and drop tables** from the declared schema, in dependency order
//! - **Bulk load CSV files** with the COPY protocol, streamed with backpressure
//! - **Infer staging tables** from a file's header when no table is declared
//! - **Copy between tables** with per-column expressions, constants or casts
//!
//! ## Example
//!
//! ```rust,no_run
//! use pg_etl::{run_pipeline, CommandRegistry, Config, PgConnection, TaskContext};
//!
//! #[tokio::main]
//! async fn main() -> pg_etl::Result<()> {
//!     let config = Config::load("pipeline.yaml")?;
//!     let conn = PgConnection::connect(&config.target).await?;
//!     let ctx = TaskContext::new(&conn, &config.schema);
//!     let outputs = run_pipeline(&config.tasks, &ctx, &CommandRegistry::with_builtins()).await?;
//!     println!("Ran {} tasks", outputs.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod ddl;
pub mod drivers;
pub mod error;
pub mod load;
pub mod pipeline;
pub mod transfer;

// Re-exports for convenient access
pub use config::{Config, TargetConfig};
pub use crate::core::{ByteSource, ColumnDefinition, Connection, CopyChannel, Schema, TableDefinition};
pub use drivers::{PgConnection, RecordingConnection, SslMode};
pub use error::{ConnectionError, EtlError, Result, StreamOrigin};
pub use load::{import_table, import_table_from_stream, ImportOptions, LoadResult};
pub use pipeline::{
    run_pipeline, run_task, Command, CommandRegistry, Task, TaskContext, TaskOutput,
};
pub use transfer::{copy_table, ColumnMapping, ColumnSource};
