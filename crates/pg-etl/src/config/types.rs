//! Configuration type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::schema::Schema;
use crate::pipeline::Task;

/// Root configuration structure: one pipeline file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target database (PostgreSQL) configuration.
    pub target: TargetConfig,

    /// Declared tables, in creation order.
    #[serde(default)]
    pub schema: Schema,

    /// Tasks, in execution order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Target database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password. Never written back out.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// SSL mode (default: "require").
    #[serde(default = "default_require")]
    pub ssl_mode: String,

    /// Application name reported to the server (default: "pg-etl").
    #[serde(default = "default_application_name")]
    pub application_name: String,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .field("application_name", &self.application_name)
            .finish()
    }
}

fn default_pg_port() -> u16 {
    5432
}

fn default_require() -> String {
    "require".to_string()
}

fn default_application_name() -> String {
    "pg-etl".to_string()
}
