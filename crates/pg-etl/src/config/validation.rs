//! Configuration validation.

use super::Config;
use crate::drivers::SslMode;
use crate::error::{EtlError, Result};
use crate::pipeline::TaskParams;

/// Validate the configuration.
///
/// Checks the target, the schema invariants, and the params of every task
/// naming a built-in command. Tasks naming other commands are left to the
/// registry they run against.
pub fn validate(config: &Config) -> Result<()> {
    // Target validation
    if config.target.host.is_empty() {
        return Err(EtlError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(EtlError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(EtlError::Config("target.user is required".into()));
    }
    SslMode::parse(&config.target.ssl_mode)?;

    config.schema.validate()?;

    for (index, task) in config.tasks.iter().enumerate() {
        if task.command.is_empty() {
            return Err(EtlError::Config(format!(
                "tasks[{}].command is required",
                index
            )));
        }
        if task.is_builtin() {
            if let TaskParams::ImportTable(params) = TaskParams::from_task(task)? {
                params.options.validate()?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;
    use crate::core::schema::{ColumnDefinition, Schema, TableDefinition};
    use crate::pipeline::Task;
    use serde_json::json;

    fn valid_config() -> Config {
        Config {
            target: TargetConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "warehouse".to_string(),
                user: "etl".to_string(),
                password: "password".to_string(),
                ssl_mode: "disable".to_string(),
                application_name: "pg-etl".to_string(),
            },
            schema: Schema::new(vec![TableDefinition::new(
                "people",
                vec![ColumnDefinition::new("name", "text")],
            )]),
            tasks: vec![Task::new("createSchema", "Create schema", json!(null))],
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_target_host() {
        let mut config = valid_config();
        config.target.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_ssl_mode() {
        let mut config = valid_config();
        config.target.ssl_mode = "sometimes".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut config = valid_config();
        let table = config.schema.tables()[0].clone();
        config.schema = Schema::new(vec![table.clone(), table]);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_builtin_task_params_checked() {
        let mut config = valid_config();
        config
            .tasks
            .push(Task::new("dropTables", "", json!({"tables": 3})));
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, EtlError::InvalidParams { .. }));
    }

    #[test]
    fn test_import_dialect_checked() {
        let mut config = valid_config();
        config.tasks.push(Task::new(
            "importTable",
            "Load people",
            json!({"source": "people.csv", "target": "people", "options": {"delimiter": "¦"}}),
        ));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("delimiter must be a single ASCII character"));
    }

    #[test]
    fn test_custom_task_not_checked() {
        let mut config = valid_config();
        config
            .tasks
            .push(Task::new("refreshViews", "", json!({"anything": true})));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_command_rejected() {
        let mut config = valid_config();
        config.tasks.push(Task::new("", "", json!(null)));
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_target_config_debug_redacts_password() {
        let mut config = valid_config();
        config.target.password = "super_secret_password_456".to_string();
        let debug_output = format!("{:?}", config.target);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password_456"));
    }
}
