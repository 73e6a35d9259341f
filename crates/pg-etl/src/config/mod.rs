//! Pipeline file loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Compute a SHA256 hash of the configuration, logged with each run.
    ///
    /// The password is not part of the serialized form and so does not
    /// affect the hash.
    pub fn hash(&self) -> String {
        let yaml = serde_yaml::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::pipeline::{TaskParams, BUILTIN_COMMANDS};
    use crate::transfer::ColumnSource;
    use std::io::Write;

    const PIPELINE: &str = r#"
target:
  host: db.internal
  database: warehouse
  user: etl
  password: hunter2
schema:
  - table: people
    columns:
      - { name: name, type: text }
      - { name: age, type: integer }
  - name: visits
    columns:
      - { name: person, type: text }
tasks:
  - command: createSchema
    description: Create schema
  - command: importTable
    description: Load raw people
    params:
      source: data/people.csv
      target: people_raw
      options: { header: true, delimiter: ";" }
  - command: copyTable
    description: Copy people
    params:
      source: people_raw
      target: people
      columns:
        - { name: name, sourceName: name }
        - { name: age, kind: value, value: 0 }
"#;

    #[test]
    fn test_from_yaml() {
        let config = Config::from_yaml(PIPELINE).unwrap();
        assert_eq!(config.target.port, 5432);
        assert_eq!(config.target.ssl_mode, "require");
        assert_eq!(config.target.application_name, "pg-etl");
        assert_eq!(config.schema.table_names(), vec!["people", "visits"]);
        assert_eq!(config.tasks.len(), 3);
        assert!(config.tasks.iter().all(|t| BUILTIN_COMMANDS.contains(&t.command.as_str())));

        match TaskParams::from_task(&config.tasks[2]).unwrap() {
            TaskParams::CopyTable(params) => {
                assert_eq!(params.columns[1].source, ColumnSource::Value(0.into()));
            }
            other => panic!("unexpected params {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PIPELINE.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.target.host, "db.internal");
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/pipeline.yaml").unwrap_err();
        assert!(matches!(err, EtlError::Io(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("target: [").unwrap_err();
        assert!(matches!(err, EtlError::Yaml(_)));
    }

    #[test]
    fn test_from_yaml_rejects_multibyte_delimiter() {
        let yaml = PIPELINE.replace(r#"delimiter: ";""#, r#"delimiter: "¦""#);
        assert_ne!(yaml, PIPELINE);
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, EtlError::Config(_)));
    }

    #[test]
    fn test_password_not_serialized_or_hashed() {
        let config = Config::from_yaml(PIPELINE).unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("hunter2"));

        let mut other = config.clone();
        other.target.password = "different".into();
        assert_eq!(config.hash(), other.hash());
        assert_eq!(config.hash().len(), 64);

        other.target.database = "elsewhere".into();
        assert_ne!(config.hash(), other.hash());
    }
}
