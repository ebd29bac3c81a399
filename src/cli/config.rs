//! Configuration file (`quarterclose.json`)
//!
//! ```json
//! { "data_dir": "/var/lib/quarterclose", "min_log_severity": "WARN" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::observability::Severity;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Facts dataset (optional, default `<data_dir>/facts.json`)
    #[serde(default)]
    pub facts_path: Option<String>,

    /// Lowest severity written to the log (optional, default "INFO")
    #[serde(default = "default_min_log_severity")]
    pub min_log_severity: String,
}

fn default_min_log_severity() -> String {
    "INFO".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::Config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::Config("data_dir must not be empty".to_string()));
        }

        if let Some(facts) = &self.facts_path {
            if facts.trim().is_empty() {
                return Err(CliError::Config("facts_path must not be empty".to_string()));
            }
        }

        self.min_severity()?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Resolved facts dataset path
    pub fn facts_file(&self) -> PathBuf {
        match &self.facts_path {
            Some(p) => PathBuf::from(p),
            None => self.data_path().join("facts.json"),
        }
    }

    /// Parsed log threshold
    pub fn min_severity(&self) -> CliResult<Severity> {
        Severity::parse(&self.min_log_severity).ok_or_else(|| {
            CliError::Config(format!(
                "Invalid min_log_severity: '{}'. Must be one of TRACE, INFO, WARN, ERROR, FATAL.",
                self.min_log_severity
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_json(r#"{"data_dir": "/tmp/qc"}"#).unwrap();
        assert_eq!(config.facts_file(), PathBuf::from("/tmp/qc/facts.json"));
        assert_eq!(config.min_severity().unwrap(), Severity::Info);
    }

    #[test]
    fn test_explicit_facts_path() {
        let config =
            Config::from_json(r#"{"data_dir": "/tmp/qc", "facts_path": "/srv/facts.json"}"#)
                .unwrap();
        assert_eq!(config.facts_file(), PathBuf::from("/srv/facts.json"));
    }

    #[test]
    fn test_rejects_empty_data_dir() {
        let err = Config::from_json(r#"{"data_dir": "  "}"#).unwrap_err();
        assert_eq!(err.code(), "QC_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_rejects_missing_data_dir() {
        assert!(Config::from_json(r#"{"facts_path": "/srv/facts.json"}"#).is_err());
    }

    #[test]
    fn test_rejects_unknown_severity() {
        let err =
            Config::from_json(r#"{"data_dir": "/tmp/qc", "min_log_severity": "LOUD"}"#)
                .unwrap_err();
        assert!(err.to_string().contains("LOUD"));
    }
}
