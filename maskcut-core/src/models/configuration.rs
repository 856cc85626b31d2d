//! Configuration data structures

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum LogLevel {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "trace")]
    Trace,
}

/// Settings consumed by the masking workflow itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskingWorkflowConfig {
    /// Endpoint reported in status events and relay payloads
    pub endpoint: String,
    /// Model reported in status events and relay payloads
    pub model: String,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    /// LLM endpoint used for masking
    pub endpoint: String,
    /// Model name passed to the LLM client
    pub model: String,
    /// Number of status events retained for snapshots
    pub status_capacity: usize,
    /// JSONL audit trail destination; audit recording is a no-op when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log_path: Option<PathBuf>,
    /// Logging verbosity level
    pub log_level: LogLevel,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11434".to_string(),
            model: "local-model".to_string(),
            status_capacity: 50,
            audit_log_path: None,
            log_level: LogLevel::Info,
        }
    }
}

impl Configuration {
    /// Load configuration from file
    pub fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Configuration = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Return default configuration if file doesn't exist
            Ok(Configuration::default())
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn default_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir = dirs::config_dir().ok_or("Could not determine config directory")?;
        Ok(config_dir.join("maskcut").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.endpoint.trim().is_empty() {
            errors.push("endpoint must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            errors.push("model must not be empty".to_string());
        }
        if self.status_capacity == 0 {
            errors.push("status_capacity must be at least 1".to_string());
        }
        if self.status_capacity > 10_000 {
            errors.push("status_capacity cannot exceed 10000".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Workflow-facing view of this configuration.
    pub fn workflow_config(&self) -> MaskingWorkflowConfig {
        MaskingWorkflowConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_configuration_is_valid() {
        let config = Configuration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.status_capacity, 50);
        assert!(config.audit_log_path.is_none());
    }

    #[test]
    fn test_validation_rejects_empty_model() {
        let config = Configuration {
            model: "  ".to_string(),
            ..Configuration::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("model")));
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let config = Configuration {
            status_capacity: 0,
            ..Configuration::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Configuration::default();
        config.model = "mask-model".to_string();
        config.audit_log_path = Some(dir.path().join("audit.jsonl"));
        config.save_to_file(&path).unwrap();

        let loaded = Configuration::load_from_file(&path).unwrap();
        assert_eq!(loaded.model, "mask-model");
        assert_eq!(loaded.audit_log_path, config.audit_log_path);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Configuration::load_from_file(&path).unwrap();
        assert_eq!(loaded.model, Configuration::default().model);
    }
}
