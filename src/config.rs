//! Configuration for the cross-reference linter.
//!
//! Skip lists exempt named resources from existence checks for one
//! reference category each. The three lists are independent: a name on
//! the secret list does not exempt a ConfigMap of the same name.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintConfig {
    /// ConfigMap names exempted from envFrom/valueFrom/volume checks.
    #[serde(default)]
    pub skip_configmaps: HashSet<String>,

    /// Secret names exempted from envFrom/valueFrom checks.
    #[serde(default)]
    pub skip_secrets: HashSet<String>,

    /// Service names exempted from Ingress backend checks.
    #[serde(default)]
    pub skip_services: HashSet<String>,

    /// If true, the run never reports failure regardless of findings.
    #[serde(default)]
    pub no_fail: bool,
}

impl LintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_configmap(mut self, name: impl Into<String>) -> Self {
        self.skip_configmaps.insert(name.into());
        self
    }

    pub fn skip_secret(mut self, name: impl Into<String>) -> Self {
        self.skip_secrets.insert(name.into());
        self
    }

    pub fn skip_service(mut self, name: impl Into<String>) -> Self {
        self.skip_services.insert(name.into());
        self
    }

    /// Load configuration from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::load_from_str(&content)
    }

    /// Load configuration from a YAML string.
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Try the default config locations (.kuberef.yaml, .kuberef.yml).
    /// A file that exists but fails to load is an error, never a silent
    /// fallback to defaults.
    pub fn load_from_default() -> Result<Option<Self>, ConfigError> {
        for filename in &[".kuberef.yaml", ".kuberef.yml"] {
            let path = Path::new(filename);
            if path.exists() {
                return Self::load_from_file(path).map(Some);
            }
        }
        Ok(None)
    }
}

/// Configuration errors. Fatal: a broken config file aborts the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LintConfig::default();
        assert!(config.skip_configmaps.is_empty());
        assert!(config.skip_secrets.is_empty());
        assert!(config.skip_services.is_empty());
        assert!(!config.no_fail);
    }

    #[test]
    fn test_builder() {
        let config = LintConfig::new()
            .skip_configmap("generated-env")
            .skip_secret("external-creds")
            .skip_service("mock-svc");
        assert!(config.skip_configmaps.contains("generated-env"));
        assert!(config.skip_secrets.contains("external-creds"));
        assert!(config.skip_services.contains("mock-svc"));
    }

    #[test]
    fn test_lists_are_independent() {
        let config = LintConfig::new().skip_secret("shared-name");
        assert!(!config.skip_configmaps.contains("shared-name"));
        assert!(!config.skip_services.contains("shared-name"));
    }

    #[test]
    fn test_load_from_str() {
        let yaml = r#"
skipConfigmaps:
  - generated-env
skipSecrets:
  - external-creds
noFail: true
"#;
        let config = LintConfig::load_from_str(yaml).unwrap();
        assert!(config.skip_configmaps.contains("generated-env"));
        assert!(config.skip_secrets.contains("external-creds"));
        assert!(config.skip_services.is_empty());
        assert!(config.no_fail);
    }

    #[test]
    fn test_load_from_str_invalid() {
        assert!(LintConfig::load_from_str("skipConfigmaps: 42").is_err());
    }

    #[test]
    fn test_load_from_default_without_file_is_none() {
        // The package root carries no .kuberef.yaml.
        assert!(matches!(LintConfig::load_from_default(), Ok(None)));
    }
}
