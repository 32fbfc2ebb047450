//! ABOUTME: TOML-backed configuration loading for the reconciler process
//! ABOUTME: Search order mirrors common CLI conventions: explicit path, then cwd discovery

use crate::feature_flags::FeatureFlags;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_SEARCH_PATHS: &[&str] = &["adc.toml", ".adc.toml", "config/adc.toml"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no configuration file found in search path")]
    NotFound,
}

/// Retry/back-off parameters for the workflow engine and capability loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_step_error_retries")]
    pub max_step_error_retries: u32,
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
}

fn default_max_step_error_retries() -> u32 {
    3
}
fn default_backoff_base_secs() -> u64 {
    1
}
fn default_backoff_max_secs() -> u64 {
    60
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_step_error_retries: default_max_step_error_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            backoff_max_secs: default_backoff_max_secs(),
        }
    }
}

impl RetryConfig {
    /// Exponential back-off for the given attempt number (0-indexed),
    /// capped at `backoff_max_secs`.
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> u64 {
        let exp = self.backoff_base_secs.saturating_mul(1u64 << attempt.min(16));
        exp.min(self.backoff_max_secs)
    }
}

/// Top-level controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub feature_flags: FeatureFlags,
    #[serde(default)]
    pub retry: RetryConfig,
    /// System namespace searched after the Application's own namespace when
    /// resolving capability definitions.
    #[serde(default = "default_system_namespace")]
    pub system_namespace: String,
}

fn default_system_namespace() -> String {
    "adc-system".to_string()
}

impl ControllerConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Search the conventional config file locations, falling back to
    /// defaults when none exist — missing config is not an error.
    #[must_use]
    pub fn discover() -> Self {
        for candidate in CONFIG_SEARCH_PATHS {
            let path = PathBuf::from(candidate);
            if path.exists() {
                if let Ok(config) = Self::load_from_path(&path) {
                    return config;
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_system_namespace_is_adc_system() {
        assert_eq!(ControllerConfig::default().system_namespace, "adc-system");
    }

    #[test]
    fn backoff_grows_exponentially_then_caps() {
        let retry = RetryConfig {
            max_step_error_retries: 5,
            backoff_base_secs: 1,
            backoff_max_secs: 10,
        };
        assert_eq!(retry.backoff_for_attempt(0), 1);
        assert_eq!(retry.backoff_for_attempt(1), 2);
        assert_eq!(retry.backoff_for_attempt(2), 4);
        assert_eq!(retry.backoff_for_attempt(10), 10);
    }

    #[test]
    fn load_from_path_parses_toml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("adc.toml");
        std::fs::write(
            &path,
            r#"
            system_namespace = "custom-system"

            [feature_flags]
            suspend_on_failure = true
            "#,
        )
        .unwrap();

        let config = ControllerConfig::load_from_path(&path).unwrap();
        assert_eq!(config.system_namespace, "custom-system");
        assert!(config.feature_flags.suspend_on_failure);
    }

    #[test]
    fn load_from_missing_path_errors() {
        let result = ControllerConfig::load_from_path(Path::new("/nonexistent/adc.toml"));
        assert!(result.is_err());
    }
}
