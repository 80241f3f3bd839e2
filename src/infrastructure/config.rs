//! Configuration management
//!
//! Settings live in `<root>/.preflight.yml`. Every section is optional and
//! falls back to its defaults, so an empty or missing file is valid.

use crate::plan::NormalizerRules;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up in the project root
pub const CONFIG_FILE: &str = ".preflight.yml";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("Failed to read '{path}': {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid YAML or has the wrong field types
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// The document is YAML but not a mapping
    #[error("'{path}' must contain a YAML mapping")]
    NotAMapping {
        /// Config file path.
        path: PathBuf,
    },
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level
    pub log_level: String,
    /// Plan normalizer rules
    pub normalizer: NormalizerRules,
    /// Commands for the external tool checks
    pub tools: ToolCommands,
    /// Changed-file test targeting
    pub targeting: TestTargeting,
    /// Optional probe commands
    pub probes: ProbeCommands,
    /// License settings
    pub license: LicenseConfig,
    /// Doctor settings
    pub doctor: DoctorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            normalizer: NormalizerRules::default(),
            tools: ToolCommands::default(),
            targeting: TestTargeting::default(),
            probes: ProbeCommands::default(),
            license: LicenseConfig::default(),
            doctor: DoctorConfig::default(),
        }
    }
}

impl Config {
    /// Loads `<root>/.preflight.yml`, or defaults when the file is absent
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read or
    /// decoded.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_yaml_str(&path, &text)
    }

    /// Decodes configuration text; `path` is only used in errors
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] or [`ConfigError::NotAMapping`].
    pub fn from_yaml_str(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        match value {
            serde_yaml::Value::Null => Ok(Self::default()),
            serde_yaml::Value::Mapping(_) => {
                serde_yaml::from_value(value).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
            _ => Err(ConfigError::NotAMapping {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Shell-word command strings for the Lint/Types/Tests checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCommands {
    /// Linter invocation
    pub lint: String,
    /// Type checker invocation
    pub types: String,
    /// Test runner invocation
    pub tests: String,
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            lint: "ruff check .".to_string(),
            types: "mypy .".to_string(),
            tests: "pytest -q".to_string(),
        }
    }
}

/// Narrows the Tests check to modules changed since `base`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestTargeting {
    /// Pass a `-k` selector built from `git diff --name-only <base>`
    pub changed_only: bool,
    /// Revision to diff against
    pub base: String,
}

impl Default for TestTargeting {
    fn default() -> Self {
        Self {
            changed_only: false,
            base: "HEAD".to_string(),
        }
    }
}

/// Optional probe commands; unset probes grade SKIPPED
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeCommands {
    /// SQLite migration drift probe
    pub sqlite_drift: Option<String>,
    /// Postgres migration drift probe
    pub pg_drift: Option<String>,
    /// Docker smoke test
    pub docker_smoke: Option<String>,
}

/// License settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseConfig {
    /// Accepted keys; empty accepts any non-empty key
    pub accepted_keys: Vec<String>,
}

/// Doctor settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctorConfig {
    /// Check names to skip
    pub skip: Vec<String>,
}
