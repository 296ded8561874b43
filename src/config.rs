//! Engine configuration loaded from TOML.
//!
//! Every section and field is optional. An empty document yields the
//! defaults: non-blocking machines and executors, binary snapshots in the
//! current directory.
//!
//! ```toml
//! [machine]
//! blocking_on_failure = false
//!
//! [executor]
//! blocking_on_failure = false
//! worker_name = "gameflow-worker"
//!
//! [persistence]
//! directory = "."
//! format = "binary"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config: {0}")]
    Parse(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub machine: MachineConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Abort every walk of the machine on the first action failure.
    #[serde(default)]
    pub blocking_on_failure: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Abort walks of this executor on the first action failure.
    #[serde(default)]
    pub blocking_on_failure: bool,
    /// Thread name of the background worker.
    #[serde(default = "default_worker_name")]
    pub worker_name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            blocking_on_failure: false,
            worker_name: default_worker_name(),
        }
    }
}

/// On-disk encoding of snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Binary,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default)]
    pub format: SnapshotFormat,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            format: SnapshotFormat::default(),
        }
    }
}

fn default_worker_name() -> String {
    "gameflow-worker".to_string()
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        Self::from_toml_str(&content)
    }
}
