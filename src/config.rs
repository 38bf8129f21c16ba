//! Runtime configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/walletapps",
//!   "apps_dir": "apps",
//!   "fuel_per_call": 50000000,
//!   "max_memory_bytes": 33554432,
//!   "log_level": "info"
//! }
//! ```
//!
//! Only `data_dir` is required. A relative `apps_dir` is resolved against
//! `data_dir`. Items are stored under `<data_dir>/items`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;
use crate::scripting::RuntimeConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// App manifest directory (optional, default "apps")
    #[serde(default = "default_apps_dir")]
    pub apps_dir: String,

    /// Fuel granted to each script call (optional, default 50M)
    #[serde(default = "default_fuel_per_call")]
    pub fuel_per_call: u64,

    /// Memory ceiling per script call in bytes (optional, default 32MB)
    #[serde(default = "default_max_memory")]
    pub max_memory_bytes: usize,

    /// Minimum severity written to stderr (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_apps_dir() -> String {
    "apps".to_string()
}
fn default_fuel_per_call() -> u64 {
    50_000_000
}
fn default_max_memory() -> usize {
    33_554_432
} // 32MB
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Configuration with defaults for everything but `data_dir`
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            apps_dir: default_apps_dir(),
            fuel_per_call: default_fuel_per_call(),
            max_memory_bytes: default_max_memory(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        if self.fuel_per_call == 0 {
            return Err(ConfigError::Invalid("fuel_per_call must be > 0".into()));
        }

        if self.max_memory_bytes == 0 {
            return Err(ConfigError::Invalid("max_memory_bytes must be > 0".into()));
        }

        self.severity()?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Directory holding app manifests
    pub fn apps_path(&self) -> PathBuf {
        self.data_path().join(&self.apps_dir)
    }

    /// Directory holding item files
    pub fn items_path(&self) -> PathBuf {
        self.data_path().join("items")
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            fuel_per_call: self.fuel_per_call,
            max_memory_bytes: self.max_memory_bytes,
        }
    }

    pub fn severity(&self) -> Result<Severity, ConfigError> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }
}
