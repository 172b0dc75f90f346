//! Configuration
//!
//! A JSON file naming the registry and dataset files plus engine limits.
//! Relative paths resolve against the directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::errors::ShapeError;
use crate::observability::{log_event, Event, Logger, Severity};
use crate::registry::RelationRegistry;
use crate::store::MemoryStore;

/// Loader and configuration failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Reads and parses a JSON file
pub fn read_json(path: &Path) -> ConfigResult<Value> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Depth caps enforced by the compiler and projector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    /// Deepest projection spec accepted; a flat spec has depth 1
    pub max_spec_depth: usize,
    /// Deepest filter document accepted
    pub max_filter_depth: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_spec_depth: default_max_spec_depth(),
            max_filter_depth: default_max_filter_depth(),
        }
    }
}

/// Configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeConfig {
    /// Registry JSON file (required)
    pub registry_path: PathBuf,

    /// Dataset JSON file for the memory store (optional)
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,

    /// Maximum projection spec depth (optional, default 16)
    #[serde(default = "default_max_spec_depth")]
    pub max_spec_depth: usize,

    /// Maximum filter document depth (optional, default 32)
    #[serde(default = "default_max_filter_depth")]
    pub max_filter_depth: usize,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_spec_depth() -> usize {
    16
}
fn default_max_filter_depth() -> usize {
    32
}
fn default_log_level() -> String {
    "info".to_string()
}

impl ShapeConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let value = read_json(path)?;
        let mut config: ShapeConfig = serde_json::from_value(value).map_err(|source| {
            ConfigError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;

        log_event(
            Event::ConfigLoaded,
            &[
                ("log_level", config.log_level.as_str()),
                ("path", path.display().to_string().as_str()),
            ],
        );
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.registry_path.is_relative() {
            self.registry_path = base.join(&self.registry_path);
        }
        if let Some(ref dataset) = self.dataset_path {
            if dataset.is_relative() {
                self.dataset_path = Some(base.join(dataset));
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.registry_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("registry_path is empty".to_string()));
        }
        if self.max_spec_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_spec_depth must be greater than 0".to_string(),
            ));
        }
        if self.max_filter_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_filter_depth must be greater than 0".to_string(),
            ));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    /// Sets the logger threshold from `log_level`
    pub fn apply_logging(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }

    pub fn limits(&self) -> EngineLimits {
        EngineLimits {
            max_spec_depth: self.max_spec_depth,
            max_filter_depth: self.max_filter_depth,
        }
    }

    /// Loads and builds the registry file
    pub fn load_registry(&self) -> ConfigResult<RelationRegistry> {
        RelationRegistry::load(&self.registry_path)
    }

    /// Loads the dataset file, or an empty store when none is configured
    pub fn load_store(&self, registry: Arc<RelationRegistry>) -> ConfigResult<MemoryStore> {
        let Some(ref path) = self.dataset_path else {
            return Ok(MemoryStore::new(registry));
        };

        let dataset = read_json(path)?;
        let store = MemoryStore::from_json(registry, &dataset)?;

        let records: usize = store
            .registry()
            .type_names()
            .map(|name| store.count(name))
            .sum();
        log_event(
            Event::DatasetLoaded,
            &[
                ("path", path.display().to_string().as_str()),
                ("records", records.to_string().as_str()),
            ],
        );
        Ok(store)
    }
}
