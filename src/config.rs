//! Configuration
//!
//! Loaded from YAML; every field has a default so an empty document (or no
//! file at all) yields a working setup under the user's data directory.

use crate::dbpedia::{CachePolicy, ResourceOverrides, SparqlConfig, DEFAULT_DEPTH};
use crate::extract::{ExtractorConfig, ZeroCountPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid overrides file: {0}")]
    Overrides(String),
}

/// Data directory of the application (~/.local/share/collocate on Linux)
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"))
        .join("collocate")
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database: PathBuf,
    /// Directory of cached category graphs
    pub cache_dir: PathBuf,
    /// Directory imported documents are copied into
    pub documents_dir: PathBuf,
    /// Resource overrides YAML; the bundled table when unset
    pub overrides: Option<PathBuf>,
    /// Frozen classifier model (JSON)
    pub model: Option<PathBuf>,
    pub crawl_depth: usize,
    pub cache_policy: CachePolicy,
    pub zero_count_policy: ZeroCountPolicy,
    pub extractor: ExtractorConfig,
    pub sparql: SparqlConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_data_dir(default_data_dir())
    }
}

impl Config {
    /// Defaults rooted at `dir`
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            database: dir.join("collocate.db"),
            cache_dir: dir.join("graphs"),
            documents_dir: dir.join("documents"),
            overrides: None,
            model: None,
            crawl_depth: DEFAULT_DEPTH,
            cache_policy: CachePolicy::default(),
            zero_count_policy: ZeroCountPolicy::default(),
            extractor: ExtractorConfig::default(),
            sparql: SparqlConfig::default(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Load `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// The configured resource overrides, or the bundled ones
    pub fn resource_overrides(&self) -> Result<ResourceOverrides, ConfigError> {
        let overrides = match &self.overrides {
            Some(path) => ResourceOverrides::load(path),
            None => ResourceOverrides::bundled(),
        };
        overrides.map_err(|e| ConfigError::Overrides(e.to_string()))
    }
}
