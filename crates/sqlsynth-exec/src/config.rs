//! Executor configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Rows per transaction when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`ExecutorConfig`].
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// The chunk size is zero.
    #[error("chunk_size must be at least 1")]
    InvalidChunkSize,
}

/// Settings shared by the executors and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Rows committed per transaction by the batch executor.
    pub chunk_size: usize,
    /// Connection URL; also used to pick the dialect.
    pub database_url: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            database_url: None,
        }
    }
}

impl ExecutorConfig {
    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(())
    }

    /// Sets the connection URL.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }
}
