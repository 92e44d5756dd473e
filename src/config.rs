//! Configuration System
//!
//! Handles loading configuration from an optional TOML file, with
//! per-field defaults. Environment variables and CLI flags override file
//! values (resolved in `main`).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no logs directory configured (set --logs-dir, LOGTAIL_LOGS_DIR, or logs_dir in the config file)")]
    MissingLogsDir,

    #[error("logs directory {0:?} does not exist or is not a directory")]
    NotADirectory(PathBuf),

    #[error("logs directory {path:?} is not readable: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Directory of log files to index and serve
    pub logs_dir: Option<PathBuf>,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub indexer: IndexerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Indexer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    /// Number of indexing workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Line-start offsets retained per file
    #[serde(default = "default_window_limit")]
    pub window_limit: usize,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_window_limit() -> usize {
    crate::index::WINDOW_LIMIT
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            window_limit: default_window_limit(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Resolved logs directory, after validating that it exists, is a
    /// directory, and is listable.
    pub fn validated_logs_dir(&self) -> Result<PathBuf, ConfigError> {
        let dir = self.logs_dir.clone().ok_or(ConfigError::MissingLogsDir)?;
        if !dir.is_dir() {
            return Err(ConfigError::NotADirectory(dir));
        }
        std::fs::read_dir(&dir).map_err(|e| ConfigError::Unreadable {
            path: dir.clone(),
            source: e,
        })?;
        Ok(dir)
    }
}
