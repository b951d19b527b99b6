//! Configuration module for the fsync client
//!
//! This module provides configuration structures and loading mechanisms for
//! the watch-and-command pipeline. Configuration can be loaded from TOML files
//! and/or environment variables.

mod defaults;
mod loading;


use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use defaults::*;

/// Returns the path to the global configuration file
///
/// The global config is stored at `~/.fsync/config.toml`.
pub fn global_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".fsync").join("config.toml"))
}

/// Main configuration structure for the fsync client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory being synchronised
    #[serde(default)]
    pub sync: SyncConfig,

    /// Command queue sizing
    #[serde(default)]
    pub queue: QueueConfig,

    /// Undo history bounds
    #[serde(default)]
    pub history: HistoryConfig,

    /// File watcher configuration
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sync root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root directory to watch (absolute or relative to the working directory)
    #[serde(default)]
    pub root_dir: PathBuf,
}

/// Bounded command queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Number of commands that may wait for a worker before new ones are dropped
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    /// Number of long-lived workers executing commands
    #[serde(default = "default_queue_workers")]
    pub workers: usize,
}

/// Undo history configuration
///
/// With no `limit` the history grows without bound for the lifetime of the
/// process. With a limit, the oldest entries are evicted first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of entries retained for undo
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Configuration for directory registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Follow symbolic links to directories while registering watches
    #[serde(default = "default_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Maximum directory depth below the root that gets a watch
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

/// Encoding of emitted log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Console,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Line encoding for every sink
    #[serde(default)]
    pub format: LogFormat,

    /// Additional log file, appended to; parent directories are created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

// Default implementations

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            workers: default_queue_workers(),
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: default_follow_symlinks(),
            max_depth: default_max_depth(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Open the configured log file for appending
    ///
    /// Missing parent directories are created. Returns `None` when no file
    /// is configured.
    pub fn open_file(&self) -> Result<Option<File>> {
        let Some(path) = self.file.as_deref() else {
            return Ok(None);
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::path(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(format!("Failed to open log file {}", path.display()))?;
        Ok(Some(file))
    }
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sync.root_dir.as_os_str().is_empty() {
            return Err(Error::config(
                "sync.root_dir must be set to the directory to watch".to_string(),
            ));
        }

        if self.queue.capacity == 0 {
            return Err(Error::config(
                "queue.capacity must be greater than 0".to_string(),
            ));
        }

        if self.queue.workers == 0 {
            return Err(Error::config(
                "queue.workers must be greater than 0".to_string(),
            ));
        }
        if self.queue.workers > MAX_WORKERS {
            return Err(Error::config(format!(
                "queue.workers too large (max {MAX_WORKERS}, got {})",
                self.queue.workers
            )));
        }

        if self.history.limit == Some(0) {
            return Err(Error::config(
                "history.limit must be greater than 0 when set".to_string(),
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::config(format!(
                "Invalid log level '{}'. Must be one of: {:?}",
                self.logging.level, VALID_LOG_LEVELS
            )));
        }

        if self
            .logging
            .file
            .as_ref()
            .is_some_and(|file| file.as_os_str().is_empty())
        {
            return Err(Error::config(
                "logging.file must not be empty when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Checks that the sync root exists and is a directory
    ///
    /// A missing or unreadable root is fatal at startup and is never retried.
    pub fn validate_root(&self) -> Result<&Path> {
        let root = self.sync.root_dir.as_path();
        let metadata = std::fs::metadata(root).map_err(|e| Error::path(root, e))?;
        if !metadata.is_dir() {
            return Err(Error::config(format!(
                "sync.root_dir {} is not a directory",
                root.display()
            )));
        }
        Ok(root)
    }

    /// Serializes the configuration to a TOML string
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {e}")))
    }
}
