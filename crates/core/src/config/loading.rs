//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;
use tracing::debug;

use super::defaults::*;
use super::{global_config_path, Config};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

impl Config {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `FSYNC_` and use double underscores
    /// for nested values. For example:
    /// - `FSYNC_SYNC__ROOT_DIR=/srv/share`
    /// - `FSYNC_QUEUE__WORKERS=4`
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // config crate doesn't apply serde defaults for keys missing from every source
        let builder = set_config_default(
            builder,
            "queue.capacity",
            default_queue_capacity() as i64,
        )?;
        let builder =
            set_config_default(builder, "queue.workers", default_queue_workers() as i64)?;
        let builder = set_config_default(
            builder,
            "watcher.follow_symlinks",
            default_follow_symlinks(),
        )?;
        let builder =
            set_config_default(builder, "watcher.max_depth", default_max_depth() as i64)?;
        let builder = set_config_default(builder, "logging.level", default_log_level())?;
        let mut builder = set_config_default(builder, "logging.format", DEFAULT_LOG_FORMAT)?;

        // Add the config file if it exists
        if path.exists() {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path));
        } else {
            debug!(
                "No configuration file at {}, using defaults and environment",
                path.display()
            );
        }

        // Add environment variables with FSYNC_ prefix
        builder = builder.add_source(
            Environment::with_prefix("FSYNC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Creates a config from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from a single file
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (~/.fsync/config.toml or custom --config path)
    /// 3. Environment variables (FSYNC_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => global_config_path()?,
        };
        Self::from_file(&path)
    }
}
