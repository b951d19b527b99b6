//! Configuration types for the recursive watcher

use serde::{Deserialize, Serialize};

/// Immutable configuration for the recursive watcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Whether to follow symbolic links to directories (default: false)
    pub follow_symlinks: bool,
    /// Maximum depth below the root that receives a watch (default: 64)
    pub max_depth: usize,
}

impl WatcherConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from builder
    pub fn builder() -> WatcherConfigBuilder {
        WatcherConfigBuilder::default()
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            max_depth: 64,
        }
    }
}

impl From<&fsync_core::WatcherConfig> for WatcherConfig {
    fn from(config: &fsync_core::WatcherConfig) -> Self {
        Self {
            follow_symlinks: config.follow_symlinks,
            max_depth: config.max_depth,
        }
    }
}

/// Builder for WatcherConfig
#[derive(Debug, Default)]
pub struct WatcherConfigBuilder {
    config: WatcherConfig,
}

impl WatcherConfigBuilder {
    /// Set whether to follow symlinks
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.follow_symlinks = follow;
        self
    }

    /// Set maximum registration depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Build the configuration
    pub fn build(self) -> WatcherConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_config_builder() {
        let config = WatcherConfig::builder()
            .follow_symlinks(true)
            .max_depth(3)
            .build();

        assert!(config.follow_symlinks);
        assert_eq!(config.max_depth, 3);
    }

    #[test]
    fn test_from_core_config() {
        let core = fsync_core::WatcherConfig {
            follow_symlinks: true,
            max_depth: 5,
        };
        let config = WatcherConfig::from(&core);
        assert_eq!(
            config,
            WatcherConfig {
                follow_symlinks: true,
                max_depth: 5
            }
        );
    }
}
