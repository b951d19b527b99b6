//! Default values and functions for configuration

// Default constants
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";
pub(crate) const DEFAULT_LOG_FORMAT: &str = "console";
pub(crate) const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
pub(crate) const MAX_WORKERS: usize = 256;

pub(crate) fn default_queue_capacity() -> usize {
    100
}

pub(crate) fn default_queue_workers() -> usize {
    2
}

pub(crate) fn default_follow_symlinks() -> bool {
    false
}

pub(crate) fn default_max_depth() -> usize {
    64
}

pub(crate) fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
