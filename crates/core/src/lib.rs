//! Core types for the fsync client
//!
//! This crate provides the foundations shared by the watcher, the command
//! pipeline and the CLI:
//!
//! - **Configuration**: sync root, queue sizing, history bounds, logging
//! - **Error handling**: unified error type and `Result` alias
//!

#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod error;

// Re-export main types for convenience
pub use config::{
    Config, HistoryConfig, LogFormat, LoggingConfig, QueueConfig, SyncConfig, WatcherConfig,
};
pub use error::{Error, Result, ResultExt};

