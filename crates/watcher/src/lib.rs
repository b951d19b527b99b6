#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Recursive file system watching for the sync root
//!
//! This crate registers a watch on every directory below a root, extends
//! coverage to directories created while running, and delivers a typed
//! stream of [`WatchEvent`]s to a callback on the watcher's own thread.
//!
//! # Example
//!
//! ```no_run
//! use fsync_watcher::{RecursiveWatcher, WatcherConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut watcher = RecursiveWatcher::new(WatcherConfig::default())?;
//! let shutdown = watcher.shutdown_handle();
//!
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(5));
//!     shutdown.shutdown();
//! });
//!
//! watcher.watch("/path/to/share", |event| {
//!     println!("{:?} {}", event.kind, event.path.display());
//! })?;
//! # Ok(())
//! # }
//! ```

// Private implementation modules
mod config;
mod events;
mod watcher;

// Public exports - minimal API surface
pub use config::{WatcherConfig, WatcherConfigBuilder};
pub use events::{WatchEvent, WatchEventKind};
pub use watcher::{RecursiveWatcher, ShutdownHandle};

