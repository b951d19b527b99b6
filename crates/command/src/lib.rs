#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Event-to-command pipeline
//!
//! Each [`WatchEvent`](fsync_watcher::WatchEvent) is classified into a
//! [`Command`], recorded in an undo history and handed to a bounded pool of
//! workers for execution:
//!
//! - [`CommandQueue`]: fixed capacity, fixed workers, drops when saturated
//! - [`CommandManager`]: owns the queue and the history, coordinates shutdown
//!
//! # Example
//!
//! ```no_run
//! use fsync_command::{Command, CommandManager};
//! use fsync_watcher::{WatchEvent, WatchEventKind};
//!
//! # async fn example() -> fsync_core::Result<()> {
//! let manager: CommandManager = CommandManager::new(100, 2, None)?;
//!
//! let event = WatchEvent::new("/srv/share/notes.txt", WatchEventKind::Modified);
//! if let Some(command) = Command::from_event(&event) {
//!     manager.add_command(command);
//! }
//!
//! manager.undo_last()?;
//! manager.stop().await;
//! # Ok(())
//! # }
//! ```

mod command;
mod history;
mod manager;
mod queue;

pub use command::{classify, Command, Executable, FileAction, FileCommand, TargetState};
pub use history::History;
pub use manager::CommandManager;
pub use queue::{Admission, CommandQueue, QueueStats};
