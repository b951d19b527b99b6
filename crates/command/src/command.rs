//! Commands built from watch events
//!
//! A command reacts to a change that already happened on disk. Executing it
//! records the change; undoing it records that compensation was requested.
//! Variants that perform real compensation plug in through [`Executable`].

use async_trait::async_trait;
use fsync_core::error::Result;
use fsync_watcher::{WatchEvent, WatchEventKind};
use std::path::{Path, PathBuf};
use strum::{AsRefStr, Display};
use tracing::{debug, info};

/// A unit of work the queue can run and the history can undo
#[async_trait]
pub trait Executable: Send + Sync + 'static {
    /// React to the change this command represents
    async fn execute(&self) -> Result<()>;

    /// Best-effort compensation, run synchronously by the caller
    fn undo(&self) -> Result<()>;

    /// Stable human readable label, fixed at construction
    fn describe(&self) -> &str;
}

/// Action a file command reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FileAction {
    CreateDir,
    CreateFile,
    Write,
    Remove,
    Rename,
    Chmod,
}

impl FileAction {
    fn verb(&self) -> &'static str {
        match self {
            Self::CreateDir => "create directory",
            Self::CreateFile => "create file",
            Self::Write => "modify file",
            Self::Remove => "remove",
            Self::Rename => "rename",
            Self::Chmod => "change permissions",
        }
    }
}

/// Command reacting to a change of one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCommand {
    action: FileAction,
    path: PathBuf,
    description: String,
}

impl FileCommand {
    /// Create a new file command
    pub fn new(action: FileAction, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let description = format!("{}: {}", action.verb(), path.display());
        Self {
            action,
            path,
            description,
        }
    }

    pub fn action(&self) -> FileAction {
        self.action
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn execute(&self) -> Result<()> {
        info!(
            action = %self.action,
            path = %self.path.display(),
            "Executing file command"
        );

        match self.action {
            FileAction::CreateDir => info!(path = %self.path.display(), "Directory created"),
            FileAction::CreateFile => info!(path = %self.path.display(), "File created"),
            FileAction::Write => info!(path = %self.path.display(), "File modified"),
            FileAction::Remove => info!(path = %self.path.display(), "File removed"),
            FileAction::Rename => info!(path = %self.path.display(), "File renamed"),
            FileAction::Chmod => info!(path = %self.path.display(), "Permissions changed"),
        }
        Ok(())
    }

    fn undo(&self) -> Result<()> {
        info!(
            action = %self.action,
            path = %self.path.display(),
            "Undo requested for file command"
        );
        Ok(())
    }
}

/// Every kind of command the pipeline produces
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Command {
    /// Reaction to a file system change
    File(FileCommand),
}

impl Command {
    /// Classify a watch event, inspecting the file system for creations
    ///
    /// Returns `None` when a created path is already gone.
    pub fn from_event(event: &WatchEvent) -> Option<Self> {
        let command = classify(event.kind, &event.path, TargetState::probe);
        if command.is_none() {
            debug!(
                path = %event.path.display(),
                kind = %event.kind,
                "Created path no longer exists, dropping event"
            );
        }
        command
    }
}

#[async_trait]
impl Executable for Command {
    async fn execute(&self) -> Result<()> {
        match self {
            Self::File(command) => command.execute(),
        }
    }

    fn undo(&self) -> Result<()> {
        match self {
            Self::File(command) => command.undo(),
        }
    }

    fn describe(&self) -> &str {
        match self {
            Self::File(command) => &command.description,
        }
    }
}

/// What a path turned out to be when it was inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Missing,
    File,
    Directory,
}

impl TargetState {
    /// Stat `path`; any failure counts as missing
    pub fn probe(path: &Path) -> Self {
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => Self::Directory,
            Ok(_) => Self::File,
            Err(_) => Self::Missing,
        }
    }
}

/// Map an event onto exactly one command, or `None` for a vanished creation
///
/// `target` is consulted only for `Created` events.
pub fn classify<F>(kind: WatchEventKind, path: &Path, target: F) -> Option<Command>
where
    F: FnOnce(&Path) -> TargetState,
{
    let action = match kind {
        WatchEventKind::Created => match target(path) {
            TargetState::Directory => FileAction::CreateDir,
            TargetState::File => FileAction::CreateFile,
            TargetState::Missing => return None,
        },
        WatchEventKind::Modified => FileAction::Write,
        WatchEventKind::Removed => FileAction::Remove,
        WatchEventKind::Renamed => FileAction::Rename,
        WatchEventKind::PermissionChanged => FileAction::Chmod,
    };
    Some(Command::File(FileCommand::new(action, path)))
}
