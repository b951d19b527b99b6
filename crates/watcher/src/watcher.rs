//! Recursive watcher implementation
//!
//! The notify backends used here only watch single directories reliably, so
//! every directory below the root gets its own non-recursive watch. New
//! directories are registered as soon as their creation is reported.

use crate::{config::WatcherConfig, events};
use crate::events::{WatchEvent, WatchEventKind};
use fsync_core::error::{Error, Result};
use notify::{
    Config as NotifyConfig, Event as NotifyEvent, RecommendedWatcher, RecursiveMode,
    Watcher as NotifyWatcher,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// Messages delivered to the event loop
enum WatcherMessage {
    Notify(notify::Result<NotifyEvent>),
    Shutdown,
}

/// Handle used to end a running event loop from another thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: mpsc::Sender<WatcherMessage>,
}

impl ShutdownHandle {
    /// Ask the event loop to return after the notification it is handling
    pub fn shutdown(&self) {
        if self.tx.send(WatcherMessage::Shutdown).is_err() {
            debug!("Watcher already stopped, ignoring shutdown request");
        }
    }
}

impl std::fmt::Debug for WatcherMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notify(event) => f.debug_tuple("Notify").field(event).finish(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Watches a directory tree and reports every change to a callback
pub struct RecursiveWatcher {
    /// Configuration
    config: WatcherConfig,
    /// Active notify watcher
    watcher: RecommendedWatcher,
    /// Sender cloned into shutdown handles
    tx: mpsc::Sender<WatcherMessage>,
    /// Notifications and shutdown requests
    rx: mpsc::Receiver<WatcherMessage>,
    /// Root of the current watch, used to bound registration depth
    root: Option<PathBuf>,
    /// Directories with an active watch
    watched: HashSet<PathBuf>,
}

impl RecursiveWatcher {
    /// Create a new recursive watcher
    ///
    /// Failure to create the underlying OS watcher is fatal.
    pub fn new(config: WatcherConfig) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let notify_tx = tx.clone();

        // Unbounded: the OS callback must never block on a slow consumer
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<NotifyEvent>| {
                if notify_tx.send(WatcherMessage::Notify(res)).is_err() {
                    trace!("Watcher loop gone, dropping notification");
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|e| Error::watcher(format!("Failed to create watcher: {e}")))?;

        Ok(Self {
            config,
            watcher,
            tx,
            rx,
            root: None,
            watched: HashSet::new(),
        })
    }

    /// Get a handle that can stop [`RecursiveWatcher::watch`] from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.tx.clone(),
        }
    }

    /// Watch `root` and every directory below it, calling `on_event` once per change
    ///
    /// Blocks until shutdown is requested through a [`ShutdownHandle`]. The
    /// callback runs on this thread before the next notification is handled,
    /// so it must stay cheap.
    pub fn watch<F>(&mut self, root: impl AsRef<Path>, mut on_event: F) -> Result<()>
    where
        F: FnMut(WatchEvent),
    {
        let root = root.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&root).map_err(|e| Error::path(&root, e))?;
        if !metadata.is_dir() {
            return Err(Error::watcher(format!(
                "Watch root {} is not a directory",
                root.display()
            )));
        }

        self.root = Some(root.clone());
        let registered = self.add_recursive(&root);
        info!(
            root = %root.display(),
            directories = registered,
            "Initial registration complete"
        );

        loop {
            match self.rx.recv() {
                Ok(WatcherMessage::Notify(Ok(event))) => {
                    trace!("Received notify event: {:?}", event);
                    for watch_event in events::from_notify(event) {
                        self.dispatch(watch_event, &mut on_event);
                    }
                }
                Ok(WatcherMessage::Notify(Err(e))) => {
                    warn!(error = %e, "Watcher error");
                }
                Ok(WatcherMessage::Shutdown) => {
                    info!(root = %root.display(), "Watcher shutting down");
                    break;
                }
                // Unreachable while the watcher keeps its own sender
                Err(mpsc::RecvError) => {
                    debug!("Watcher event source closed");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Deliver one event and extend coverage when a directory appeared
    fn dispatch<F>(&mut self, event: WatchEvent, on_event: &mut F)
    where
        F: FnMut(WatchEvent),
    {
        let path = event.path.clone();
        let kind = event.kind;
        on_event(event);

        match kind {
            WatchEventKind::Created => self.register_created(&path),
            WatchEventKind::Removed => {
                self.forget(&path);
            }
            WatchEventKind::Renamed => {
                for dir in self.forget(&path) {
                    // The old name is gone; drop the OS watch so a new
                    // directory at this path gets a fresh registration
                    if let Err(e) = self.watcher.unwatch(&dir) {
                        trace!(path = %dir.display(), error = %e, "Watch already released");
                    }
                }
            }
            WatchEventKind::Modified | WatchEventKind::PermissionChanged => {}
        }
    }

    /// Register watches below a path reported as created, if it is a directory
    fn register_created(&mut self, path: &Path) {
        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => {
                info!(path = %path.display(), "New directory found, registering watches");
                self.add_recursive(path);
            }
            Ok(_) => {}
            Err(e) => {
                debug!(
                    path = %path.display(),
                    error = %e,
                    "Created path vanished before it could be inspected"
                );
            }
        }
    }

    /// Register a watch on `dir` and every directory below it
    ///
    /// Directories that cannot be read or watched are logged and skipped.
    /// Returns the number of newly watched directories.
    pub fn add_recursive(&mut self, dir: &Path) -> usize {
        let Some(max_depth) = self.remaining_depth(dir) else {
            debug!(
                path = %dir.display(),
                max_depth = self.config.max_depth,
                "Directory below depth limit, not watching"
            );
            return 0;
        };
        let mut added = 0;

        let walker = WalkDir::new(dir)
            .follow_links(self.config.follow_symlinks)
            .max_depth(max_depth);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    warn!(path = %path.display(), error = %e, "Cannot read directory, skipping");
                    continue;
                }
            };

            if entry.file_type().is_dir() && self.add_watch(entry.path()) {
                added += 1;
            }
        }

        added
    }

    /// Register a single non-recursive watch
    fn add_watch(&mut self, dir: &Path) -> bool {
        if self.watched.contains(dir) {
            trace!(path = %dir.display(), "Directory already watched");
            return false;
        }

        match self.watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!(path = %dir.display(), "Watching directory");
                self.watched.insert(dir.to_path_buf());
                true
            }
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Failed to watch directory, skipping");
                false
            }
        }
    }

    /// Depth budget left for a walk starting at `dir`
    ///
    /// `None` when `dir` itself lies deeper than `max_depth` below the root.
    fn remaining_depth(&self, dir: &Path) -> Option<usize> {
        let consumed = self
            .root
            .as_deref()
            .and_then(|root| dir.strip_prefix(root).ok())
            .map(|relative| relative.components().count())
            .unwrap_or(0);
        self.config.max_depth.checked_sub(consumed)
    }

    /// Drop `dir` and every watched directory below it from the watched set
    ///
    /// The OS releases watches on deleted directories by itself, but the
    /// set must forget them or a directory re-created at the same path would
    /// count as already watched. Returns the forgotten paths.
    fn forget(&mut self, dir: &Path) -> Vec<PathBuf> {
        let gone: Vec<PathBuf> = self
            .watched
            .iter()
            .filter(|watched| watched.starts_with(dir))
            .cloned()
            .collect();
        for path in &gone {
            self.watched.remove(path);
        }
        if !gone.is_empty() {
            debug!(path = %dir.display(), released = gone.len(), "Directory gone, releasing watches");
        }
        gone
    }

    /// Get the directories currently being watched, sorted
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<_> = self.watched.iter().cloned().collect();
        dirs.sort();
        dirs
    }

    /// Check if a directory has an active watch
    pub fn is_watching(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }
}

impl std::fmt::Debug for RecursiveWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveWatcher")
            .field("config", &self.config)
            .field("root", &self.root)
            .field("watched", &self.watched.len())
            .finish()
    }
}
