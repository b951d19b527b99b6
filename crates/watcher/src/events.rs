//! Watch event types and the mapping from raw notify events
//!
//! Every raw notification is reduced to one [`WatchEvent`] per affected
//! path. Notifications that carry no mutation (access, unknown) are dropped.

use notify::event::{EventKind, ModifyKind, RenameMode};
use std::path::{Path, PathBuf};
use strum::{AsRefStr, Display};

/// Kind of file system change observed under the sync root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum WatchEventKind {
    /// A file or directory appeared
    Created,
    /// File contents changed
    Modified,
    /// A file or directory disappeared
    Removed,
    /// A file or directory was renamed away from this path
    Renamed,
    /// Permissions or other metadata changed
    PermissionChanged,
}

/// A single change notification for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path the change refers to
    pub path: PathBuf,
    /// What happened to it
    pub kind: WatchEventKind,
}

impl WatchEvent {
    /// Create a new watch event
    pub fn new(path: impl Into<PathBuf>, kind: WatchEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Get the path associated with this event
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if this event reports a newly appeared path
    pub fn is_created(&self) -> bool {
        self.kind == WatchEventKind::Created
    }
}

/// Map a notify event kind onto the kinds the pipeline understands
///
/// Inotify reports a rename as `From`, `To` and then `Both` for the same move.
/// `From` is the rename of the old path, `To` is the arrival of the new path,
/// and `Both` repeats information already delivered.
pub(crate) fn map_kind(kind: &EventKind) -> Option<WatchEventKind> {
    match kind {
        EventKind::Create(_) => Some(WatchEventKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(WatchEventKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => Some(WatchEventKind::Renamed),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(WatchEventKind::PermissionChanged),
        EventKind::Modify(_) => Some(WatchEventKind::Modified),
        EventKind::Remove(_) => Some(WatchEventKind::Removed),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

/// Convert a raw notify event into zero or more watch events
pub(crate) fn from_notify(event: notify::Event) -> Vec<WatchEvent> {
    match map_kind(&event.kind) {
        Some(kind) => event
            .paths
            .into_iter()
            .map(|path| WatchEvent::new(path, kind))
            .collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_kind_covers_mutations() {
        assert_eq!(
            map_kind(&EventKind::Create(CreateKind::Folder)),
            Some(WatchEventKind::Created)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(WatchEventKind::Modified)
        );
        assert_eq!(
            map_kind(&EventKind::Remove(RemoveKind::File)),
            Some(WatchEventKind::Removed)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::From))),
            Some(WatchEventKind::Renamed)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Metadata(
                MetadataKind::Permissions
            ))),
            Some(WatchEventKind::PermissionChanged)
        );
    }

    #[test]
    fn test_rename_target_is_a_creation() {
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::To))),
            Some(WatchEventKind::Created)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Name(RenameMode::Both))),
            None
        );
    }

    #[test]
    fn test_non_mutations_are_dropped() {
        assert_eq!(map_kind(&EventKind::Access(AccessKind::Any)), None);
        assert_eq!(map_kind(&EventKind::Any), None);
        assert_eq!(map_kind(&EventKind::Other), None);
    }

    #[test]
    fn test_from_notify_emits_one_event_per_path() {
        let event = notify::Event::new(EventKind::Remove(RemoveKind::Any))
            .add_path(PathBuf::from("/root/a"))
            .add_path(PathBuf::from("/root/b"));

        let events = from_notify(event);
        assert_eq!(
            events,
            vec![
                WatchEvent::new("/root/a", WatchEventKind::Removed),
                WatchEvent::new("/root/b", WatchEventKind::Removed),
            ]
        );
    }

    #[test]
    fn test_kind_renders_snake_case() {
        assert_eq!(WatchEventKind::PermissionChanged.to_string(), "permission_changed");
        assert_eq!(WatchEventKind::Created.as_ref(), "created");
    }
}
