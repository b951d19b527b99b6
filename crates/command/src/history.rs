//! Ordered record of admitted commands

use crate::command::Executable;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Commands in arrival order, optionally bounded
///
/// Entries represent commands that were *requested*: a command is recorded
/// before the queue sees it and stays recorded if the queue drops it.
pub struct History<C> {
    entries: VecDeque<Arc<C>>,
    limit: Option<usize>,
}

impl<C: Executable> History<C> {
    /// Create an empty history; `None` means unbounded
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    /// Append a command, evicting the oldest entry when over the limit
    pub fn push(&mut self, command: Arc<C>) {
        self.entries.push_back(command);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                if let Some(evicted) = self.entries.pop_front() {
                    debug!(
                        description = evicted.describe(),
                        "History limit reached, evicting oldest command"
                    );
                }
            }
        }
    }

    /// Remove and return the most recent command
    pub fn pop(&mut self) -> Option<Arc<C>> {
        self.entries.pop_back()
    }

    /// Remove every command, oldest first
    pub fn take_all(&mut self) -> Vec<Arc<C>> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptions of all entries, oldest first
    pub fn descriptions(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|command| command.describe().to_string())
            .collect()
    }
}

impl<C> std::fmt::Debug for History<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("len", &self.entries.len())
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, FileAction, FileCommand};
    use pretty_assertions::assert_eq;

    fn file(path: &str) -> Arc<Command> {
        Arc::new(Command::File(FileCommand::new(FileAction::Write, path)))
    }

    #[test]
    fn test_push_pop_is_lifo() {
        let mut history = History::new(None);
        history.push(file("/a"));
        history.push(file("/b"));

        assert_eq!(history.len(), 2);
        assert_eq!(
            history.pop().map(|c| c.describe().to_string()),
            Some("modify file: /b".to_string())
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_pop_empty_is_none() {
        let mut history: History<Command> = History::new(None);
        assert!(history.pop().is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn test_limit_evicts_oldest() {
        let mut history = History::new(Some(2));
        history.push(file("/a"));
        history.push(file("/b"));
        history.push(file("/c"));

        assert_eq!(
            history.descriptions(),
            vec!["modify file: /b".to_string(), "modify file: /c".to_string()]
        );
    }

    #[test]
    fn test_take_all_empties_history() {
        let mut history = History::new(None);
        history.push(file("/a"));
        history.push(file("/b"));

        let taken = history.take_all();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].describe(), "modify file: /a");
        assert!(history.is_empty());
    }
}
