//! Command manager: undo history plus the execution queue

use crate::command::{Command, Executable};
use crate::history::History;
use crate::queue::{Admission, CommandQueue, QueueStats};
use fsync_core::error::Result;
use fsync_core::Config;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info};

/// Owns the command queue and the history of requested commands
///
/// History entries are recorded before the queue sees them, so the history
/// also holds commands the queue dropped or has not executed yet. Undo works
/// on the history directly and is valid before and after [`stop`].
///
/// [`stop`]: CommandManager::stop
pub struct CommandManager<C: Executable = Command> {
    history: Mutex<History<C>>,
    queue: CommandQueue<C>,
}

impl<C: Executable> CommandManager<C> {
    /// Create a manager with a queue of `capacity` slots and `workers` workers
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(capacity: usize, workers: usize, history_limit: Option<usize>) -> Result<Self> {
        Ok(Self {
            history: Mutex::new(History::new(history_limit)),
            queue: CommandQueue::new(capacity, workers)?,
        })
    }

    /// Create a manager sized from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.queue.capacity,
            config.queue.workers,
            config.history.limit,
        )
    }

    fn history(&self) -> MutexGuard<'_, History<C>> {
        // A panic inside a push or pop cannot leave the deque half-updated
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a command and hand it to the queue for execution
    pub fn add_command(&self, command: C) -> Admission {
        let command = Arc::new(command);
        self.history().push(Arc::clone(&command));

        let admission = self.queue.enqueue(Arc::clone(&command));
        if admission.is_admitted() {
            info!(
                description = command.describe(),
                "Command queued for execution"
            );
        }
        admission
    }

    /// Undo the most recent command
    ///
    /// The entry leaves the history whether or not its undo succeeds. An
    /// empty history is a no-op.
    pub fn undo_last(&self) -> Result<()> {
        let Some(command) = self.history().pop() else {
            info!("No command to undo");
            return Ok(());
        };

        info!(description = command.describe(), "Undoing last command");
        command.undo().inspect_err(|e| {
            error!(
                description = command.describe(),
                error = %e,
                "Undo failed"
            );
        })
    }

    /// Undo every command, most recent first, then clear the history
    ///
    /// Every undo is attempted; the first error encountered is returned.
    pub fn undo_all(&self) -> Result<()> {
        let commands = self.history().take_all();
        info!(count = commands.len(), "Undoing all commands");

        let mut first_error = None;
        for command in commands.iter().rev() {
            info!(description = command.describe(), "Undoing command");
            if let Err(e) = command.undo() {
                error!(
                    description = command.describe(),
                    error = %e,
                    "Undo failed"
                );
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Stop the queue and wait for its workers to exit
    pub async fn stop(&self) {
        self.queue.stop().await;
        info!("Command manager stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.queue.is_stopped()
    }

    pub fn history_len(&self) -> usize {
        self.history().len()
    }

    /// Descriptions of the recorded commands, oldest first
    pub fn history_descriptions(&self) -> Vec<String> {
        self.history().descriptions()
    }

    /// Current queue counters
    pub fn stats(&self) -> QueueStats {
        self.queue.stats()
    }
}

impl<C: Executable> std::fmt::Debug for CommandManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("history", &*self.history())
            .field("queue", &self.queue)
            .finish()
    }
}
