//! Bounded multi-worker command queue
//!
//! The producer never blocks: when the buffer is full, or once the queue has
//! been stopped, a command is dropped and logged instead of admitted.

use crate::command::{Command, Executable};
use fsync_core::error::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Outcome of offering a command to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Buffered and waiting for a worker
    Admitted,
    /// Buffer was full, command dropped
    QueueFull,
    /// Queue is shutting down or stopped, command dropped
    Stopped,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Snapshot of queue counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Commands accepted into the buffer
    pub admitted: u64,
    /// Commands rejected because the buffer was full or the queue stopped
    pub dropped: u64,
    /// Commands whose execution succeeded
    pub executed: u64,
    /// Commands whose execution returned an error
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    admitted: AtomicU64,
    dropped: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> QueueStats {
        QueueStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

type SharedReceiver<C> = Arc<Mutex<mpsc::Receiver<Arc<C>>>>;

/// Fixed-capacity buffer drained by a fixed pool of workers
///
/// Must be created inside a Tokio runtime; workers are spawned immediately.
pub struct CommandQueue<C: Executable = Command> {
    tx: mpsc::Sender<Arc<C>>,
    rx: SharedReceiver<C>,
    capacity: usize,
    worker_count: usize,
    stopped: AtomicBool,
    cancel: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl<C: Executable> CommandQueue<C> {
    /// Create a queue and start `worker_count` workers
    pub fn new(capacity: usize, worker_count: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::invalid_input(
                "queue capacity must be greater than 0",
            ));
        }
        if worker_count == 0 {
            return Err(Error::invalid_input(
                "queue worker count must be greater than 0",
            ));
        }

        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(Mutex::new(rx));
        let cancel = CancellationToken::new();
        let counters = Arc::new(Counters::default());

        let workers = (0..worker_count)
            .map(|worker_id| {
                let span = info_span!("worker", worker_id);
                tokio::spawn(
                    run_worker(
                        Arc::clone(&rx),
                        cancel.clone(),
                        Arc::clone(&counters),
                    )
                    .instrument(span),
                )
            })
            .collect();

        info!(capacity, workers = worker_count, "Command queue started");

        Ok(Self {
            tx,
            rx,
            capacity,
            worker_count,
            stopped: AtomicBool::new(false),
            cancel,
            workers: Mutex::new(workers),
            counters,
        })
    }

    /// Offer a command without waiting
    ///
    /// A full or stopped queue drops the command and logs a warning.
    pub fn enqueue(&self, command: Arc<C>) -> Admission {
        if self.stopped.load(Ordering::Acquire) {
            return self.reject(&*command, Admission::Stopped);
        }

        match self.tx.try_send(command) {
            Ok(()) => {
                self.counters.admitted.fetch_add(1, Ordering::Relaxed);
                Admission::Admitted
            }
            Err(TrySendError::Full(command)) => self.reject(&*command, Admission::QueueFull),
            Err(TrySendError::Closed(command)) => self.reject(&*command, Admission::Stopped),
        }
    }

    fn reject(&self, command: &C, admission: Admission) -> Admission {
        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
        match admission {
            Admission::QueueFull => warn!(
                description = command.describe(),
                capacity = self.capacity,
                "Queue full, dropping command"
            ),
            _ => warn!(
                description = command.describe(),
                "Queue stopped, dropping command"
            ),
        }
        admission
    }

    /// Stop accepting commands and wait for every worker to exit
    ///
    /// Commands already running finish; commands still buffered are
    /// discarded. Calling this again waits for the same shutdown.
    pub async fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            info!("Stopping command queue");
        }
        self.cancel.cancel();

        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task ended abnormally");
            }
        }
        drop(workers);

        let mut rx = self.rx.lock().await;
        rx.close();
        let mut discarded = 0usize;
        while rx.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            info!(discarded, "Discarded buffered commands on shutdown");
        }
        debug!("Command queue stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Current counters
    pub fn stats(&self) -> QueueStats {
        self.counters.snapshot()
    }
}

impl<C: Executable> Drop for CommandQueue<C> {
    fn drop(&mut self) {
        // Workers must not outlive an unstopped queue
        self.cancel.cancel();
    }
}

impl<C: Executable> std::fmt::Debug for CommandQueue<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("capacity", &self.capacity)
            .field("worker_count", &self.worker_count)
            .field("stopped", &self.is_stopped())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Worker loop: take the next command, execute it, repeat until cancelled
async fn run_worker<C: Executable>(
    rx: SharedReceiver<C>,
    cancel: CancellationToken,
    counters: Arc<Counters>,
) {
    debug!("Worker started");

    loop {
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                command = rx.recv() => command,
            }
        };

        let Some(command) = next else {
            break;
        };

        debug!(description = command.describe(), "Executing command");
        match command.execute().await {
            Ok(()) => {
                counters.executed.fetch_add(1, Ordering::Relaxed);
                debug!(description = command.describe(), "Command completed");
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    description = command.describe(),
                    error = %e,
                    "Command execution failed"
                );
            }
        }
    }

    info!("Worker shutting down");
}
