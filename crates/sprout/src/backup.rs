//! # Backup Worker
//!
//! Periodic background pass over the document (autosave, crash backup,
//! thumbnails) that never makes the UI thread wait.
//!
//! ## Protocol
//!
//! ```text
//!   every period_ms:
//!     try_weak_lock ──fail──> Busy            (a writer holds the document)
//!          │
//!          ok
//!          │
//!     loop: unlock_requested? ──yes──> Preempted (drop the weak lock at once)
//!           job.step()        ──done─> Completed
//! ```
//!
//! A writer arriving during a pass flips the weak lock to `Unlocking` and
//! keeps polling; the worker notices between two steps, abandons the pass and
//! releases the lock, and the writer gets in on its next poll.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use sprout_base::RwLock;

use crate::error::{BackupError, BackupResult};

/// Pass outcomes kept for the host before new ones are dropped.
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Configuration for the backup worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Run the worker at all.
    pub enabled: bool,
    /// Time between two passes (ms).
    pub period_ms: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_ms: 1_000,
        }
    }
}

/// Work done during one backup pass, one chunk at a time.
///
/// Chunks should be short: preemption is only checked between two of them.
pub trait BackupJob: Send + 'static {
    /// Called when a pass starts, after the weak lock was taken.
    fn begin(&mut self) {}

    /// Processes one chunk. Returns true when the pass is complete.
    fn step(&mut self) -> bool;
}

impl<F> BackupJob for F
where
    F: FnMut() -> bool + Send + 'static,
{
    fn step(&mut self) -> bool {
        self()
    }
}

/// Outcome of one backup pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackupEvent {
    /// The job finished its pass.
    Completed {
        /// Chunks processed.
        steps: usize,
    },
    /// A writer asked for the document; the pass was abandoned.
    Preempted {
        /// Chunks processed before backing off.
        steps: usize,
    },
    /// The weak lock was not available; the pass was skipped.
    Busy,
}

/// Shutdown signal shared with the worker thread.
struct Shutdown {
    stopped: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl Shutdown {
    fn new() -> Self {
        Self {
            stopped: AtomicBool::new(false),
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn signal(&self) {
        let _guard = self.mutex.lock();
        self.stopped.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    /// Sleeps for `period` unless stopped first. Returns true if stopped.
    fn wait(&self, period: Duration) -> bool {
        let mut guard = self.mutex.lock();
        if !self.is_stopped() {
            self.condvar.wait_for(&mut guard, period);
        }
        self.is_stopped()
    }
}

/// Background thread running a [`BackupJob`] every period under a weak lock.
pub struct BackupWorker {
    shutdown: Arc<Shutdown>,
    events: Receiver<BackupEvent>,
    handle: Option<JoinHandle<()>>,
}

impl BackupWorker {
    /// Starts the worker. The first pass runs one period after the start.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::InvalidConfig`] for a zero period and
    /// [`BackupError::Spawn`] if the thread cannot be created.
    pub fn spawn(
        lock: Arc<RwLock>,
        config: &BackupConfig,
        job: impl BackupJob,
    ) -> BackupResult<Self> {
        if config.period_ms == 0 {
            return Err(BackupError::InvalidConfig(
                "period_ms must be greater than 0".into(),
            ));
        }

        let shutdown = Arc::new(Shutdown::new());
        let (tx, events) = bounded(EVENT_QUEUE_CAPACITY);
        let period = Duration::from_millis(config.period_ms);

        let worker_shutdown = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("sprout-backup".into())
            .spawn(move || Self::worker_loop(&lock, job, &worker_shutdown, &tx, period))?;

        tracing::debug!(period_ms = config.period_ms, "backup worker started");

        Ok(Self {
            shutdown,
            events,
            handle: Some(handle),
        })
    }

    /// Starts the worker if the config enables it.
    ///
    /// # Errors
    ///
    /// See [`BackupWorker::spawn`].
    pub fn from_config(
        lock: Arc<RwLock>,
        config: &BackupConfig,
        job: impl BackupJob,
    ) -> BackupResult<Option<Self>> {
        if !config.enabled {
            tracing::debug!("backup worker disabled");
            return Ok(None);
        }
        Self::spawn(lock, config, job).map(Some)
    }

    /// Returns the channel on which pass outcomes are reported.
    ///
    /// Holds at most [`EVENT_QUEUE_CAPACITY`] events; while it is full, new
    /// outcomes are dropped.
    #[must_use]
    pub fn events(&self) -> &Receiver<BackupEvent> {
        &self.events
    }

    /// Returns true until [`BackupWorker::stop`] is called.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops the worker and waits for the thread to exit. A pass in
    /// progress is abandoned at the next chunk boundary.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.shutdown.signal();
        if handle.join().is_err() {
            tracing::warn!("backup worker panicked");
        }
        tracing::debug!("backup worker stopped");
    }

    fn worker_loop(
        lock: &RwLock,
        mut job: impl BackupJob,
        shutdown: &Shutdown,
        events: &Sender<BackupEvent>,
        period: Duration,
    ) {
        while !shutdown.wait(period) {
            let event = Self::run_pass(lock, &mut job, shutdown);
            // The worker keeps running until stopped, listener or not.
            if let Err(TrySendError::Full(event)) = events.try_send(event) {
                tracing::trace!(?event, "backup event queue full, event dropped");
            }
        }
    }

    fn run_pass(lock: &RwLock, job: &mut impl BackupJob, shutdown: &Shutdown) -> BackupEvent {
        let Some(guard) = lock.try_weak_lock() else {
            tracing::trace!("backup skipped, document busy");
            return BackupEvent::Busy;
        };

        job.begin();
        let mut steps = 0;
        loop {
            if guard.unlock_requested() || shutdown.is_stopped() {
                tracing::debug!(steps, "backup preempted");
                return BackupEvent::Preempted { steps };
            }
            steps += 1;
            if job.step() {
                tracing::trace!(steps, "backup completed");
                return BackupEvent::Completed { steps };
            }
        }
    }
}

impl Drop for BackupWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for BackupWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupWorker")
            .field("running", &self.is_running())
            .field("pending_events", &self.events.len())
            .finish()
    }
}
