//! # Cooperative Reader/Writer Lock
//!
//! A lock with no data inside: it serializes *access* to a document that is
//! stored elsewhere. Every acquire returns a [`LockResult`] which the caller
//! hands back to the matching [`RwLock::unlock`] or
//! [`RwLock::downgrade_to_read`].
//!
//! ## Waiting
//!
//! Acquisition polls: it probes the state, sleeps up to
//! `poll_interval_ms`, and probes again until the timeout is spent. A failed
//! write probe is also the moment the weak lock gets asked to release, so the
//! loop must stay a loop (no condition variable).
//!
//! ## State
//!
//! ```text
//! write_owner: Option<ThreadId>   never Some while read_locks > 0
//! read_locks:  usize
//! weak_holder: Option<ThreadId>   at most one weak lock at a time
//! weak_flag:   AtomicU8           Unlocked | Locked | Unlocking
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::LockConfig;

/// Kind of access requested from [`RwLock::lock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockType {
    /// Shared access. Any number of readers may hold the lock together.
    Read,
    /// Exclusive access.
    Write,
}

/// Outcome of an acquire operation.
///
/// Must be passed back to [`RwLock::unlock`] (or
/// [`RwLock::downgrade_to_read`]); both are no-ops for [`LockResult::Fail`]
/// and [`LockResult::Reentrant`], so nested critical sections stay symmetric.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockResult {
    /// The lock could not be acquired before the timeout.
    Fail,
    /// The calling thread already owns the write lock; nothing was acquired.
    Reentrant,
    /// The lock was acquired and must be released.
    Ok,
}

impl LockResult {
    /// Returns true if the caller may proceed (acquired or re-entered).
    #[inline]
    #[must_use]
    pub const fn is_acquired(self) -> bool {
        !matches!(self, Self::Fail)
    }

    /// Returns true if this result owns something that must be released.
    #[inline]
    #[must_use]
    pub const fn needs_release(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// State of the weak lock slot.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum WeakLock {
    /// No weak lock is held.
    #[default]
    Unlocked = 0,
    /// A weak reader holds the lock.
    Locked = 1,
    /// A writer asked the weak reader to release as soon as possible.
    Unlocking = 2,
}

impl WeakLock {
    #[inline]
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Locked,
            2 => Self::Unlocking,
            _ => Self::Unlocked,
        }
    }
}

#[derive(Debug, Default)]
struct LockState {
    write_owner: Option<ThreadId>,
    read_locks: usize,
    weak_holder: Option<ThreadId>,
}

impl LockState {
    #[inline]
    fn is_written_by(&self, thread: ThreadId) -> bool {
        self.write_owner == Some(thread)
    }
}

/// Cooperative reader/writer lock with reentrant writes, upgrade/downgrade
/// and a preemptible weak lock.
///
/// There is no FIFO fairness: whichever waiter probes first after the lock
/// frees up wins.
///
/// ## Usage
///
/// ```rust
/// use sprout_base::{LockResult, LockType, RwLock};
///
/// let lock = RwLock::new();
///
/// let outer = lock.lock(LockType::Write, 0);
/// assert_eq!(outer, LockResult::Ok);
///
/// // Nested write section on the same thread.
/// let inner = lock.lock(LockType::Write, 0);
/// assert_eq!(inner, LockResult::Reentrant);
/// lock.unlock(inner);
/// assert!(lock.is_write_locked());
///
/// lock.unlock(outer);
/// assert!(!lock.is_write_locked());
/// ```
#[derive(Debug)]
pub struct RwLock {
    /// Counters, only touched while this mutex is held.
    state: Mutex<LockState>,
    /// The weak holder's view of its slot. Written under `state`.
    weak_flag: AtomicU8,
    /// Longest single sleep between two probes (ms, at least 1).
    poll_interval_ms: u32,
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RwLock {
    /// Default sleep between two acquisition probes.
    pub const DEFAULT_POLL_INTERVAL_MS: u32 = 100;

    /// Creates an unlocked lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            weak_flag: AtomicU8::new(WeakLock::Unlocked as u8),
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
        }
    }

    /// Creates an unlocked lock polling at the configured interval.
    #[must_use]
    pub fn from_config(config: &LockConfig) -> Self {
        Self::new().with_poll_interval(config.poll_interval_ms)
    }

    /// Sets the longest sleep between two probes.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms.max(1);
        self
    }

    /// Returns the longest sleep between two probes (ms).
    #[inline]
    #[must_use]
    pub const fn poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms
    }

    /// Returns whether any thread holds the write lock.
    #[inline]
    #[must_use]
    pub fn is_write_locked(&self) -> bool {
        self.state.lock().write_owner.is_some()
    }

    /// Returns the number of read locks currently held.
    #[inline]
    #[must_use]
    pub fn read_lock_count(&self) -> usize {
        self.state.lock().read_locks
    }

    /// Returns the state of the weak lock slot.
    ///
    /// A weak holder polls this to notice [`WeakLock::Unlocking`].
    #[inline]
    #[must_use]
    pub fn weak_lock_state(&self) -> WeakLock {
        WeakLock::from_u8(self.weak_flag.load(Ordering::Acquire))
    }

    /// Returns true if the caller could turn its read lock into a write lock
    /// right now, without actually trying.
    #[must_use]
    pub fn can_write_lock_from_read(&self) -> bool {
        let state = self.state.lock();
        // The writer itself can always "upgrade" (re-entrant).
        if state.is_written_by(thread::current().id()) {
            return true;
        }
        state.read_locks == 1 && state.write_owner.is_none()
    }

    /// Acquires the lock for reading or writing, waiting up to `timeout_ms`.
    ///
    /// A `timeout_ms` of zero probes exactly once.
    pub fn lock(&self, lock_type: LockType, timeout_ms: u32) -> LockResult {
        let current = thread::current().id();
        let result = self.poll(timeout_ms, |state| match lock_type {
            LockType::Read => Self::try_read(state, current),
            LockType::Write => self.try_write(state, current),
        });
        tracing::trace!(?lock_type, ?result, timeout_ms, "lock");
        result
    }

    /// Turns the caller's single read lock into the write lock.
    ///
    /// Returns [`LockResult::Reentrant`] if the caller already writes. Waits
    /// while other readers are present or a weak lock is held.
    pub fn upgrade_to_write(&self, timeout_ms: u32) -> LockResult {
        let current = thread::current().id();
        let result = self.poll(timeout_ms, |state| {
            if state.is_written_by(current) {
                return Some(LockResult::Reentrant);
            }
            if self.preempt_weak_lock(state) {
                return None;
            }
            if state.read_locks == 1 {
                debug_assert!(state.write_owner.is_none());
                state.read_locks = 0;
                state.write_owner = Some(current);
                return Some(LockResult::Ok);
            }
            None
        });
        tracing::trace!(?result, timeout_ms, "upgrade_to_write");
        result
    }

    /// Turns the write lock back into exactly one read lock.
    ///
    /// Only meaningful for the [`LockResult::Ok`] of a write acquisition or
    /// upgrade; a no-op otherwise.
    pub fn downgrade_to_read(&self, result: LockResult) {
        if !result.needs_release() {
            return;
        }

        let mut state = self.state.lock();
        debug_assert_eq!(state.read_locks, 0, "downgrade with readers present");
        debug_assert!(
            state.is_written_by(thread::current().id()),
            "downgrade from a thread that does not own the write lock"
        );
        state.write_owner = None;
        state.read_locks = 1;
        tracing::trace!("downgrade_to_read");
    }

    /// Releases what `result` acquired. A no-op for
    /// [`LockResult::Fail`] and [`LockResult::Reentrant`].
    pub fn unlock(&self, result: LockResult) {
        if !result.needs_release() {
            return;
        }

        let mut state = self.state.lock();
        if state.write_owner.is_some() {
            debug_assert!(
                state.is_written_by(thread::current().id()),
                "write unlock from a thread that does not own the lock"
            );
            state.write_owner = None;
        } else {
            debug_assert!(state.read_locks > 0, "unbalanced read unlock");
            state.read_locks = state.read_locks.saturating_sub(1);
        }
        tracing::trace!(read_locks = state.read_locks, "unlock");
    }

    /// Takes the weak lock.
    ///
    /// Fails if a weak lock is already held or a writer is active. On success
    /// the calling thread holds the slot, [`WeakLock::Locked`] until it calls
    /// [`RwLock::weak_unlock`].
    #[must_use]
    pub fn weak_lock(&self) -> bool {
        let mut state = self.state.lock();
        if state.weak_holder.is_some() || state.write_owner.is_some() {
            return false;
        }
        state.weak_holder = Some(thread::current().id());
        self.weak_flag.store(WeakLock::Locked as u8, Ordering::Release);
        tracing::trace!("weak_lock");
        true
    }

    /// Releases the weak lock held by the calling thread.
    ///
    /// Returns false, leaving the slot alone, if this thread is not the
    /// holder.
    pub fn weak_unlock(&self) -> bool {
        self.release_weak_lock(thread::current().id())
    }

    /// Releases the weak lock if `holder` owns it.
    pub(crate) fn release_weak_lock(&self, holder: ThreadId) -> bool {
        let mut state = self.state.lock();
        if state.weak_holder != Some(holder) {
            tracing::warn!(
                ?holder,
                current = ?state.weak_holder,
                "weak_unlock by a non-holder ignored"
            );
            return false;
        }
        debug_assert!(state.write_owner.is_none());
        state.weak_holder = None;
        self.weak_flag.store(WeakLock::Unlocked as u8, Ordering::Release);
        tracing::trace!("weak_unlock");
        true
    }

    fn try_read(state: &mut LockState, current: ThreadId) -> Option<LockResult> {
        match state.write_owner {
            None => {
                state.read_locks += 1;
                Some(LockResult::Ok)
            }
            Some(owner) if owner == current => Some(LockResult::Reentrant),
            Some(_) => None,
        }
    }

    fn try_write(&self, state: &mut LockState, current: ThreadId) -> Option<LockResult> {
        if state.is_written_by(current) {
            return Some(LockResult::Reentrant);
        }
        if self.preempt_weak_lock(state) {
            return None;
        }
        if state.read_locks == 0 && state.write_owner.is_none() {
            state.write_owner = Some(current);
            return Some(LockResult::Ok);
        }
        None
    }

    /// Asks an outstanding weak lock to release. Returns true while the weak
    /// lock still stands in the writer's way.
    fn preempt_weak_lock(&self, state: &LockState) -> bool {
        if state.weak_holder.is_none() {
            return false;
        }
        if self
            .weak_flag
            .compare_exchange(
                WeakLock::Locked as u8,
                WeakLock::Unlocking as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
        {
            tracing::debug!("writer requested weak lock release");
        }
        true
    }

    /// Runs `attempt` under the state mutex until it yields a result or the
    /// timeout is spent. The mutex is released before every sleep.
    fn poll<F>(&self, timeout_ms: u32, mut attempt: F) -> LockResult
    where
        F: FnMut(&mut LockState) -> Option<LockResult>,
    {
        let mut remaining = timeout_ms;
        loop {
            let outcome = {
                let mut state = self.state.lock();
                attempt(&mut state)
            };
            if let Some(result) = outcome {
                return result;
            }
            if remaining == 0 {
                return LockResult::Fail;
            }
            let delay = remaining.min(self.poll_interval_ms);
            remaining -= delay;
            thread::sleep(Duration::from_millis(u64::from(delay)));
        }
    }
}

impl Drop for RwLock {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }
        let state = self.state.get_mut();
        debug_assert!(state.write_owner.is_none(), "RwLock dropped while write locked");
        debug_assert_eq!(state.read_locks, 0, "RwLock dropped while read locked");
        debug_assert!(state.weak_holder.is_none(), "RwLock dropped while weak locked");
    }
}
