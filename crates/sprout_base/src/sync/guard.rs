//! # Scoped Lock Guards
//!
//! RAII wrappers over the raw [`RwLock`] protocol. Each guard carries the
//! [`LockResult`] it was acquired with, so a guard obtained re-entrantly
//! releases nothing on drop.
//!
//! ## Thread Safety
//!
//! - `ReadGuard`: shared access (many allowed)
//! - `WriteGuard`: exclusive access (one writer, possibly nested)
//! - `UpgradeGuard`: temporary write access borrowed from a `ReadGuard`
//! - `WeakLockGuard`: advisory access that a writer may ask to give up

use std::thread::{self, ThreadId};

use super::rw_lock::{LockResult, LockType, RwLock, WeakLock};
use crate::error::{LockError, SyncResult};

impl RwLock {
    /// Acquires a scoped read lock.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::ReadTimeout`] if a writer held the lock for the
    /// whole timeout.
    pub fn read(&self, timeout_ms: u32) -> SyncResult<ReadGuard<'_>> {
        match self.lock(LockType::Read, timeout_ms) {
            LockResult::Fail => Err(LockError::ReadTimeout { timeout_ms }),
            result => Ok(ReadGuard { lock: self, result }),
        }
    }

    /// Acquires a scoped write lock.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::WriteTimeout`] if readers, another writer or a
    /// weak lock kept the lock busy for the whole timeout.
    pub fn write(&self, timeout_ms: u32) -> SyncResult<WriteGuard<'_>> {
        match self.lock(LockType::Write, timeout_ms) {
            LockResult::Fail => Err(LockError::WriteTimeout { timeout_ms }),
            result => Ok(WriteGuard { lock: self, result }),
        }
    }

    /// Takes the weak lock, if it is free and nobody writes.
    #[must_use]
    pub fn try_weak_lock(&self) -> Option<WeakLockGuard<'_>> {
        self.weak_lock().then(|| WeakLockGuard {
            lock: self,
            holder: thread::current().id(),
        })
    }
}

/// Shared access to the guarded document. Unlocks on drop.
#[derive(Debug)]
pub struct ReadGuard<'a> {
    lock: &'a RwLock,
    result: LockResult,
}

impl ReadGuard<'_> {
    /// Returns how this guard was acquired.
    #[inline]
    #[must_use]
    pub const fn result(&self) -> LockResult {
        self.result
    }

    /// Returns true if the thread was already writing when this guard was
    /// taken.
    #[inline]
    #[must_use]
    pub const fn is_reentrant(&self) -> bool {
        matches!(self.result, LockResult::Reentrant)
    }

    /// Temporarily turns this read lock into the write lock. Dropping the
    /// returned guard downgrades back to reading.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::UpgradeTimeout`] if other readers (or a weak
    /// lock) stayed for the whole timeout.
    pub fn upgrade(&mut self, timeout_ms: u32) -> SyncResult<UpgradeGuard<'_>> {
        match self.lock.upgrade_to_write(timeout_ms) {
            LockResult::Fail => Err(LockError::UpgradeTimeout { timeout_ms }),
            result => Ok(UpgradeGuard {
                lock: self.lock,
                result,
            }),
        }
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock(self.result);
    }
}

/// Exclusive access to the guarded document. Unlocks on drop.
#[derive(Debug)]
pub struct WriteGuard<'a> {
    lock: &'a RwLock,
    result: LockResult,
}

impl<'a> WriteGuard<'a> {
    /// Returns how this guard was acquired.
    #[inline]
    #[must_use]
    pub const fn result(&self) -> LockResult {
        self.result
    }

    /// Returns true if this is a nested write section.
    #[inline]
    #[must_use]
    pub const fn is_reentrant(&self) -> bool {
        matches!(self.result, LockResult::Reentrant)
    }

    /// Keeps reading after the write section without letting a writer in
    /// between.
    #[must_use]
    pub fn downgrade(self) -> ReadGuard<'a> {
        let lock = self.lock;
        let result = self.result;
        std::mem::forget(self);

        lock.downgrade_to_read(result);
        ReadGuard { lock, result }
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock(self.result);
    }
}

/// Write access borrowed from a [`ReadGuard`]. Downgrades on drop.
#[derive(Debug)]
pub struct UpgradeGuard<'g> {
    lock: &'g RwLock,
    result: LockResult,
}

impl UpgradeGuard<'_> {
    /// Returns how the upgrade was obtained.
    #[inline]
    #[must_use]
    pub const fn result(&self) -> LockResult {
        self.result
    }
}

impl Drop for UpgradeGuard<'_> {
    fn drop(&mut self) {
        self.lock.downgrade_to_read(self.result);
    }
}

/// Holder side of the weak lock. Releases it on drop.
///
/// Long-running scans poll [`WeakLockGuard::unlock_requested`] and bail out
/// when it turns true.
#[derive(Debug)]
pub struct WeakLockGuard<'a> {
    lock: &'a RwLock,
    /// Thread that took the lock; the release is made on its behalf even if
    /// the guard is dropped elsewhere.
    holder: ThreadId,
}

impl WeakLockGuard<'_> {
    /// Returns the current state of the slot.
    #[inline]
    #[must_use]
    pub fn state(&self) -> WeakLock {
        self.lock.weak_lock_state()
    }

    /// Returns true once a writer asked this holder to give the lock back.
    #[inline]
    #[must_use]
    pub fn unlock_requested(&self) -> bool {
        self.state() == WeakLock::Unlocking
    }
}

impl Drop for WeakLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_weak_lock(self.holder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_guard_releases() {
        let lock = RwLock::new();
        {
            let guard = lock.read(0).unwrap();
            assert_eq!(guard.result(), LockResult::Ok);
            assert_eq!(lock.read_lock_count(), 1);
        }
        assert_eq!(lock.read_lock_count(), 0);
    }

    #[test]
    fn test_write_guard_blocks_readers() {
        let lock = RwLock::new();
        let writer = lock.write(0).unwrap();

        // Same thread: re-entrant read, nothing acquired.
        let nested = lock.read(0).unwrap();
        assert!(nested.is_reentrant());
        drop(nested);
        assert!(lock.is_write_locked());

        drop(writer);
        assert!(!lock.is_write_locked());
    }

    #[test]
    fn test_nested_write_guards() {
        let lock = RwLock::new();
        let outer = lock.write(0).unwrap();
        let inner = lock.write(0).unwrap();
        assert!(!outer.is_reentrant());
        assert!(inner.is_reentrant());

        drop(inner);
        assert!(lock.is_write_locked());
        drop(outer);
        assert!(!lock.is_write_locked());
    }

    #[test]
    fn test_write_timeout_error() {
        let lock = RwLock::new();
        let _reader = lock.read(0).unwrap();

        let err = lock.write(0).unwrap_err();
        assert_eq!(err, LockError::WriteTimeout { timeout_ms: 0 });
    }

    #[test]
    fn test_upgrade_guard_downgrades_on_drop() {
        let lock = RwLock::new();
        let mut reader = lock.read(0).unwrap();
        {
            let upgrade = reader.upgrade(0).unwrap();
            assert_eq!(upgrade.result(), LockResult::Ok);
            assert!(lock.is_write_locked());
        }
        assert!(!lock.is_write_locked());
        assert_eq!(lock.read_lock_count(), 1);

        drop(reader);
        assert_eq!(lock.read_lock_count(), 0);
    }

    #[test]
    fn test_upgrade_error_with_other_reader() {
        let lock = RwLock::new();
        let mut reader = lock.read(0).unwrap();
        let _other = lock.read(0).unwrap();

        let err = reader.upgrade(0).unwrap_err();
        assert_eq!(err, LockError::UpgradeTimeout { timeout_ms: 0 });
    }

    #[test]
    fn test_write_guard_downgrade() {
        let lock = RwLock::new();
        let writer = lock.write(0).unwrap();

        let reader = writer.downgrade();
        assert!(!lock.is_write_locked());
        assert_eq!(lock.read_lock_count(), 1);

        // Other readers can join now, writers cannot.
        let other = lock.read(0).unwrap();
        assert!(lock.write(0).is_err());

        drop(other);
        drop(reader);
        assert_eq!(lock.read_lock_count(), 0);
    }

    #[test]
    fn test_weak_lock_guard() {
        let lock = RwLock::new();
        {
            let weak = lock.try_weak_lock().unwrap();
            assert_eq!(weak.state(), WeakLock::Locked);
            assert!(lock.try_weak_lock().is_none());

            assert!(lock.write(0).is_err());
            assert!(weak.unlock_requested());
        }
        assert_eq!(lock.weak_lock_state(), WeakLock::Unlocked);
        assert!(lock.write(0).is_ok());
    }

    #[test]
    fn test_weak_lock_guard_released_from_other_thread() {
        let lock = RwLock::new();
        let weak = lock.try_weak_lock().unwrap();

        std::thread::scope(|s| {
            s.spawn(move || drop(weak));
        });
        assert_eq!(lock.weak_lock_state(), WeakLock::Unlocked);
        assert!(lock.try_weak_lock().is_some());
    }
}
