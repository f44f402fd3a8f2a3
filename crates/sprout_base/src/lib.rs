//! # Sprout Base
//!
//! Low-level systems utilities shared by the editor core. The centrepiece is
//! [`RwLock`], the cooperative lock guarding a document against concurrent
//! mutation from the UI thread and background workers (autosave, thumbnails).
//!
//! ## Lock Protocol
//!
//! 1. **Readers share** - any number of readers may hold the lock at once
//! 2. **Writers exclude** - a writer waits for every reader to leave
//! 3. **Writers re-enter** - the owning thread may nest write sections
//! 4. **Weak readers yield** - a background scan holding a weak lock is asked
//!    to back off when a writer shows up, instead of blocking it
//!
//! ## Example
//!
//! ```rust
//! use sprout_base::{LockResult, LockType, RwLock};
//!
//! let lock = RwLock::new();
//!
//! let read = lock.lock(LockType::Read, 0);
//! assert_eq!(read, LockResult::Ok);
//!
//! // A single reader may become the writer.
//! let write = lock.upgrade_to_write(0);
//! assert_eq!(write, LockResult::Ok);
//!
//! lock.downgrade_to_read(write);
//! lock.unlock(read);
//! assert!(!lock.is_write_locked());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod sync;

pub use config::LockConfig;
pub use error::{LockError, SyncResult};
pub use sync::{
    LockResult, LockType, ReadGuard, RwLock, UpgradeGuard, WeakLock, WeakLockGuard, WriteGuard,
};
