//! # Document Synchronization
//!
//! ## The Problem
//!
//! ```text
//! UI thread:          WRITE the document (commands, tools)
//! Background threads: READ the document (autosave, thumbnails)
//!
//! Without a lock:     torn reads -> corrupt backups
//! With a plain mutex: a long backup scan freezes the UI
//! ```
//!
//! ## The Solution: Cooperative Locking
//!
//! ```text
//! Reader  ──lock(Read)──────────────> shares with other readers
//! Writer  ──lock(Write)─────────────> waits for readers (bounded by timeout)
//! Scanner ──weak_lock()─────────────> Locked
//! Writer  ──lock(Write)── fails ────> Locked -> Unlocking
//! Scanner ──sees Unlocking──────────> weak_unlock()
//! Writer  ──lock(Write)── retry ────> Ok
//! ```
//!
//! The raw protocol lives in [`RwLock`]; [`ReadGuard`], [`WriteGuard`],
//! [`UpgradeGuard`] and [`WeakLockGuard`] release it on drop.

mod guard;
mod rw_lock;

pub use guard::{ReadGuard, UpgradeGuard, WeakLockGuard, WriteGuard};
pub use rw_lock::{LockResult, LockType, RwLock, WeakLock};
