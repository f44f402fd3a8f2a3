//! # Sprout
//!
//! Editor core for pixel-art animation: the cooperative document lock, the
//! tag-aware playback state machine, the application config, and the
//! background backup worker that reads the document without ever blocking a
//! writer.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐  write   ┌──────────────────┐  weak lock  ┌──────────────┐
//! │   UI thread   │ ───────> │  RwLock (doc)    │ <────────── │ BackupWorker │
//! │  (commands)   │          └──────────────────┘             └──────────────┘
//! │               │  next_frame  ┌──────────┐
//! │               │ ───────────> │ Playback │  reads Sprite (tags, frames)
//! └───────────────┘              └──────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sprout::{BackupEvent, BackupWorker, Config, LockType, RwLock};
//!
//! let config = Config::from_toml_str("[backup]\nperiod_ms = 10\n").unwrap();
//! let lock = Arc::new(RwLock::from_config(&config.lock));
//!
//! let mut worker = BackupWorker::spawn(Arc::clone(&lock), &config.backup, || true).unwrap();
//! let event = worker.events().recv().unwrap();
//! assert!(matches!(event, BackupEvent::Completed { .. } | BackupEvent::Busy));
//!
//! let write = lock.lock(LockType::Write, config.lock.write_timeout_ms);
//! assert!(write.is_acquired());
//! lock.unlock(write);
//! worker.stop();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backup;
pub mod config;
pub mod error;

pub use backup::{BackupConfig, BackupEvent, BackupJob, BackupWorker, EVENT_QUEUE_CAPACITY};
pub use config::Config;
pub use error::{BackupError, BackupResult, ConfigError, ConfigResult};

pub use sprout_base::{
    LockConfig, LockError, LockResult, LockType, ReadGuard, RwLock, SyncResult, UpgradeGuard,
    WeakLock, WeakLockGuard, WriteGuard,
};
pub use sprout_doc::{
    AniDir, DocError, DocResult, Frame, PlayMode, Playback, PlaybackConfig, Sprite, Tag, TagId,
    Timeline,
};
