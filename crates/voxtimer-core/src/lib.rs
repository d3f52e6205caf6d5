//! # voxtimer Core Library
//!
//! Timer management for a voice assistant: any number of concurrent timers,
//! spoken references to them resolved against the active set, expiry
//! detection with escalating alerts, and a snapshot that survives restarts.
//!
//! ## Architecture
//!
//! - **Timer Store**: the active set, written to a snapshot on every change
//! - **Query Resolver**: maps "the second 5 minute timer" to timers, asking
//!   the user when the reference is ambiguous
//! - **Expiration Clock**: per-second tick driving display, beeps and
//!   announcements
//! - **Timer Engine**: the facade the intent layer calls
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: start/status/cancel/stop/mute
//! - [`Adapters`]: display, audio, speech and prompt boundaries
//! - [`Database`]: SQLite snapshot storage
//! - [`Config`]: TOML configuration

pub mod adapters;
pub mod error;
pub mod query;
pub mod storage;
pub mod timer;

pub use adapters::{Adapters, Announcement, AudioAdapter, ClipHandle, Dialog, DisplayAdapter, Prompter, Speaker};
pub use error::{ConfigError, CoreError, StoreError};
pub use query::{Query, QueryResolver, Resolution};
pub use storage::{Config, Database, MemorySnapshot, SnapshotStore};
pub use timer::{
    CancelOutcome, CancelRequest, StartOutcome, StartRequest, StatusOutcome, StatusRequest,
    StopOutcome, Timer, TimerEngine, TimerStatus,
};
