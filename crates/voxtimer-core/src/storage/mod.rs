mod config;
pub mod database;

pub use config::{Config, StorageConfig, TimersConfig};
pub use database::Database;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;
use crate::timer::Timer;

/// Returns `~/.config/voxtimer[-dev]/` based on VOXTIMER_ENV.
///
/// Set VOXTIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("VOXTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("voxtimer-dev")
    } else {
        base_dir.join("voxtimer")
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Durable home of the active-timer snapshot.
///
/// The whole set is written on every mutation; there are no partial updates.
pub trait SnapshotStore: Send {
    fn load(&self) -> Result<Vec<Timer>, StoreError>;
    fn save(&self, timers: &[Timer]) -> Result<(), StoreError>;
}

/// Snapshot kept in process memory.
///
/// Clones share the same slot, so a test can keep one handle and inspect what
/// the engine last wrote. `fail_writes` simulates an unwritable backend.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    slot: Arc<Mutex<Option<String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with a raw blob, e.g. to simulate a corrupt snapshot.
    pub fn with_raw(raw: &str) -> Self {
        let snap = Self::default();
        if let Ok(mut slot) = snap.slot.lock() {
            *slot = Some(raw.to_string());
        }
        snap
    }

    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SnapshotStore for MemorySnapshot {
    fn load(&self) -> Result<Vec<Timer>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Unavailable)?;
        match slot.as_deref() {
            Some(raw) => Ok(serde_json::from_str(raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, timers: &[Timer]) -> Result<(), StoreError> {
        if self.fail_writes.lock().map(|f| *f).unwrap_or(true) {
            return Err(StoreError::Unavailable);
        }
        let raw = serde_json::to_string(timers)?;
        let mut slot = self.slot.lock().map_err(|_| StoreError::Unavailable)?;
        *slot = Some(raw);
        Ok(())
    }
}
