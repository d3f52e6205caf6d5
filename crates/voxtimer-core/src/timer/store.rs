//! Authoritative collection of active timers.
//!
//! Every mutation writes the whole set to the [`SnapshotStore`] before
//! returning. A failed read or write degrades to in-memory operation and is
//! logged; it never reaches the caller.

use chrono::{DateTime, Utc};

use super::model::{expiry_after, Timer};
use crate::storage::SnapshotStore;

pub struct TimerStore {
    timers: Vec<Timer>,
    last_id: u32,
    snapshot: Box<dyn SnapshotStore>,
}

impl TimerStore {
    /// Load the last snapshot. Missing or corrupt data yields an empty set.
    pub fn load(snapshot: Box<dyn SnapshotStore>) -> Self {
        let timers = match snapshot.load() {
            Ok(timers) => timers,
            Err(e) => {
                tracing::warn!(error = %e, "persistence degraded: starting with no timers");
                Vec::new()
            }
        };
        let last_id = timers.iter().map(|t| t.id).max().unwrap_or(0);
        tracing::debug!(count = timers.len(), last_id, "timer store loaded");
        Self {
            timers,
            last_id,
            snapshot,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Active timers in creation order.
    pub fn all(&self) -> &[Timer] {
        &self.timers
    }

    pub fn get(&self, id: u32) -> Option<&Timer> {
        self.timers.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// The timer with the earliest expiry.
    pub fn next_due(&self) -> Option<&Timer> {
        self.timers.iter().min_by_key(|t| t.expires_at)
    }

    /// Id the next created timer will receive.
    pub fn next_id(&self) -> u32 {
        self.last_id + 1
    }

    /// Ordinal a new timer of `duration` seconds would receive.
    pub fn ordinal_for(&self, duration: u64) -> u32 {
        let same = self.timers.iter().filter(|t| t.duration == duration).count();
        same as u32 + 1
    }

    pub fn name_in_use(&self, name: &str) -> bool {
        self.timers
            .iter()
            .filter_map(|t| t.name.as_deref())
            .any(|n| n.eq_ignore_ascii_case(name.trim()))
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Build and insert a timer starting at `now`. A duration past the
    /// representable range expires at the end of time.
    pub fn create(&mut self, duration: u64, name: Option<String>, now: DateTime<Utc>) -> Timer {
        let timer = Timer {
            id: self.next_id(),
            name,
            ordinal: self.ordinal_for(duration),
            duration,
            expires_at: expiry_after(now, duration).unwrap_or(DateTime::<Utc>::MAX_UTC),
            announced: false,
        };
        self.add(timer.clone());
        timer
    }

    pub fn add(&mut self, timer: Timer) {
        if self.get(timer.id).is_some() {
            tracing::warn!(id = timer.id, "duplicate timer id ignored");
            return;
        }
        self.last_id = self.last_id.max(timer.id);
        self.timers.push(timer);
        self.persist();
    }

    /// Remove a timer by id. `None` means it was not in the set.
    pub fn remove(&mut self, id: u32) -> Option<Timer> {
        let idx = self.timers.iter().position(|t| t.id == id)?;
        let removed = self.timers.remove(idx);
        if self.timers.is_empty() {
            self.last_id = 0;
        }
        self.persist();
        Some(removed)
    }

    /// Flag a timer as announced. Returns false if it was already set or missing.
    pub fn mark_announced(&mut self, id: u32) -> bool {
        match self.timers.iter_mut().find(|t| t.id == id) {
            Some(t) if !t.announced => {
                t.announced = true;
                self.persist();
                true
            }
            _ => false,
        }
    }

    /// Drop the in-memory set without touching the snapshot.
    pub fn clear_memory(&mut self) {
        self.timers.clear();
        self.last_id = 0;
    }

    fn persist(&self) {
        if let Err(e) = self.snapshot.save(&self.timers) {
            tracing::warn!(error = %e, count = self.timers.len(), "persistence degraded: snapshot not written");
        }
    }
}
