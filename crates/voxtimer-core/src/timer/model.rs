use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::parse::describe_duration;

/// A single running (or overtime) timer.
///
/// This is the only entity written to the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timer {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    /// 1-based rank among timers of the same duration, fixed at creation.
    pub ordinal: u32,
    /// Requested length in seconds.
    pub duration: u64,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub announced: bool,
}

impl Timer {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// Seconds until expiry; negative once the timer is in overtime.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds()
    }

    /// Seconds past expiry, zero while still pending.
    pub fn overtime_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.expires_at).num_seconds().max(0)
    }

    /// How the timer is referred to in speech: its name, else its duration.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => describe_duration(self.duration),
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> TimerStatus {
        TimerStatus {
            id: self.id,
            label: self.label(),
            name: self.name.clone(),
            ordinal: self.ordinal,
            duration: self.duration,
            remaining_secs: self.remaining_secs(now),
            expired: self.is_expired(now),
        }
    }
}

/// When a timer of `duration` seconds started at `now` expires. `None` when
/// that instant cannot be represented.
pub fn expiry_after(now: DateTime<Utc>, duration: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(duration).ok()?;
    now.checked_add_signed(chrono::Duration::try_seconds(secs)?)
}

/// Point-in-time view of a timer, as reported by status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub id: u32,
    pub label: String,
    pub name: Option<String>,
    pub ordinal: u32,
    pub duration: u64,
    /// Negative while in overtime.
    pub remaining_secs: i64,
    pub expired: bool,
}
