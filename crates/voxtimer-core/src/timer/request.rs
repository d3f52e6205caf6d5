//! Typed requests from the intent layer and the outcomes handed back.
//!
//! Every slot is optional; an utterance alone is always enough to act on.

use serde::{Deserialize, Serialize};

use super::model::{Timer, TimerStatus};
use crate::query::parse::{extract_duration, extract_label, normalize_name};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub utterance: Option<String>,
    /// Pre-extracted duration in seconds.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    /// Skip the "did you mean an alarm?" check for very long timers.
    #[serde(default)]
    pub confirm_long: bool,
}

impl StartRequest {
    pub fn from_utterance(utterance: impl Into<String>) -> Self {
        Self {
            utterance: Some(utterance.into()),
            ..Self::default()
        }
    }

    pub fn with_duration(duration: u64, name: Option<&str>) -> Self {
        Self {
            duration: Some(duration),
            name: name.map(str::to_string),
            ..Self::default()
        }
    }

    /// Duration from the slot, else from the utterance.
    pub fn resolved_duration(&self) -> Option<u64> {
        self.duration.or_else(|| {
            self.utterance
                .as_deref()
                .and_then(extract_duration)
                .map(|m| m.seconds)
        })
    }

    /// Name from the slot, else a "called ..." phrase in the utterance.
    pub fn resolved_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().and_then(normalize_name) {
            return Some(name);
        }
        let utterance = self.utterance.as_deref()?;
        match extract_duration(utterance) {
            Some(m) => extract_label(&m.remainder),
            None => extract_label(utterance),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub utterance: Option<String>,
    #[serde(default)]
    pub all: bool,
}

impl StatusRequest {
    pub fn from_utterance(utterance: impl Into<String>) -> Self {
        Self {
            utterance: Some(utterance.into()),
            all: false,
        }
    }

    pub fn all() -> Self {
        Self {
            utterance: None,
            all: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub utterance: Option<String>,
    #[serde(default)]
    pub all: bool,
}

impl CancelRequest {
    pub fn from_utterance(utterance: impl Into<String>) -> Self {
        Self {
            utterance: Some(utterance.into()),
            all: false,
        }
    }

    pub fn all() -> Self {
        Self {
            utterance: None,
            all: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StartOutcome {
    Started { timer: Timer },
    /// Zero length, or no duration could be understood.
    InvalidDuration,
    /// A day or longer and not confirmed; the caller should offer an alarm.
    SuggestAlarm { duration: u64 },
    DuplicateName { name: String },
    UserCancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusOutcome {
    Timers { timers: Vec<TimerStatus> },
    NotFound,
    UserCancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CancelOutcome {
    Cancelled { timers: Vec<Timer> },
    NothingToCancel,
    NotFound,
    UserCancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StopOutcome {
    /// Overtime timers were cancelled.
    Silenced { timers: Vec<Timer> },
    /// Only running timers exist; a confirmation was queued.
    ConfirmationPosted,
    /// No timers at all; the stop belongs to someone else.
    Unhandled,
}

impl StopOutcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, StopOutcome::Unhandled)
    }
}
