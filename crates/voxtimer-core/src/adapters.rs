//! Boundaries to the surrounding voice runtime.
//!
//! The engine decides *what* to show, play, say or ask; implementations of
//! these traits decide *how*. All of them are shared between the request path
//! and the clock task, hence `Send + Sync`.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::query::parse::speak_duration;
use crate::timer::TimerStatus;

/// Renders the timer readout.
pub trait DisplayAdapter: Send + Sync {
    /// Show `signed_secs` (negative = overtime) for the timer in `slot`.
    /// `slot` is `None` when only one timer is active.
    fn render_duration(&self, slot: Option<usize>, signed_secs: i64);
    fn reset_display(&self);
    fn blink_indicator(&self, on: bool);
}

/// Opaque reference to a clip started by an [`AudioAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClipHandle(pub u64);

/// Plays the expiration alert clip.
pub trait AudioAdapter: Send + Sync {
    fn play_clip(&self) -> ClipHandle;
    fn is_playing(&self, handle: ClipHandle) -> bool;
    fn stop(&self, handle: ClipHandle);
}

/// Something the engine says on its own initiative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Announcement {
    /// A timer ran out while others are active.
    Expired { label: String, ordinal: u32 },
}

impl Announcement {
    pub fn key(&self) -> &'static str {
        match self {
            Announcement::Expired { .. } => "timer.expired",
        }
    }

    /// English fallback wording.
    pub fn render(&self) -> String {
        match self {
            Announcement::Expired { label, ordinal } if *ordinal > 1 => {
                format!("Your {} {label} timer is done", ordinal_word(*ordinal))
            }
            Announcement::Expired { label, .. } => format!("Your {label} timer is done"),
        }
    }
}

/// Text-to-speech output.
pub trait Speaker: Send + Sync {
    fn speak(&self, announcement: &Announcement);
    /// While true the clock leaves the display alone.
    fn is_speaking(&self) -> bool;
}

/// A question put to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Dialog {
    /// More timers matched than the caller can use.
    WhichTimer { candidates: Vec<TimerStatus> },
    /// A cancel request matched nothing.
    WhichTimerToCancel { candidates: Vec<TimerStatus> },
    /// A start request carried no duration.
    HowLong,
    /// A day or more was requested; probably meant as an alarm.
    ConfirmLongTimer { duration: u64 },
    /// "stop" was said while timers are still running.
    ConfirmCancelRunning { count: usize },
}

impl Dialog {
    pub fn key(&self) -> &'static str {
        match self {
            Dialog::WhichTimer { .. } => "ask.which.timer",
            Dialog::WhichTimerToCancel { .. } => "ask.which.timer.cancel",
            Dialog::HowLong => "ask.how.long",
            Dialog::ConfirmLongTimer { .. } => "ask.confirm.long.timer",
            Dialog::ConfirmCancelRunning { .. } => "ask.cancel.running",
        }
    }

    /// English fallback wording.
    pub fn render(&self) -> String {
        match self {
            Dialog::WhichTimer { candidates } => {
                format!("Which timer? There's {}.", summarize(candidates))
            }
            Dialog::WhichTimerToCancel { candidates } => {
                format!("Which timer should I cancel? There's {}.", summarize(candidates))
            }
            Dialog::HowLong => "For how long?".to_string(),
            Dialog::ConfirmLongTimer { duration } => format!(
                "That's {}. Did you mean to set a timer rather than an alarm?",
                speak_duration(*duration)
            ),
            Dialog::ConfirmCancelRunning { count: 1 } => {
                "A timer is still running. Do you want to cancel it?".to_string()
            }
            Dialog::ConfirmCancelRunning { count } => {
                format!("{count} timers are still running. Do you want to cancel them?")
            }
        }
    }
}

/// Asks the user something and waits for the reply.
pub trait Prompter: Send + Sync {
    /// `None` means no reply arrived within `timeout` or the user declined.
    fn prompt(&self, dialog: &Dialog, timeout: Duration) -> Option<String>;
}

/// The full set of collaborators an engine talks to.
#[derive(Clone)]
pub struct Adapters {
    pub display: Arc<dyn DisplayAdapter>,
    pub audio: Arc<dyn AudioAdapter>,
    pub speaker: Arc<dyn Speaker>,
    pub prompter: Arc<dyn Prompter>,
}

/// "the pasta timer with 3 minutes left, and the second 5 minute timer ..."
pub fn summarize(timers: &[TimerStatus]) -> String {
    let parts: Vec<String> = timers.iter().map(describe_status).collect();
    match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, and {last}", rest.join(", ")),
        _ => parts.join(""),
    }
}

/// One timer in words, e.g. "a 5 minute timer with 2 minutes left".
pub fn describe_status(status: &TimerStatus) -> String {
    let which = if status.ordinal > 1 {
        format!("the {} {} timer", ordinal_word(status.ordinal), status.label)
    } else {
        format!("the {} timer", status.label)
    };
    if status.expired {
        format!(
            "{which}, expired {} ago",
            speak_duration(status.remaining_secs.unsigned_abs())
        )
    } else {
        format!(
            "{which} with {} left",
            speak_duration(status.remaining_secs.max(0) as u64)
        )
    }
}

pub fn ordinal_word(n: u32) -> String {
    match n {
        1 => "first".into(),
        2 => "second".into(),
        3 => "third".into(),
        4 => "fourth".into(),
        5 => "fifth".into(),
        6 => "sixth".into(),
        7 => "seventh".into(),
        8 => "eighth".into(),
        9 => "ninth".into(),
        10 => "tenth".into(),
        n => {
            let suffix = match (n % 10, n % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{n}{suffix}")
        }
    }
}
