//! Expiration clock.
//!
//! The clock does not own a thread. [`ExpirationClock::tick`] is called once
//! per period by the engine's background task (or directly by tests) and
//! turns the current store contents into display, audio and speech effects.
//!
//! ## Per-tick effects
//!
//! ```text
//! empty store        -> reset display, stop
//! any timer expired  -> blink on even seconds
//! speech in progress -> nothing else this tick
//! displayed timer    -> render remaining (or negative overtime), then alert
//! ```

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Timelike, Utc};

use super::store::TimerStore;
use crate::adapters::{Adapters, Announcement, ClipHandle};
use crate::storage::TimersConfig;

/// Source of "now" for the engine and clock.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualTime {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualTime {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, secs: i64) {
        if let Ok(mut now) = self.now.lock() {
            *now += chrono::Duration::seconds(secs);
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|n| *n).unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Timers remain; keep ticking.
    Continue,
    /// Nothing left to watch; the periodic task should end.
    Idle,
}

/// Display cursor, muted timer and beep bookkeeping.
#[derive(Debug)]
pub struct ExpirationClock {
    cycle_ticks: u64,
    beep_repeat_secs: i64,
    tick_count: u64,
    /// Timer whose alerts are silenced until it is removed.
    muted: Option<u32>,
    /// Timer rendered by the last tick.
    displayed: Option<u32>,
    blinking: bool,
    /// Timer id and time of the last audible alert.
    last_alert: Option<(u32, DateTime<Utc>)>,
    clip: Option<ClipHandle>,
    /// Whether a periodic task is currently driving this clock.
    pub(crate) running: bool,
}

impl ExpirationClock {
    pub fn new(cfg: &TimersConfig) -> Self {
        Self {
            cycle_ticks: cfg.display_cycle_ticks.max(1),
            beep_repeat_secs: cfg.beep_repeat_secs as i64,
            tick_count: 0,
            muted: None,
            displayed: None,
            blinking: false,
            last_alert: None,
            clip: None,
            running: false,
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.is_some()
    }

    pub fn muted_timer(&self) -> Option<u32> {
        self.muted
    }

    /// Silence the current alert until the timer it belongs to is gone.
    ///
    /// The current alert is the last timer that beeped or was announced, if it
    /// is still active, else whatever is on display. Returns the muted id.
    pub fn mute(&mut self, store: &TimerStore, adapters: &Adapters) -> Option<u32> {
        let alerting = self
            .last_alert
            .map(|(id, _)| id)
            .filter(|id| store.get(*id).is_some());
        self.muted = alerting.or(self.displayed);
        self.stop_clip(adapters);
        self.muted
    }

    pub fn unmute(&mut self) {
        self.muted = None;
    }

    /// Drop per-timer state for a removed timer.
    pub fn forget(&mut self, id: u32) {
        if self.muted == Some(id) {
            self.muted = None;
        }
        if self.displayed == Some(id) {
            self.displayed = None;
        }
        if matches!(self.last_alert, Some((alerted, _)) if alerted == id) {
            self.last_alert = None;
        }
    }

    pub fn stop_clip(&mut self, adapters: &Adapters) {
        if let Some(handle) = self.clip.take() {
            if adapters.audio.is_playing(handle) {
                adapters.audio.stop(handle);
            }
        }
    }

    /// Forget display and alert state once the store is empty.
    pub fn reset(&mut self, adapters: &Adapters) {
        self.stop_clip(adapters);
        self.tick_count = 0;
        self.muted = None;
        self.displayed = None;
        self.blinking = false;
        self.last_alert = None;
        adapters.display.reset_display();
    }

    pub fn tick(
        &mut self,
        store: &mut TimerStore,
        adapters: &Adapters,
        now: DateTime<Utc>,
    ) -> TickOutcome {
        if store.next_due().is_none() {
            self.reset(adapters);
            return TickOutcome::Idle;
        }

        let any_expired = store.all().iter().any(|t| t.is_expired(now));
        if any_expired {
            adapters.display.blink_indicator(now.second() % 2 == 0);
            self.blinking = true;
        } else if self.blinking {
            adapters.display.blink_indicator(false);
            self.blinking = false;
        }

        let tick = self.tick_count;
        self.tick_count += 1;

        if adapters.speaker.is_speaking() {
            return TickOutcome::Continue;
        }

        let count = store.len();
        let (index, slot) = if count > 1 {
            let index = ((tick / self.cycle_ticks) % count as u64) as usize;
            (index, Some(index + 1))
        } else {
            (0, None)
        };
        let Some(timer) = store.all().get(index).cloned() else {
            return TickOutcome::Continue;
        };
        self.displayed = Some(timer.id);

        if !timer.is_expired(now) {
            adapters.display.render_duration(slot, timer.remaining_secs(now));
            return TickOutcome::Continue;
        }
        adapters.display.render_duration(slot, -timer.overtime_secs(now));

        if self.muted == Some(timer.id) {
            return TickOutcome::Continue;
        }
        if count > 1 && !timer.announced {
            let announcement = Announcement::Expired {
                label: timer.label(),
                ordinal: timer.ordinal,
            };
            tracing::info!(id = timer.id, label = %timer.label(), "timer expired");
            adapters.speaker.speak(&announcement);
            store.mark_announced(timer.id);
            self.last_alert = Some((timer.id, now));
            return TickOutcome::Continue;
        }

        let due = match self.last_alert {
            Some((id, at)) if id == timer.id => (now - at).num_seconds() >= self.beep_repeat_secs,
            _ => true,
        };
        if due {
            if !timer.announced {
                tracing::info!(id = timer.id, label = %timer.label(), "timer expired");
                store.mark_announced(timer.id);
            }
            self.stop_clip(adapters);
            self.clip = Some(adapters.audio.play_clip());
            self.last_alert = Some((timer.id, now));
            tracing::debug!(id = timer.id, overtime = timer.overtime_secs(now), "alert beep");
        }
        TickOutcome::Continue
    }
}
