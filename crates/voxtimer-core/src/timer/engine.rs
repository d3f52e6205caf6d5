//! Timer engine facade.
//!
//! Owns every piece of mutable timer state behind one mutex and exposes the
//! operations the intent layer calls. A background task ticks the
//! [`ExpirationClock`] while at least one timer is active.
//!
//! ## Locking
//!
//! The state lock is held for read-modify-write sections only. Prompts are
//! issued with the lock released: queries resolve against a snapshot of the
//! active set and the result is applied by id afterwards.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = TimerEngine::new(Box::new(Database::open()?), adapters, config.timers);
//! engine.start(StartRequest::from_utterance("set a timer for 5 minutes"));
//! engine.cancel(CancelRequest::from_utterance("cancel the pasta timer"));
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::clock::{ExpirationClock, SystemTime, TickOutcome, TimeSource};
use super::model::{expiry_after, Timer, TimerStatus};
use super::request::{
    CancelOutcome, CancelRequest, StartOutcome, StartRequest, StatusOutcome, StatusRequest,
    StopOutcome,
};
use super::store::TimerStore;
use crate::adapters::{Adapters, Dialog};
use crate::query::parse::{extract_duration, has_all_keyword, parse_yes_no};
use crate::query::{Query, QueryResolver, Resolution, ResolverSettings};
use crate::storage::{SnapshotStore, TimersConfig};

/// Work deferred to the next request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingRequest {
    /// "stop" was heard while timers were running but none had expired.
    ConfirmCancelRunning,
}

struct EngineState {
    store: TimerStore,
    clock: ExpirationClock,
    pending: Option<PendingRequest>,
}

pub struct TimerEngine {
    state: Arc<Mutex<EngineState>>,
    adapters: Adapters,
    config: TimersConfig,
    time: Arc<dyn TimeSource>,
    runtime: Option<Handle>,
    clock_task: Mutex<Option<JoinHandle<()>>>,
}

impl TimerEngine {
    /// Create an engine, loading whatever was last snapshotted.
    ///
    /// When called inside a tokio runtime the clock task is spawned on it, and
    /// immediately if the snapshot already holds timers. Outside a runtime
    /// the clock only advances through [`TimerEngine::tick`].
    pub fn new(snapshot: Box<dyn SnapshotStore>, adapters: Adapters, config: TimersConfig) -> Self {
        let store = TimerStore::load(snapshot);
        let state = EngineState {
            clock: ExpirationClock::new(&config),
            store,
            pending: None,
        };
        let engine = Self {
            state: Arc::new(Mutex::new(state)),
            adapters,
            config,
            time: Arc::new(SystemTime),
            runtime: Handle::try_current().ok(),
            clock_task: Mutex::new(None),
        };
        let restored = engine.lock().store.len();
        if restored > 0 {
            tracing::info!(count = restored, "restored timers from snapshot");
            engine.ensure_clock_running();
        }
        engine
    }

    /// Replace the source of "now" (tests drive a manual clock).
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }

    fn resolver(&self) -> QueryResolver<'_> {
        QueryResolver::new(
            self.adapters.prompter.as_ref(),
            ResolverSettings::from(&self.config),
        )
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Active timers in creation order.
    pub fn timers(&self) -> Vec<Timer> {
        self.lock().store.all().to_vec()
    }

    pub fn list(&self) -> Vec<TimerStatus> {
        let now = self.now();
        self.lock().store.all().iter().map(|t| t.status(now)).collect()
    }

    pub fn is_muted(&self) -> bool {
        self.lock().clock.is_muted()
    }

    /// Id of the timer whose alerts are muted.
    pub fn muted_timer(&self) -> Option<u32> {
        self.lock().clock.muted_timer()
    }

    pub fn pending(&self) -> Option<PendingRequest> {
        self.lock().pending
    }

    pub fn is_clock_running(&self) -> bool {
        self.lock().clock.running
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&self, req: StartRequest) -> StartOutcome {
        let duration = match req.resolved_duration() {
            Some(d) => d,
            None => match self.ask(&Dialog::HowLong) {
                Some(reply) => match extract_duration(&reply) {
                    Some(m) => m.seconds,
                    None => return StartOutcome::InvalidDuration,
                },
                None => return StartOutcome::UserCancelled,
            },
        };
        if duration == 0 {
            return StartOutcome::InvalidDuration;
        }
        if expiry_after(self.now(), duration).is_none() {
            tracing::warn!(duration, "duration out of range");
            return StartOutcome::InvalidDuration;
        }
        if duration >= self.config.alarm_threshold_secs && !req.confirm_long {
            let confirmed = self
                .ask(&Dialog::ConfirmLongTimer { duration })
                .and_then(|reply| parse_yes_no(&reply))
                .unwrap_or(false);
            if !confirmed {
                tracing::info!(duration, "long timer not confirmed, suggesting an alarm");
                return StartOutcome::SuggestAlarm { duration };
            }
        }

        let name = req.resolved_name();
        let now = self.now();
        let timer = {
            let mut state = self.lock();
            if let Some(name) = name.as_deref() {
                if state.store.name_in_use(name) {
                    return StartOutcome::DuplicateName {
                        name: name.to_string(),
                    };
                }
            }
            let timer = state.store.create(duration, name, now);
            state.clock.unmute();
            timer
        };
        tracing::info!(
            id = timer.id,
            duration = timer.duration,
            ordinal = timer.ordinal,
            name = ?timer.name,
            "timer started"
        );
        self.ensure_clock_running();
        StartOutcome::Started { timer }
    }

    pub fn status(&self, req: StatusRequest) -> StatusOutcome {
        let now = self.now();
        let active = self.timers();
        if active.is_empty() {
            return StatusOutcome::NotFound;
        }
        if active.len() == 1 || req.all {
            return StatusOutcome::Timers {
                timers: active.iter().map(|t| t.status(now)).collect(),
            };
        }

        let query = Query::new(req.utterance.unwrap_or_default(), 2);
        match self.resolver().resolve(&active, &query, now) {
            Resolution::Matched(timers) => StatusOutcome::Timers {
                timers: timers.iter().map(|t| t.status(now)).collect(),
            },
            Resolution::NotFound | Resolution::GaveUp => StatusOutcome::NotFound,
            Resolution::UserCancelled => StatusOutcome::UserCancelled,
        }
    }

    pub fn cancel(&self, req: CancelRequest) -> CancelOutcome {
        let now = self.now();
        let active = self.timers();
        let utterance = req.utterance.unwrap_or_default();
        if active.is_empty() {
            return CancelOutcome::NothingToCancel;
        }
        if active.len() == 1 || req.all || has_all_keyword(&utterance) {
            let ids: Vec<u32> = active.iter().map(|t| t.id).collect();
            return self.remove_timers(&ids);
        }

        let resolver = self.resolver();
        let mut resolution = resolver.resolve(&active, &Query::new(utterance, 1), now);
        // Only a plain miss gets the second chance; exhausted rounds do not.
        if resolution == Resolution::NotFound {
            let dialog = Dialog::WhichTimerToCancel {
                candidates: active.iter().map(|t| t.status(now)).collect(),
            };
            resolution = match self.ask(&dialog) {
                Some(reply) => {
                    let query = Query {
                        is_response: true,
                        ..Query::new(reply, 1)
                    };
                    resolver.resolve(&active, &query, now)
                }
                None => Resolution::UserCancelled,
            };
        }

        match resolution {
            Resolution::Matched(timers) => {
                let ids: Vec<u32> = timers.iter().map(|t| t.id).collect();
                self.remove_timers(&ids)
            }
            Resolution::NotFound | Resolution::GaveUp => CancelOutcome::NotFound,
            Resolution::UserCancelled => CancelOutcome::UserCancelled,
        }
    }

    /// The "stop" action: silence expired timers, or offer to cancel running ones.
    pub fn stop(&self) -> StopOutcome {
        let now = self.now();
        let mut state = self.lock();
        let overtime: Vec<u32> = state
            .store
            .all()
            .iter()
            .filter(|t| t.is_expired(now))
            .map(|t| t.id)
            .collect();

        if !overtime.is_empty() {
            let timers = self.remove_locked(&mut state, &overtime);
            tracing::info!(count = timers.len(), "silenced expired timers");
            return StopOutcome::Silenced { timers };
        }
        if !state.store.is_empty() {
            state.pending = Some(PendingRequest::ConfirmCancelRunning);
            tracing::debug!("stop with only running timers, confirmation queued");
            return StopOutcome::ConfirmationPosted;
        }
        StopOutcome::Unhandled
    }

    /// Run work queued by [`TimerEngine::stop`]. Returns `None` if nothing was queued.
    pub fn process_pending(&self) -> Option<CancelOutcome> {
        let (pending, count) = {
            let mut state = self.lock();
            (state.pending.take()?, state.store.len())
        };
        match pending {
            PendingRequest::ConfirmCancelRunning => {
                if count == 0 {
                    return Some(CancelOutcome::NothingToCancel);
                }
                let confirmed = self
                    .ask(&Dialog::ConfirmCancelRunning { count })
                    .and_then(|reply| parse_yes_no(&reply))
                    .unwrap_or(false);
                if confirmed {
                    Some(self.cancel(CancelRequest::default()))
                } else {
                    Some(CancelOutcome::UserCancelled)
                }
            }
        }
    }

    pub fn mute(&self) {
        let mut state = self.lock();
        let EngineState { store, clock, .. } = &mut *state;
        match clock.mute(store, &self.adapters) {
            Some(id) => tracing::debug!(id, "alerts muted"),
            None => tracing::debug!("nothing on display to mute"),
        }
    }

    /// Advance the clock by one period, using the engine's time source.
    pub fn tick(&self) -> TickOutcome {
        let now = self.now();
        self.tick_at(now)
    }

    pub fn tick_at(&self, now: DateTime<Utc>) -> TickOutcome {
        let mut state = self.lock();
        let EngineState { store, clock, .. } = &mut *state;
        clock.tick(store, &self.adapters, now)
    }

    /// Stop the clock and forget the in-memory set. The snapshot is left as
    /// last written, so a restart picks the timers up again.
    pub fn shutdown(&self) {
        self.abort_clock_task();
        let mut state = self.lock();
        state.clock.running = false;
        state.clock.reset(&self.adapters);
        state.store.clear_memory();
        state.pending = None;
        tracing::info!("timer engine shut down");
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ask(&self, dialog: &Dialog) -> Option<String> {
        tracing::debug!(dialog = dialog.key(), "prompting user");
        self.adapters
            .prompter
            .prompt(dialog, self.config.prompt_timeout())
            .filter(|reply| !reply.trim().is_empty())
    }

    fn remove_timers(&self, ids: &[u32]) -> CancelOutcome {
        let mut state = self.lock();
        let timers = self.remove_locked(&mut state, ids);
        if timers.is_empty() {
            // Everything we resolved was removed by someone else meanwhile.
            return CancelOutcome::NotFound;
        }
        CancelOutcome::Cancelled { timers }
    }

    fn remove_locked(&self, state: &mut EngineState, ids: &[u32]) -> Vec<Timer> {
        let removed: Vec<Timer> = ids.iter().filter_map(|id| state.store.remove(*id)).collect();
        if removed.is_empty() {
            return removed;
        }
        for timer in &removed {
            tracing::info!(id = timer.id, label = %timer.label(), "timer cancelled");
        }
        state.clock.stop_clip(&self.adapters);
        for timer in &removed {
            state.clock.forget(timer.id);
        }
        if state.store.is_empty() {
            state.clock.running = false;
            state.clock.reset(&self.adapters);
            self.abort_clock_task();
        }
        removed
    }

    fn abort_clock_task(&self) {
        let mut task = self
            .clock_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }

    /// Spawn the periodic tick task unless one is already running.
    fn ensure_clock_running(&self) {
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };
        {
            let mut state = self.lock();
            if state.clock.running || state.store.is_empty() {
                return;
            }
            state.clock.running = true;
        }

        let state = Arc::clone(&self.state);
        let adapters = self.adapters.clone();
        let time = Arc::clone(&self.time);
        let period = self.config.tick_interval();
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut guard = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let EngineState { store, clock, .. } = &mut *guard;
                if clock.tick(store, &adapters, time.now()) == TickOutcome::Idle {
                    clock.running = false;
                    tracing::debug!("no active timers, clock stopped");
                    break;
                }
            }
        });

        let mut task = self
            .clock_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(old) = task.replace(handle) {
            old.abort();
        }
        tracing::debug!(period_ms = period.as_millis() as u64, "clock started");
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.abort_clock_task();
    }
}
