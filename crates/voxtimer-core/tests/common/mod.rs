//! Recording fakes for the engine's adapters.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use voxtimer_core::storage::TimersConfig;
use voxtimer_core::timer::ManualTime;
use voxtimer_core::{
    Adapters, Announcement, AudioAdapter, ClipHandle, Dialog, DisplayAdapter, MemorySnapshot,
    Prompter, Speaker, TimerEngine,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Render { slot: Option<usize>, secs: i64 },
    Reset,
    Blink(bool),
}

#[derive(Default)]
pub struct RecordingDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn renders(&self) -> Vec<(Option<usize>, i64)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DisplayEvent::Render { slot, secs } => Some((slot, secs)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl DisplayAdapter for RecordingDisplay {
    fn render_duration(&self, slot: Option<usize>, signed_secs: i64) {
        self.events.lock().unwrap().push(DisplayEvent::Render {
            slot,
            secs: signed_secs,
        });
    }

    fn reset_display(&self) {
        self.events.lock().unwrap().push(DisplayEvent::Reset);
    }

    fn blink_indicator(&self, on: bool) {
        self.events.lock().unwrap().push(DisplayEvent::Blink(on));
    }
}

#[derive(Default)]
pub struct RecordingAudio {
    next: AtomicU64,
    playing: Mutex<HashSet<u64>>,
    stops: AtomicU64,
}

impl RecordingAudio {
    pub fn plays(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> u64 {
        self.stops.load(Ordering::SeqCst)
    }
}

impl AudioAdapter for RecordingAudio {
    fn play_clip(&self) -> ClipHandle {
        let id = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.playing.lock().unwrap().insert(id);
        ClipHandle(id)
    }

    fn is_playing(&self, handle: ClipHandle) -> bool {
        self.playing.lock().unwrap().contains(&handle.0)
    }

    fn stop(&self, handle: ClipHandle) {
        self.playing.lock().unwrap().remove(&handle.0);
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<Announcement>>,
    speaking: AtomicBool,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<Announcement> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn set_speaking(&self, speaking: bool) {
        self.speaking.store(speaking, Ordering::SeqCst);
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, announcement: &Announcement) {
        self.spoken.lock().unwrap().push(announcement.clone());
    }

    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }
}

/// Answers prompts from a queue; an exhausted queue means silence.
#[derive(Default)]
pub struct ScriptedPrompter {
    replies: Mutex<Vec<Option<String>>>,
    asked: Mutex<Vec<Dialog>>,
}

impl ScriptedPrompter {
    pub fn push(&self, reply: Option<&str>) {
        self.replies.lock().unwrap().insert(0, reply.map(str::to_string));
    }

    pub fn asked(&self) -> Vec<Dialog> {
        self.asked.lock().unwrap().clone()
    }

    pub fn asked_keys(&self) -> Vec<&'static str> {
        self.asked().iter().map(Dialog::key).collect()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&self, dialog: &Dialog, _timeout: Duration) -> Option<String> {
        self.asked.lock().unwrap().push(dialog.clone());
        self.replies.lock().unwrap().pop().flatten()
    }
}

pub struct Harness {
    pub engine: TimerEngine,
    pub display: Arc<RecordingDisplay>,
    pub audio: Arc<RecordingAudio>,
    pub speaker: Arc<RecordingSpeaker>,
    pub prompter: Arc<ScriptedPrompter>,
    pub snapshot: MemorySnapshot,
    pub time: ManualTime,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_snapshot(MemorySnapshot::new(), TimersConfig::default())
    }

    pub fn with_config(config: TimersConfig) -> Self {
        Self::with_snapshot(MemorySnapshot::new(), config)
    }

    pub fn with_snapshot(snapshot: MemorySnapshot, config: TimersConfig) -> Self {
        let display = Arc::new(RecordingDisplay::default());
        let audio = Arc::new(RecordingAudio::default());
        let speaker = Arc::new(RecordingSpeaker::default());
        let prompter = Arc::new(ScriptedPrompter::default());
        let adapters = Adapters {
            display: display.clone(),
            audio: audio.clone(),
            speaker: speaker.clone(),
            prompter: prompter.clone(),
        };
        let time = ManualTime::new(t0());
        let engine = TimerEngine::new(Box::new(snapshot.clone()), adapters, config)
            .with_time_source(Arc::new(time.clone()));
        Self {
            engine,
            display,
            audio,
            speaker,
            prompter,
            snapshot,
            time,
        }
    }

    /// Move time forward and run one clock tick.
    pub fn advance_and_tick(&self, secs: i64) {
        self.time.advance(secs);
        self.engine.tick();
    }
}

/// Fixed starting instant on an even second.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}
