//! Terminal stand-ins for the device adapters.
//!
//! The display is a single status line on stderr, beeps are the terminal
//! bell, speech is a printed line, and prompts read from the same stdin
//! channel the session loop uses.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use voxtimer_core::{
    Adapters, Announcement, AudioAdapter, ClipHandle, Dialog, DisplayAdapter, Prompter, Speaker,
};

/// How long a beep counts as "playing".
const CLIP_LENGTH: Duration = Duration::from_millis(800);

/// Format signed seconds as `[-]H:MM:SS` or `[-]M:SS`.
pub fn format_clock(signed_secs: i64) -> String {
    let sign = if signed_secs < 0 { "-" } else { "" };
    let secs = signed_secs.unsigned_abs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{sign}{h}:{m:02}:{s:02}")
    } else {
        format!("{sign}{m}:{s:02}")
    }
}

pub struct ConsoleDisplay {
    live: bool,
}

impl ConsoleDisplay {
    /// With `live` off, renders are only traced.
    pub fn new(live: bool) -> Self {
        Self { live }
    }

    fn write_line(&self, text: &str) {
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r\x1b[2K{text}");
        let _ = err.flush();
    }
}

impl DisplayAdapter for ConsoleDisplay {
    fn render_duration(&self, slot: Option<usize>, signed_secs: i64) {
        let text = match slot {
            Some(n) => format!("[{n}] {}", format_clock(signed_secs)),
            None => format!("[ ] {}", format_clock(signed_secs)),
        };
        tracing::trace!(display = %text, "render");
        if self.live {
            self.write_line(&text);
        }
    }

    fn reset_display(&self) {
        if self.live {
            self.write_line("");
        }
    }

    fn blink_indicator(&self, on: bool) {
        tracing::trace!(on, "indicator");
    }
}

/// Terminal bell. A clip is considered playing for [`CLIP_LENGTH`].
#[derive(Default)]
pub struct ConsoleAudio {
    next: AtomicU64,
    started: Mutex<HashMap<u64, Instant>>,
}

impl AudioAdapter for ConsoleAudio {
    fn play_clip(&self) -> ClipHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        if let Ok(mut started) = self.started.lock() {
            started.retain(|_, at| at.elapsed() < CLIP_LENGTH);
            started.insert(id, Instant::now());
        }
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "\x07*beep*");
        let _ = out.flush();
        ClipHandle(id)
    }

    fn is_playing(&self, handle: ClipHandle) -> bool {
        self.started
            .lock()
            .ok()
            .and_then(|started| started.get(&handle.0).map(|at| at.elapsed() < CLIP_LENGTH))
            .unwrap_or(false)
    }

    fn stop(&self, handle: ClipHandle) {
        if let Ok(mut started) = self.started.lock() {
            started.remove(&handle.0);
        }
    }
}

/// Prints what would be spoken. Speech is instantaneous.
pub struct ConsoleSpeaker;

impl Speaker for ConsoleSpeaker {
    fn speak(&self, announcement: &Announcement) {
        println!("\n> {}", announcement.render());
    }

    fn is_speaking(&self) -> bool {
        false
    }
}

/// Lines typed on stdin, read by a background thread.
///
/// The receiver is shared between the session loop and [`ChannelPrompter`];
/// both only read from the thread that drives the engine.
pub type LineSource = Arc<Mutex<Receiver<String>>>;

/// Start the stdin reader. The channel disconnects at end of input.
pub fn spawn_stdin_reader() -> LineSource {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    Arc::new(Mutex::new(rx))
}

/// Asks on stderr, keeping stdout for results, and waits for the next input line.
pub struct ChannelPrompter {
    lines: LineSource,
}

impl ChannelPrompter {
    pub fn new(lines: LineSource) -> Self {
        Self { lines }
    }
}

impl Prompter for ChannelPrompter {
    fn prompt(&self, dialog: &Dialog, timeout: Duration) -> Option<String> {
        eprintln!("? {}", dialog.render());
        let lines = self.lines.lock().ok()?;
        match lines.recv_timeout(timeout) {
            Ok(reply) => Some(reply),
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(dialog = dialog.key(), "prompt timed out");
                None
            }
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Console adapters wired to `lines`.
pub fn adapters(lines: LineSource, live_display: bool) -> Adapters {
    Adapters {
        display: Arc::new(ConsoleDisplay::new(live_display)),
        audio: Arc::new(ConsoleAudio::default()),
        speaker: Arc::new(ConsoleSpeaker),
        prompter: Arc::new(ChannelPrompter::new(lines)),
    }
}
