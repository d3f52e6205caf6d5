//! Interactive session: one utterance per line.
//!
//! Each line is classified by keyword into an intent and handed to the
//! engine. The expiration clock runs on a tokio runtime in the background,
//! so beeps and announcements arrive between lines.

use clap::Args;
use voxtimer_core::adapters::summarize;
use voxtimer_core::query::parse::{
    extract_duration, extract_name, extract_ordinal, has_all_keyword,
};
use voxtimer_core::{CancelRequest, Config, StartRequest, StatusRequest, StopOutcome, TimerEngine};

use super::{speak_cancel, speak_start, speak_status, speak_stop};
use crate::console;

#[derive(Args)]
pub struct SessionArgs {
    /// Show a live countdown line on stderr
    #[arg(long)]
    display: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Start,
    Status,
    Cancel,
    Mute,
    Stop,
    List,
    Help,
    Quit,
    Unknown,
}

/// Words that make "stop the ..." about the noise rather than a timer.
const NOISE_WORDS: &[&str] = &["alarm", "beeping", "ringing", "noise", "sound", "that", "it"];

const HELP: &str = "\
Try: \"set a timer for 5 minutes called pasta\", \"how long is left on the pasta timer\",
     \"cancel the second 5 minute timer\", \"list timers\", \"mute\", \"stop\", \"quit\".";

fn words(line: &str) -> Vec<String> {
    line.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a "stop" line names a particular timer.
fn refers_to_timer(words: &[String]) -> bool {
    let text = words
        .iter()
        .filter(|w| !NOISE_WORDS.contains(&w.as_str()))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    extract_duration(&text).is_some()
        || extract_ordinal(&text).is_some()
        || has_all_keyword(&text)
        || extract_name(&text).is_some()
}

pub fn classify(line: &str) -> Intent {
    let words = words(line);
    let has = |w: &str| words.iter().any(|x| x == w);
    let has_any = |ws: &[&str]| ws.iter().any(|w| has(*w));
    let joined = words.join(" ");

    if words.is_empty() {
        return Intent::Unknown;
    }
    if has_any(&["quit", "exit", "bye"]) {
        return Intent::Quit;
    }
    if has("help") {
        return Intent::Help;
    }
    if has_any(&["mute", "silence", "quiet", "hush"]) {
        return Intent::Mute;
    }
    if has_any(&["cancel", "delete", "remove", "kill", "clear"]) {
        return Intent::Cancel;
    }
    if has("stop") {
        return if refers_to_timer(&words) {
            Intent::Cancel
        } else {
            Intent::Stop
        };
    }
    if has("list") || joined.contains("what timers") || joined.contains("which timers") {
        return Intent::List;
    }
    if has_any(&["status", "left", "remaining"])
        || joined.contains("how long")
        || joined.contains("how much")
    {
        return Intent::Status;
    }
    if has_any(&["start", "set", "create", "begin", "make", "add"]) {
        return Intent::Start;
    }
    if extract_duration(line).is_some() {
        return Intent::Start;
    }
    Intent::Unknown
}

enum Step {
    Reply(String),
    Quit,
}

fn handle(engine: &TimerEngine, line: &str) -> Step {
    let intent = classify(line);
    tracing::debug!(?intent, line, "classified input");
    let reply = match intent {
        Intent::Start => speak_start(&engine.start(StartRequest::from_utterance(line))),
        Intent::Status => speak_status(&engine.status(StatusRequest::from_utterance(line))),
        Intent::Cancel => speak_cancel(&engine.cancel(CancelRequest::from_utterance(line))),
        Intent::Mute => {
            engine.mute();
            "Okay.".to_string()
        }
        Intent::Stop => match engine.stop() {
            StopOutcome::Unhandled => "There's nothing to stop.".to_string(),
            outcome => speak_stop(&outcome).unwrap_or_default(),
        },
        Intent::List => {
            let timers = engine.list();
            if timers.is_empty() {
                "You have no timers.".to_string()
            } else {
                format!("You have {}.", summarize(&timers))
            }
        }
        Intent::Help => HELP.to_string(),
        Intent::Quit => return Step::Quit,
        Intent::Unknown => "Sorry, I didn't catch that.".to_string(),
    };
    Step::Reply(reply)
}

pub fn run(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()?;
    let _guard = runtime.enter();

    let lines = console::spawn_stdin_reader();
    let engine = super::open_engine(&config, console::adapters(lines.clone(), args.display))?;
    println!("voxtimer session. Say \"help\" for examples.");

    loop {
        let line = {
            let rx = lines.lock().map_err(|_| "input channel poisoned")?;
            match rx.recv() {
                Ok(line) => line,
                Err(_) => break,
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match handle(&engine, &line) {
            Step::Reply(reply) if !reply.is_empty() => println!("> {reply}"),
            Step::Reply(_) => {}
            Step::Quit => break,
        }
        if let Some(outcome) = engine.process_pending() {
            println!("> {}", speak_cancel(&outcome));
        }
    }

    engine.shutdown();
    Ok(())
}
