use clap::Args;
use serde::Serialize;
use voxtimer_core::{CancelRequest, Config, StartRequest, StatusRequest, StopOutcome, TimerEngine};

use crate::console;

/// Words of a spoken request, joined back into one utterance.
#[derive(Args)]
pub struct Utterance {
    /// e.g. `the second 5 minute timer`
    words: Vec<String>,
}

impl Utterance {
    fn text(&self) -> Option<String> {
        let text = self.words.join(" ");
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Args)]
pub struct StartArgs {
    #[command(flatten)]
    utterance: Utterance,
    /// Duration in seconds, instead of reading it from the words
    #[arg(long)]
    seconds: Option<u64>,
    /// Timer name
    #[arg(long)]
    name: Option<String>,
    /// Start timers of a day or longer without asking
    #[arg(long)]
    yes: bool,
}

#[derive(Args)]
pub struct QueryArgs {
    #[command(flatten)]
    utterance: Utterance,
    /// Act on every active timer
    #[arg(long)]
    all: bool,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Engine for a one-shot command. Prompts are answered from stdin.
fn engine() -> Result<TimerEngine, Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let adapters = console::adapters(console::spawn_stdin_reader(), false);
    Ok(super::open_engine(&config, adapters)?)
}

pub fn start(args: StartArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = engine()?;
    let req = StartRequest {
        utterance: args.utterance.text(),
        duration: args.seconds,
        name: args.name,
        confirm_long: args.yes,
    };
    print_json(&engine.start(req))
}

pub fn status(args: QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = engine()?;
    let req = StatusRequest {
        utterance: args.utterance.text(),
        all: args.all,
    };
    print_json(&engine.status(req))
}

pub fn cancel(args: QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = engine()?;
    let req = CancelRequest {
        utterance: args.utterance.text(),
        all: args.all,
    };
    print_json(&engine.cancel(req))
}

pub fn list() -> Result<(), Box<dyn std::error::Error>> {
    let engine = engine()?;
    print_json(&engine.list())
}

/// Silence expired timers. With only running timers the confirmation is
/// asked right away, since there is no later request cycle.
pub fn stop() -> Result<(), Box<dyn std::error::Error>> {
    let engine = engine()?;
    let outcome = engine.stop();
    print_json(&outcome)?;
    if outcome == StopOutcome::ConfirmationPosted {
        if let Some(pending) = engine.process_pending() {
            print_json(&pending)?;
        }
    }
    Ok(())
}
