pub mod config;
pub mod session;
pub mod timer;

use voxtimer_core::adapters::{describe_status, summarize};
use voxtimer_core::query::parse::{describe_duration, speak_duration};
use voxtimer_core::{
    Adapters, CancelOutcome, Config, Database, SnapshotStore, StartOutcome, StatusOutcome,
    StopOutcome, TimerEngine,
};

/// Open the configured snapshot database and build an engine on it.
pub fn open_engine(
    config: &Config,
    adapters: Adapters,
) -> voxtimer_core::error::Result<TimerEngine> {
    let db = match &config.storage.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };
    let snapshot: Box<dyn SnapshotStore> = Box::new(db);
    Ok(TimerEngine::new(snapshot, adapters, config.timers.clone()))
}

// ── Spoken responses ─────────────────────────────────────────────────

pub fn speak_start(outcome: &StartOutcome) -> String {
    match outcome {
        StartOutcome::Started { timer } => match &timer.name {
            Some(name) => format!(
                "Starting a {} timer called {name}.",
                describe_duration(timer.duration)
            ),
            None => format!("Starting a {} timer.", describe_duration(timer.duration)),
        },
        StartOutcome::InvalidDuration => "Sorry, I didn't get how long.".to_string(),
        StartOutcome::SuggestAlarm { duration } => format!(
            "{} is a long time. You might want to set an alarm instead.",
            speak_duration(*duration)
        ),
        StartOutcome::DuplicateName { name } => {
            format!("There's already a timer called {name}.")
        }
        StartOutcome::UserCancelled => "Okay, no timer.".to_string(),
    }
}

pub fn speak_status(outcome: &StatusOutcome) -> String {
    match outcome {
        StatusOutcome::Timers { timers } if timers.len() == 1 => {
            format!("There's {}.", describe_status(&timers[0]))
        }
        StatusOutcome::Timers { timers } => format!("There's {}.", summarize(timers)),
        StatusOutcome::NotFound => "I couldn't find that timer.".to_string(),
        StatusOutcome::UserCancelled => "Okay.".to_string(),
    }
}

pub fn speak_cancel(outcome: &CancelOutcome) -> String {
    match outcome {
        CancelOutcome::Cancelled { timers } if timers.len() == 1 => {
            format!("Cancelled the {} timer.", timers[0].label())
        }
        CancelOutcome::Cancelled { timers } => format!("Cancelled {} timers.", timers.len()),
        CancelOutcome::NothingToCancel => "There are no timers to cancel.".to_string(),
        CancelOutcome::NotFound => "I couldn't find that timer.".to_string(),
        CancelOutcome::UserCancelled => "Okay, leaving your timers alone.".to_string(),
    }
}

pub fn speak_stop(outcome: &StopOutcome) -> Option<String> {
    match outcome {
        StopOutcome::Silenced { timers } if timers.len() == 1 => {
            Some(format!("Stopped the {} timer.", timers[0].label()))
        }
        StopOutcome::Silenced { timers } => Some(format!("Stopped {} timers.", timers.len())),
        StopOutcome::ConfirmationPosted | StopOutcome::Unhandled => None,
    }
}
