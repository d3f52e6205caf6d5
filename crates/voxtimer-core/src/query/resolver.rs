//! Resolve a spoken reference ("the pasta timer", "the second 5 minute one")
//! against the active timers.
//!
//! ## Resolution Order
//!
//! ```text
//! "all" keyword -> duration + name narrowing -> ordinal pick -> cap check -> ask
//! ```
//!
//! When more timers match than the caller can use, the user is asked which
//! one they meant and the reply is resolved against the narrowed set. The
//! number of such rounds is bounded.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::parse::{extract_duration, extract_name, extract_ordinal, has_all_keyword, name_similarity};
use crate::adapters::{Dialog, Prompter};
use crate::storage::TimersConfig;
use crate::timer::Timer;

/// Outcome of resolving one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched(Vec<Timer>),
    NotFound,
    /// Still ambiguous after the last allowed prompt.
    GaveUp,
    /// The user declined or did not answer a disambiguation prompt.
    UserCancelled,
}

/// One request to resolve.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub utterance: String,
    /// Largest match set the caller can act on without asking.
    pub max_results: usize,
    pub all: bool,
    /// The utterance is itself a reply to a "which timer?" prompt.
    pub is_response: bool,
}

impl Query {
    pub fn new(utterance: impl Into<String>, max_results: usize) -> Self {
        Self {
            utterance: utterance.into(),
            max_results,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub name_threshold: f64,
    pub max_rounds: u32,
    pub prompt_timeout: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self::from(&TimersConfig::default())
    }
}

impl From<&TimersConfig> for ResolverSettings {
    fn from(cfg: &TimersConfig) -> Self {
        Self {
            name_threshold: cfg.name_match_threshold,
            max_rounds: cfg.max_disambiguation_rounds,
            prompt_timeout: cfg.prompt_timeout(),
        }
    }
}

pub struct QueryResolver<'a> {
    prompter: &'a dyn Prompter,
    settings: ResolverSettings,
}

impl<'a> QueryResolver<'a> {
    pub fn new(prompter: &'a dyn Prompter, settings: ResolverSettings) -> Self {
        Self { prompter, settings }
    }

    /// Resolve `query` against `active`, prompting when it is ambiguous.
    ///
    /// `active` is a snapshot; the caller applies the result under its own lock.
    pub fn resolve(&self, active: &[Timer], query: &Query, now: DateTime<Utc>) -> Resolution {
        if active.is_empty() {
            return Resolution::NotFound;
        }
        let ordinals_in_use = active.iter().any(|t| t.ordinal > 1);
        let mut universe = active.to_vec();
        let mut utterance = query.utterance.clone();
        let mut all = query.all;
        let mut is_response = query.is_response;

        for round in 0..=self.settings.max_rounds {
            if all || has_all_keyword(&utterance) {
                return Resolution::Matched(universe);
            }

            let candidates = self.narrow(&universe, &utterance, is_response, ordinals_in_use);
            tracing::debug!(
                round,
                utterance = %utterance,
                universe = universe.len(),
                candidates = candidates.len(),
                "narrowed timer query"
            );
            if candidates.len() <= query.max_results {
                return if candidates.is_empty() {
                    Resolution::NotFound
                } else {
                    Resolution::Matched(candidates)
                };
            }
            if round == self.settings.max_rounds {
                break;
            }

            let dialog = Dialog::WhichTimer {
                candidates: candidates.iter().map(|t| t.status(now)).collect(),
            };
            let reply = self
                .prompter
                .prompt(&dialog, self.settings.prompt_timeout)
                .filter(|r| !r.trim().is_empty());
            match reply {
                Some(reply) => {
                    utterance = reply;
                    universe = candidates;
                    all = false;
                    is_response = true;
                }
                None => return Resolution::UserCancelled,
            }
        }

        tracing::info!(
            rounds = self.settings.max_rounds,
            "timer query still ambiguous, giving up"
        );
        Resolution::GaveUp
    }

    fn narrow(
        &self,
        universe: &[Timer],
        utterance: &str,
        is_response: bool,
        ordinals_in_use: bool,
    ) -> Vec<Timer> {
        let (duration, rest) = match extract_duration(utterance) {
            Some(m) => (Some(m.seconds), m.remainder),
            None => (None, utterance.to_string()),
        };
        let name = extract_name(&rest).or_else(|| {
            // A bare reply to "which timer?" is taken as a name.
            let trimmed = utterance.trim();
            (is_response && !trimmed.is_empty()).then(|| trimmed.to_string())
        });

        let by_duration: Vec<&Timer> = match duration {
            Some(d) => universe.iter().filter(|t| t.duration == d).collect(),
            None => Vec::new(),
        };
        let by_name: Vec<&Timer> = match &name {
            Some(name) => universe
                .iter()
                .filter(|t| {
                    t.name
                        .as_deref()
                        .map(|n| name_similarity(n, name) >= self.settings.name_threshold)
                        .unwrap_or(false)
                })
                .collect(),
            None => Vec::new(),
        };

        let mut candidates: Vec<Timer> = match (by_duration.is_empty(), by_name.is_empty()) {
            (false, false) => by_duration
                .iter()
                .filter(|t| by_name.iter().any(|n| n.id == t.id))
                .map(|t| (*t).clone())
                .collect(),
            (false, true) => by_duration.into_iter().cloned().collect(),
            (true, false) => by_name.into_iter().cloned().collect(),
            (true, true) => universe.to_vec(),
        };

        if candidates.len() > 1 {
            if let Some(n) = extract_ordinal(&rest) {
                let picked: Vec<Timer> = if ordinals_in_use {
                    candidates.iter().filter(|t| t.ordinal == n).cloned().collect()
                } else {
                    n.checked_sub(1)
                        .and_then(|idx| universe.get(idx as usize))
                        .filter(|t| candidates.iter().any(|c| c.id == t.id))
                        .cloned()
                        .into_iter()
                        .collect()
                };
                if !picked.is_empty() {
                    candidates = picked;
                }
            }
        }
        candidates
    }
}
