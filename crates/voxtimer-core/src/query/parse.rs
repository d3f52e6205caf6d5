//! English text extraction for timer utterances.
//!
//! Everything here works on a normalized token stream: lowercased, hyphens
//! split, punctuation stripped, and number words folded into digits
//! ("twenty five" -> "25", "an hour" -> "1 hour").

use std::sync::OnceLock;

use regex::Regex;

const ALL_KEYWORDS: &[&str] = &["all", "every", "everything", "both"];

const FILLER_WORDS: &[&str] = &[
    "a", "about", "an", "and", "any", "are", "at", "by", "called", "can", "cancel", "check",
    "delete", "do", "end", "for", "from", "give", "have", "how", "i", "in", "is", "it", "kill",
    "labeled", "left", "long", "me", "much", "my", "named", "number", "of", "on", "one", "ones",
    "please", "remaining", "remove", "set", "start", "status", "stop", "tell", "that", "the",
    "there", "this", "till", "time", "timer", "timers", "to", "until", "what", "whats", "which",
    "with", "you",
];

const ORDINAL_WORDS: &[(&str, u32)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
];

const UNIT_WORDS: &[(&str, u32)] = &[
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
];

const TENS_WORDS: &[(&str, u32)] = &[
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

const YES_WORDS: &[&str] = &[
    "yes", "yeah", "yep", "yup", "sure", "ok", "okay", "correct", "affirmative", "absolutely",
    "definitely",
];
const NO_WORDS: &[&str] = &["no", "nope", "nah", "negative", "dont", "not", "never"];

fn attached_unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+(?:\.\d+)?)(h|hr|hrs|m|min|mins|s|sec|secs)$").expect("valid regex")
    })
}

fn nth_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(st|nd|rd|th)$").expect("valid regex"))
}

fn lookup(table: &[(&str, u32)], word: &str) -> Option<u32> {
    table.iter().find(|(w, _)| *w == word).map(|(_, v)| *v)
}

/// Seconds per unit word, if `word` is a time unit.
fn unit_seconds(word: &str) -> Option<u64> {
    match word {
        "hour" | "hours" | "hr" | "hrs" | "h" => Some(3600),
        "minute" | "minutes" | "min" | "mins" | "m" => Some(60),
        "second" | "seconds" | "sec" | "secs" | "s" => Some(1),
        _ => None,
    }
}

fn is_number(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit())
        && token.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

/// Lowercase, split and strip punctuation, keeping decimal points in numbers.
fn raw_tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['-', '_', '/'], " ")
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '.')
                .collect::<String>()
                .trim_matches('.')
                .to_string()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Tokenize and fold number words into digits.
pub fn tokenize(text: &str) -> Vec<String> {
    let raw = raw_tokens(text);
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let word = raw[i].as_str();
        if let Some(tens) = lookup(TENS_WORDS, word) {
            let unit = raw
                .get(i + 1)
                .and_then(|next| lookup(UNIT_WORDS, next))
                .filter(|u| (1..10).contains(u));
            match unit {
                Some(u) => {
                    out.push((tens + u).to_string());
                    i += 2;
                }
                None => {
                    out.push(tens.to_string());
                    i += 1;
                }
            }
            continue;
        }
        if let Some(n) = lookup(UNIT_WORDS, word) {
            out.push(n.to_string());
        } else if (word == "a" || word == "an") && counts_as_one(&raw, i) {
            out.push("1".to_string());
        } else {
            out.push(word.to_string());
        }
        i += 1;
    }
    out
}

/// "a"/"an" stands for one only directly before a unit word. "a second" is
/// left alone when it reads as an ordinal ("a second timer").
fn counts_as_one(raw: &[String], i: usize) -> bool {
    let Some(next) = raw.get(i + 1) else {
        return false;
    };
    if unit_seconds(next).is_none() || next.len() == 1 {
        return false;
    }
    if next == "second" {
        return !matches!(raw.get(i + 2).map(String::as_str), Some("timer" | "one" | "1"));
    }
    true
}

/// A duration found in an utterance, with the remaining unconsumed tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationMatch {
    pub seconds: u64,
    pub remainder: String,
}

/// Extract a duration, returning the leftover text for name/ordinal search.
///
/// Adjacent components add up ("1 hour and 30 minutes"); "and a half" and
/// "half an hour" are understood.
pub fn extract_duration(text: &str) -> Option<DurationMatch> {
    let tokens = tokenize(text);
    let mut consumed = vec![false; tokens.len()];
    let mut total = 0.0_f64;
    let mut found = false;

    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i].as_str();

        if let Some(caps) = attached_unit_re().captures(tok) {
            let n: f64 = caps[1].parse().unwrap_or(0.0);
            let unit = unit_seconds(&caps[2]).unwrap_or(0) as f64;
            total += n * unit;
            consumed[i] = true;
            found = true;
            i += 1;
            continue;
        }

        // "half an hour" / "half hour"
        if tok == "half" {
            let (skip, unit) = match (tokens.get(i + 1), tokens.get(i + 2)) {
                (Some(one), Some(u)) if one == "1" && unit_seconds(u).is_some() => {
                    (3, unit_seconds(u))
                }
                (Some(u), _) if unit_seconds(u).is_some() && u.len() > 1 => (2, unit_seconds(u)),
                _ => (0, None),
            };
            if let Some(unit) = unit {
                total += unit as f64 / 2.0;
                consumed[i..i + skip].iter_mut().for_each(|c| *c = true);
                found = true;
                i += skip;
                continue;
            }
        }

        if is_number(tok) {
            if let Some(unit) = tokens.get(i + 1).and_then(|u| unit_seconds(u)) {
                let n: f64 = tok.parse().unwrap_or(0.0);
                total += n * unit as f64;
                consumed[i] = true;
                consumed[i + 1] = true;
                found = true;
                let mut next = i + 2;
                let and_a_half = tokens
                    .get(next..next + 3)
                    .map(|w| *w == ["and", "a", "half"])
                    .unwrap_or(false);
                if and_a_half {
                    total += unit as f64 / 2.0;
                    consumed[next..next + 3].iter_mut().for_each(|c| *c = true);
                    next += 3;
                }
                // "1 hour and 30 minutes"
                let joins_next = tokens.get(next).map(|w| w == "and").unwrap_or(false)
                    && tokens.get(next + 1).map(|w| is_number(w)).unwrap_or(false)
                    && tokens
                        .get(next + 2)
                        .map(|w| unit_seconds(w).is_some())
                        .unwrap_or(false);
                if joins_next {
                    consumed[next] = true;
                    next += 1;
                }
                i = next;
                continue;
            }
        }
        i += 1;
    }

    if !found {
        return None;
    }
    if !total.is_finite() || total >= u64::MAX as f64 {
        tracing::debug!(total, "duration out of range");
        return None;
    }
    let remainder = tokens
        .iter()
        .zip(&consumed)
        .filter(|(_, used)| !**used)
        .map(|(t, _)| t.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some(DurationMatch {
        seconds: total.round().max(0.0) as u64,
        remainder,
    })
}

/// Whether the utterance asks for every timer.
pub fn has_all_keyword(text: &str) -> bool {
    raw_tokens(text)
        .iter()
        .any(|t| ALL_KEYWORDS.contains(&t.as_str()))
}

/// Extract a 1-based ordinal: "second", "2nd", "number 2", or a reply that is
/// nothing but a number.
pub fn extract_ordinal(text: &str) -> Option<u32> {
    let tokens = tokenize(text);
    for tok in &tokens {
        if let Some(n) = lookup(ORDINAL_WORDS, tok) {
            return Some(n);
        }
        if let Some(caps) = nth_re().captures(tok) {
            if let Ok(n) = caps[1].parse() {
                return Some(n);
            }
        }
    }
    for pair in tokens.windows(2) {
        if pair[0] == "number" {
            if let Ok(n) = pair[1].parse() {
                return Some(n);
            }
        }
    }
    // "one" is filler here so that "that one" is not read as the first timer.
    let meaningful: Vec<String> = raw_tokens(text)
        .into_iter()
        .filter(|t| !FILLER_WORDS.contains(&t.as_str()))
        .collect();
    match meaningful.as_slice() {
        [only] => tokenize(only)
            .first()
            .and_then(|t| t.parse().ok())
            .filter(|n| *n > 0),
        _ => None,
    }
}

/// What is left of an utterance once filler, ordinal and number words are
/// removed. `None` when nothing name-like remains.
pub fn extract_name(text: &str) -> Option<String> {
    let words: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|t| !FILLER_WORDS.contains(&t.as_str()))
        .filter(|t| lookup(ORDINAL_WORDS, t).is_none())
        .filter(|t| !ALL_KEYWORDS.contains(&t.as_str()))
        .filter(|t| !is_number(t) && !nth_re().is_match(t))
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:called|named|labeled|labelled)\s+(.+)$").expect("valid regex")
    })
}

/// Name given when starting a timer: "... called pasta", "... named tea".
pub fn extract_label(text: &str) -> Option<String> {
    let caps = label_re().captures(text)?;
    let mut label: Vec<String> = raw_tokens(&caps[1])
        .into_iter()
        .filter(|t| t != "timer")
        .collect();
    while label
        .last()
        .map(|t| FILLER_WORDS.contains(&t.as_str()))
        .unwrap_or(false)
    {
        label.pop();
    }
    normalize_name(&label.join(" "))
}

/// Clean a user-supplied timer name for storage.
pub fn normalize_name(name: &str) -> Option<String> {
    let cleaned = raw_tokens(name).join(" ");
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Similarity in `0.0..=1.0` between a timer name and a spoken phrase.
///
/// The phrase is scanned with windows of the name's word count so extra words
/// around the name ("the pasta sauce timer") do not drag the score down.
pub fn name_similarity(name: &str, phrase: &str) -> f64 {
    let name = raw_tokens(name).join(" ");
    let words = raw_tokens(phrase);
    if name.is_empty() || words.is_empty() {
        return 0.0;
    }
    let width = name.split(' ').count().clamp(1, words.len());
    let mut best = strsim::normalized_levenshtein(&name, &words.join(" "));
    for window in words.windows(width) {
        best = best.max(strsim::normalized_levenshtein(&name, &window.join(" ")));
    }
    best
}

/// Classify a yes/no reply. `None` when it is neither.
pub fn parse_yes_no(text: &str) -> Option<bool> {
    let tokens = raw_tokens(text);
    if tokens.iter().any(|t| NO_WORDS.contains(&t.as_str())) {
        return Some(false);
    }
    if tokens.iter().any(|t| YES_WORDS.contains(&t.as_str())) {
        return Some(true);
    }
    None
}

fn split_hms(secs: u64) -> (u64, u64, u64) {
    (secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Adjectival form used to refer to a timer: "5 minute", "1 hour 30 minute".
pub fn describe_duration(secs: u64) -> String {
    let (h, m, s) = split_hms(secs);
    let mut parts = Vec::new();
    if h > 0 {
        parts.push(format!("{h} hour"));
    }
    if m > 0 {
        parts.push(format!("{m} minute"));
    }
    if s > 0 || parts.is_empty() {
        parts.push(format!("{s} second"));
    }
    parts.join(" ")
}

/// Spoken amount of time: "4 minutes and 10 seconds".
pub fn speak_duration(secs: u64) -> String {
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("{n} {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    let (h, m, s) = split_hms(secs);
    let mut parts = Vec::new();
    if h > 0 {
        parts.push(plural(h, "hour"));
    }
    if m > 0 {
        parts.push(plural(m, "minute"));
    }
    if s > 0 || parts.is_empty() {
        parts.push(plural(s, "second"));
    }
    match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {last}", rest.join(" ")),
        _ => parts.join(" "),
    }
}
