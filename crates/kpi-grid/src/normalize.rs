//! Raw cell value to number.
//!
//! [`normalize`] is total: any input that cannot be read as a number yields
//! `None`. Rules are tried in order:
//!
//! 1. numeric cells pass through
//! 2. blank cells are absent
//! 3. thousands separators are stripped and full-width digits folded
//! 4. `H:MM:SS` / `MM:SS` durations become seconds
//! 5. `N時間N分N秒` durations (any subset) become seconds
//! 6. the first signed integer or decimal token in the text

use once_cell::sync::Lazy;
use regex::Regex;

use crate::cell::{Cell, fold_width};

static COLON_DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]+):([0-9]{1,2})(?::([0-9]{1,2}))?$").unwrap_or_else(|_| unreachable!())
});

static KANJI_HOURS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*時間?").unwrap_or_else(|_| unreachable!()));

static KANJI_MINUTES_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*分").unwrap_or_else(|_| unreachable!()));

static KANJI_SECONDS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*秒").unwrap_or_else(|_| unreachable!()));

static NUMBER_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?[0-9]+(?:\.[0-9]+)?").unwrap_or_else(|_| unreachable!()));

/// Normalizes a raw cell to a finite number.
#[must_use]
pub fn normalize(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => n.is_finite().then_some(*n),
        Cell::Blank => None,
        Cell::Text(text) => normalize_text(text),
    }
}

/// Normalizes cell text to a finite number.
#[must_use]
pub fn normalize_text(text: &str) -> Option<f64> {
    if text.trim().is_empty() {
        return None;
    }
    let folded = fold_width(text).replace(',', "");
    let folded = folded.trim();

    colon_duration(folded)
        .or_else(|| kanji_duration(folded))
        .or_else(|| first_number(folded))
        .filter(|n| n.is_finite())
}

fn colon_duration(text: &str) -> Option<f64> {
    let caps = COLON_DURATION_REGEX.captures(text)?;
    let first: f64 = caps[1].parse().ok()?;
    let second: f64 = caps[2].parse().ok()?;
    match caps.get(3) {
        Some(third) => {
            let third: f64 = third.as_str().parse().ok()?;
            Some(first * 3600.0 + second * 60.0 + third)
        }
        None => Some(first * 60.0 + second),
    }
}

fn kanji_duration(text: &str) -> Option<f64> {
    let component = |regex: &Regex| -> Option<f64> {
        regex
            .captures(text)
            .and_then(|caps| caps[1].parse::<f64>().ok())
    };
    let hours = component(&KANJI_HOURS_REGEX);
    let minutes = component(&KANJI_MINUTES_REGEX);
    let seconds = component(&KANJI_SECONDS_REGEX);
    if hours.is_none() && minutes.is_none() && seconds.is_none() {
        return None;
    }
    Some(hours.unwrap_or(0.0) * 3600.0 + minutes.unwrap_or(0.0) * 60.0 + seconds.unwrap_or(0.0))
}

fn first_number(text: &str) -> Option<f64> {
    NUMBER_TOKEN_REGEX
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
