//! Exponentially decayed trend score.
//!
//! Each day's score depends only on the previous day's score:
//!
//! ```text
//! decay = 0.5 ^ (frequency / 13)
//! score = floor((previous * decay + value * (1 - decay)) * 1e6) / 1e6
//! ```
//!
//! Habits expected more often decay faster per missed day. The result is
//! always truncated to six decimals so scores are reproducible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Entry, EntryValue, Frequency, Timestamp};

/// Half-life divisor of the decay factor.
const HALF_LIFE_DAYS: f64 = 13.0;

/// Scores are truncated to this many steps per unit.
const PRECISION: f64 = 1e6;

/// Trend value of a habit on one day, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub timestamp: Timestamp,
    pub value: f64,
}

/// Per-day retention factor for the given frequency.
pub fn decay_for(frequency: Frequency) -> f64 {
    0.5_f64.powf(frequency.to_f64() / HALF_LIFE_DAYS)
}

/// One recurrence step, truncated to six decimals.
pub fn compute(frequency: Frequency, previous: f64, value: f64) -> f64 {
    let decay = decay_for(frequency);
    truncate(previous * decay + value * (1.0 - decay))
}

fn truncate(value: f64) -> f64 {
    (value * PRECISION).floor() / PRECISION
}

/// Contribution of one entry, or `None` when the day keeps the previous
/// score (an exempted day).
fn effective_value(value: &EntryValue, is_numerical: bool) -> Option<f64> {
    match value {
        EntryValue::Skip => None,
        EntryValue::Amount(v) if is_numerical => Some(*v),
        EntryValue::Amount(v) => Some(v.clamp(0.0, 1.0)),
        other => Some(f64::from(other.code().unwrap_or(0).clamp(0, 1))),
    }
}

/// Compute one score per entry.
///
/// `entries` must be ordered oldest to newest. For numerical habits the
/// amounts are fed into the recurrence unchanged, so callers that want
/// completion-ratio semantics normalize them first.
pub fn compute_scores(entries: &[Entry], frequency: Frequency, is_numerical: bool) -> Vec<Score> {
    debug_assert!(entries.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

    let mut previous = 0.0;
    entries
        .iter()
        .map(|entry| {
            if let Some(value) = effective_value(&entry.value, is_numerical) {
                previous = compute(frequency, previous, value);
            }
            Score {
                timestamp: entry.timestamp,
                value: previous,
            }
        })
        .collect()
}

/// Scores keyed by day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreList {
    scores: BTreeMap<Timestamp, Score>,
}

impl ScoreList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all scores with the ones computed from `entries`
    /// (oldest to newest).
    pub fn recompute(&mut self, entries: &[Entry], frequency: Frequency, is_numerical: bool) {
        self.scores = compute_scores(entries, frequency, is_numerical)
            .into_iter()
            .map(|s| (s.timestamp, s))
            .collect();
    }

    /// Score for `day`; zero outside the computed range.
    pub fn get(&self, day: Timestamp) -> Score {
        self.scores.get(&day).copied().unwrap_or(Score {
            timestamp: day,
            value: 0.0,
        })
    }

    /// One score per day in `[from, to]`, newest first.
    pub fn get_by_interval(&self, from: Timestamp, to: Timestamp) -> Vec<Score> {
        if from.is_newer_than(to) {
            return Vec::new();
        }
        (0..=from.days_until(to)).map(|offset| self.get(to.minus(offset))).collect()
    }

    pub fn newest(&self) -> Option<Score> {
        self.scores.values().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
