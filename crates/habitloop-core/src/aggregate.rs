//! Bucketed totals for charts and histograms.
//!
//! Built on plain entry slices (typically `get_known()` or
//! `get_by_interval()` output), independent of the derivation engine.

use std::collections::BTreeMap;

use chrono::{Datelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{Entry, EntryValue, Timestamp, TruncateField};

/// Total for one truncated period, keyed by the period's first day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub start: Timestamp,
    pub total: f64,
}

fn bucketed(
    entries: &[Entry],
    field: TruncateField,
    first_weekday: Weekday,
    weight: impl Fn(&EntryValue) -> f64,
) -> Vec<Bucket> {
    let mut totals: BTreeMap<Timestamp, f64> = BTreeMap::new();
    for entry in entries {
        let start = entry.timestamp.truncate(field, first_weekday);
        *totals.entry(start).or_insert(0.0) += weight(&entry.value);
    }
    totals
        .into_iter()
        .rev()
        .map(|(start, total)| Bucket { start, total })
        .collect()
}

/// Sum entries per period, newest period first.
///
/// Numerical habits sum their amounts with negatives clamped to zero.
/// Yes/no habits count `YES_MANUAL` days. `SKIP` never contributes.
/// Periods without entries are absent from the result.
pub fn grouped_sum(
    entries: &[Entry],
    field: TruncateField,
    first_weekday: Weekday,
    is_numerical: bool,
) -> Vec<Bucket> {
    bucketed(entries, field, first_weekday, |value| match value {
        EntryValue::Amount(v) if is_numerical => v.max(0.0),
        EntryValue::YesManual if !is_numerical => 1.0,
        _ => 0.0,
    })
}

/// Number of `SKIP` days per period, newest period first.
pub fn count_skipped_days(entries: &[Entry], field: TruncateField, first_weekday: Weekday) -> Vec<Bucket> {
    bucketed(entries, field, first_weekday, |value| {
        if matches!(value, EntryValue::Skip) {
            1.0
        } else {
            0.0
        }
    })
}

/// Successes per month, split by weekday.
///
/// Keys are the first day of each month; each array is indexed Monday (0)
/// to Sunday (6). Months without entries are absent.
pub fn weekday_frequency(entries: &[Entry], is_numerical: bool) -> BTreeMap<Timestamp, [f64; 7]> {
    let mut map: BTreeMap<Timestamp, [f64; 7]> = BTreeMap::new();
    for entry in entries {
        let month = entry.timestamp.truncate(TruncateField::Month, Weekday::Mon);
        let slot = entry.timestamp.date().weekday().num_days_from_monday() as usize;
        let counts = map.entry(month).or_insert([0.0; 7]);
        match entry.value {
            EntryValue::Amount(v) if is_numerical => counts[slot] += v.max(0.0),
            EntryValue::YesManual if !is_numerical => counts[slot] += 1.0,
            _ => {}
        }
    }
    map
}
