//! Per-day entry storage and the derivation pipeline that turns raw
//! entries into a materialized timeline.
//!
//! Raw entries → [`build_intervals`] → [`snap_intervals_together`] →
//! [`build_entries_from_intervals`] → materialized [`EntryList`].

mod intervals;
mod materialize;

pub use intervals::{build_intervals, snap_intervals_together, window_size};
pub use materialize::build_entries_from_intervals;

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::Result;
use crate::models::{Entry, Frequency, Timestamp};

/// Boundary contract for wherever raw entries live.
///
/// The engine reads one snapshot through [`EntrySource::get_known`] per
/// recompute and never holds on to the source.
pub trait EntrySource {
    /// Insert the entry, replacing any entry on the same day.
    fn add_or_replace(&mut self, entry: Entry) -> Result<()>;

    /// Forget the entry on `day`, if any.
    fn remove(&mut self, day: Timestamp) -> Result<()>;

    /// All stored entries, newest first.
    fn get_known(&self) -> Result<Vec<Entry>>;

    fn clear(&mut self) -> Result<()>;
}

/// Entries keyed by day, at most one per day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryList {
    entries: BTreeMap<Timestamp, Entry>,
}

impl EntryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from entries in any order. A later entry for the same
    /// day replaces an earlier one.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut list = Self::new();
        for entry in entries {
            list.add(entry);
        }
        list
    }

    /// Entry for `day`, or an `UNKNOWN` entry if nothing was added.
    pub fn get(&self, day: Timestamp) -> Entry {
        self.entries
            .get(&day)
            .cloned()
            .unwrap_or_else(|| Entry::unknown(day))
    }

    /// One entry per day in `[from, to]`, newest first. Empty when `from`
    /// is newer than `to`.
    pub fn get_by_interval(&self, from: Timestamp, to: Timestamp) -> Vec<Entry> {
        if from.is_newer_than(to) {
            return Vec::new();
        }
        (0..=from.days_until(to)).map(|offset| self.get(to.minus(offset))).collect()
    }

    pub fn add(&mut self, entry: Entry) {
        self.entries.insert(entry.timestamp, entry);
    }

    pub fn remove(&mut self, day: Timestamp) -> Option<Entry> {
        self.entries.remove(&day)
    }

    /// Every stored entry, newest first.
    pub fn get_known(&self) -> Vec<Entry> {
        self.entries.values().rev().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn oldest(&self) -> Option<Timestamp> {
        self.entries.keys().next().copied()
    }

    pub fn newest(&self) -> Option<Timestamp> {
        self.entries.keys().next_back().copied()
    }

    /// Replace the contents of this list with entries derived from `original`.
    ///
    /// Yes/no habits go through interval inference and gain `YES_AUTO`
    /// days; numerical habits are copied as they are. Days that end up
    /// `UNKNOWN` without notes are not stored.
    pub fn recompute_from(&mut self, original: &EntryList, frequency: Frequency, is_numerical: bool) {
        self.clear();
        let known = original.get_known();
        if is_numerical {
            for entry in known {
                self.add(entry);
            }
            debug!(entries = self.len(), "copied numerical entries");
            return;
        }

        let mut intervals = build_intervals(frequency, &known);
        snap_intervals_together(&mut intervals);
        for entry in build_entries_from_intervals(&known, &intervals) {
            if !entry.value.is_unknown() || !entry.notes.is_empty() {
                self.add(entry);
            }
        }
        debug!(
            raw = known.len(),
            intervals = intervals.len(),
            computed = self.len(),
            %frequency,
            "recomputed entries"
        );
    }
}

impl EntrySource for EntryList {
    fn add_or_replace(&mut self, entry: Entry) -> Result<()> {
        self.add(entry);
        Ok(())
    }

    fn remove(&mut self, day: Timestamp) -> Result<()> {
        EntryList::remove(self, day);
        Ok(())
    }

    fn get_known(&self) -> Result<Vec<Entry>> {
        Ok(EntryList::get_known(self))
    }

    fn clear(&mut self) -> Result<()> {
        EntryList::clear(self);
        Ok(())
    }
}

/// Sort entries newest-first and keep one per day (the last one given).
pub fn normalize_entries(entries: impl IntoIterator<Item = Entry>) -> Vec<Entry> {
    EntryList::from_entries(entries).get_known()
}
