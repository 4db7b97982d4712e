//! Best-streak extraction over a materialized timeline.

use serde::{Deserialize, Serialize};

use crate::models::{Entry, EntryValue, Timestamp};

/// An unbroken run of successful days, endpoints included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Streak {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Length in days.
    pub fn length(&self) -> i64 {
        self.start.days_until(self.end) + 1
    }

    pub fn is_newer_than(&self, other: &Streak) -> bool {
        self.end.is_newer_than(other.end)
    }
}

/// What counts as a maintained day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessRule {
    /// `YES_MANUAL` or `YES_AUTO`
    YesNo,
    /// Amount at or above the target
    AtLeast(f64),
    /// Amount at or below the target
    AtMost(f64),
}

impl SuccessRule {
    pub fn is_met(&self, value: &EntryValue) -> bool {
        match (self, value) {
            (SuccessRule::YesNo, v) => v.is_yes(),
            (SuccessRule::AtLeast(target), EntryValue::Amount(v)) => v >= target,
            (SuccessRule::AtMost(target), EntryValue::Amount(v)) => v <= target,
            _ => false,
        }
    }
}

/// All maximal runs of consecutive maintained days, oldest first.
///
/// Entries may come in any order; a missing day breaks a run.
pub fn find_streaks(entries: &[Entry], rule: SuccessRule) -> Vec<Streak> {
    let mut days: Vec<Timestamp> = entries
        .iter()
        .filter(|e| rule.is_met(&e.value))
        .map(|e| e.timestamp)
        .collect();
    days.sort_unstable();
    days.dedup();

    let mut streaks = Vec::new();
    let mut days = days.into_iter();
    let Some(first) = days.next() else {
        return streaks;
    };
    let mut current = Streak::new(first, first);
    for day in days {
        if current.end.days_until(day) == 1 {
            current.end = day;
        } else {
            streaks.push(current);
            current = Streak::new(day, day);
        }
    }
    streaks.push(current);
    streaks
}

/// Keep the `limit` longest streaks (ties go to the newer one), returned
/// newest first.
pub fn rank_best(mut streaks: Vec<Streak>, limit: usize) -> Vec<Streak> {
    streaks.sort_by(|a, b| b.length().cmp(&a.length()).then(b.end.cmp(&a.end)));
    streaks.truncate(limit);
    streaks.sort_by(|a, b| b.end.cmp(&a.end));
    streaks
}

/// Up to `limit` best yes/no streaks in `entries`, newest first.
pub fn best_streaks(entries: &[Entry], limit: usize) -> Vec<Streak> {
    rank_best(find_streaks(entries, SuccessRule::YesNo), limit)
}

/// Every streak of a habit, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreakList {
    streaks: Vec<Streak>,
}

impl StreakList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recompute(&mut self, entries: &[Entry], rule: SuccessRule) {
        self.streaks = find_streaks(entries, rule);
    }

    pub fn get_best(&self, limit: usize) -> Vec<Streak> {
        rank_best(self.streaks.clone(), limit)
    }

    /// Most recent streak, if any.
    pub fn newest(&self) -> Option<Streak> {
        self.streaks.last().copied()
    }

    pub fn all(&self) -> &[Streak] {
        &self.streaks
    }

    pub fn len(&self) -> usize {
        self.streaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streaks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> Timestamp {
        Timestamp::from_ymd(2024, 3, 31).unwrap().minus(offset)
    }

    /// Newest-first values starting at offset 0.
    fn timeline(values: &[EntryValue]) -> Vec<Entry> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Entry::new(day(i as i64), *v))
            .collect()
    }

    use EntryValue::{No, Skip, Unknown, YesAuto as A, YesManual as Y};

    #[test]
    fn ranks_longer_streak_first() {
        // offsets 0..=4 (length 5), gap, offsets 6..=8 (length 3)
        let entries = timeline(&[Y, Y, A, Y, Y, No, Y, A, Y]);
        let best = best_streaks(&entries, 5);
        assert_eq!(best, vec![Streak::new(day(4), day(0)), Streak::new(day(8), day(6))]);
        assert_eq!(best[0].length(), 5);
        assert_eq!(best[1].length(), 3);
    }

    #[test]
    fn selection_by_length_then_newest_first() {
        // offsets 0..=2 (length 3), gap, offsets 4..=8 (length 5)
        let entries = timeline(&[Y, A, Y, No, Y, Y, A, A, Y]);
        let best = best_streaks(&entries, 5);
        assert_eq!(best, vec![Streak::new(day(2), day(0)), Streak::new(day(8), day(4))]);

        let top = best_streaks(&entries, 1);
        assert_eq!(top, vec![Streak::new(day(8), day(4))]);
    }

    #[test]
    fn ties_prefer_recent_streaks() {
        let entries = timeline(&[Y, Y, No, Y, Y, No, Y, Y]);
        let best = best_streaks(&entries, 2);
        assert_eq!(best, vec![Streak::new(day(1), day(0)), Streak::new(day(4), day(3))]);
    }

    #[test]
    fn skip_and_unknown_break_streaks() {
        let entries = timeline(&[Y, Skip, Y, Unknown, Y]);
        let streaks = find_streaks(&entries, SuccessRule::YesNo);
        assert_eq!(streaks.len(), 3);
        assert!(streaks.iter().all(|s| s.length() == 1));
    }

    #[test]
    fn missing_days_break_streaks() {
        let entries = vec![Entry::new(day(0), Y), Entry::new(day(2), Y)];
        assert_eq!(find_streaks(&entries, SuccessRule::YesNo).len(), 2);
    }

    #[test]
    fn numerical_rules() {
        let entries = timeline(&[
            EntryValue::Amount(10.0),
            EntryValue::Amount(12.0),
            EntryValue::Amount(3.0),
            Unknown,
        ]);
        let at_least = find_streaks(&entries, SuccessRule::AtLeast(10.0));
        assert_eq!(at_least, vec![Streak::new(day(1), day(0))]);
        let at_most = find_streaks(&entries, SuccessRule::AtMost(5.0));
        assert_eq!(at_most, vec![Streak::new(day(2), day(2))]);
    }

    #[test]
    fn empty_history_has_no_streaks() {
        assert!(best_streaks(&[], 10).is_empty());
        let list = StreakList::new();
        assert!(list.get_best(3).is_empty());
        assert_eq!(list.newest(), None);
    }

    #[test]
    fn streak_list_keeps_all() {
        let mut list = StreakList::new();
        list.recompute(&timeline(&[Y, No, Y, Y, No, Y]), SuccessRule::YesNo);
        assert_eq!(list.len(), 3);
        assert_eq!(list.newest(), Some(Streak::new(day(0), day(0))));
        assert_eq!(list.get_best(1), vec![Streak::new(day(3), day(2))]);
    }
}
