use crate::models::{Entry, EntryValue, Interval};

/// Merge raw entries and intervals into a dense, newest-first timeline.
///
/// Days range from the oldest to the newest timestamp referenced by either
/// input. Days outside every interval start as `UNKNOWN`, days inside one
/// become `YES_AUTO`, and a raw entry then replaces the day only when the
/// day is still `UNKNOWN` or the raw value is `SKIP` or `YES_MANUAL`. A raw
/// `NO` therefore never erases an inferred success; its notes are kept.
pub fn build_entries_from_intervals(original: &[Entry], intervals: &[Interval]) -> Vec<Entry> {
    let mut days = original
        .iter()
        .map(|e| e.timestamp)
        .chain(intervals.iter().flat_map(|i| [i.begin, i.end]));

    let Some(first) = days.next() else {
        return Vec::new();
    };
    let (from, to) = days.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));

    let len = from.days_until(to) + 1;
    let mut result: Vec<Entry> = (0..len).map(|offset| Entry::unknown(to.minus(offset))).collect();

    for interval in intervals {
        let mut current = interval.end;
        while current >= interval.begin {
            result[current.days_until(to) as usize] = Entry::new(current, EntryValue::YesAuto);
            current = current.minus(1);
        }
    }

    for entry in original {
        let slot = &mut result[entry.timestamp.days_until(to) as usize];
        let overrides = matches!(entry.value, EntryValue::Skip | EntryValue::YesManual);
        if slot.value.is_unknown() || overrides {
            *slot = entry.clone();
        } else if !entry.notes.is_empty() {
            slot.notes = entry.notes.clone();
        }
    }

    result
}
