//! Interval inference for yes/no habits with slack in their frequency.

use crate::models::{Entry, EntryValue, Frequency, Interval, Timestamp};

/// Group manual successes into intervals that satisfy `frequency`.
///
/// `entries` must be sorted newest-first. Only `YES_MANUAL` entries take
/// part. Every window of `numerator` consecutive successes whose oldest and
/// newest days are less than `denominator` days apart yields one interval
/// starting at the oldest success and spanning `denominator` days. The
/// result keeps the newest window first and may contain gaps.
///
/// Monthly frequencies (denominator 30 or 31) follow the calendar instead:
/// see [`window_size`].
pub fn build_intervals(frequency: Frequency, entries: &[Entry]) -> Vec<Interval> {
    let manual: Vec<_> = entries
        .iter()
        .filter(|e| matches!(e.value, EntryValue::YesManual))
        .map(|e| e.timestamp)
        .collect();

    let num = frequency.numerator() as usize;
    let den = i64::from(frequency.denominator());

    manual
        .windows(num)
        .filter_map(|window| {
            let center = window[0];
            let begin = window[num - 1];
            let size = window_size(den, begin);
            (begin.days_until(center) < size)
                .then(|| Interval::new(begin, center, begin.plus(size - 1)))
        })
        .collect()
}

/// Days spanned by an interval starting at `begin`.
///
/// For a denominator of 30 or 31 this is the length of `begin`'s month, or
/// of the following month when `begin` is the last day of its own.
pub fn window_size(denominator: i64, begin: Timestamp) -> i64 {
    match denominator {
        30 | 31 if begin.is_last_day_of_month() => begin.plus(1).month_length(),
        30 | 31 => begin.month_length(),
        den => den,
    }
}

/// Slide intervals into the past so each one ends right before its newer
/// neighbour begins.
///
/// Runs from the second-newest interval to the oldest. An interval is only
/// moved when it reaches into its newer neighbour, and never far enough to
/// push its `center` outside of it. Lengths are unchanged.
pub fn snap_intervals_together(intervals: &mut [Interval]) {
    for i in 1..intervals.len() {
        let prev = intervals[i - 1];
        let curr = intervals[i];
        let overlap = prev.begin.days_until(curr.end);
        if overlap >= 0 {
            let slack = curr.center.days_until(curr.end);
            intervals[i] = curr.shifted_back(slack.min(overlap + 1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> Timestamp {
        Timestamp::from_ymd(2024, 3, 31).unwrap()
    }

    fn day(offset: i64) -> Timestamp {
        today().minus(offset)
    }

    fn yes(offsets: &[i64]) -> Vec<Entry> {
        offsets
            .iter()
            .map(|&o| Entry::new(day(o), EntryValue::YesManual))
            .collect()
    }

    #[test]
    fn weekly_habit_gets_one_interval_per_success() {
        let actual = build_intervals(Frequency::WEEKLY, &yes(&[8, 18, 23]));
        let expected = vec![
            Interval::new(day(8), day(8), day(2)),
            Interval::new(day(18), day(18), day(12)),
            Interval::new(day(23), day(23), day(17)),
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn daily_habit_intervals_cover_single_days() {
        let actual = build_intervals(Frequency::DAILY, &yes(&[8, 18, 23]));
        let expected = vec![
            Interval::new(day(8), day(8), day(8)),
            Interval::new(day(18), day(18), day(18)),
            Interval::new(day(23), day(23), day(23)),
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn windows_too_far_apart_emit_nothing() {
        let actual = build_intervals(Frequency::TWO_TIMES_PER_WEEK, &yes(&[8, 15, 18, 22, 23]));
        let expected = vec![
            Interval::new(day(18), day(15), day(12)),
            Interval::new(day(22), day(18), day(16)),
            Interval::new(day(23), day(22), day(17)),
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn non_manual_entries_are_ignored() {
        let entries = vec![
            Entry::new(day(10), EntryValue::YesManual),
            Entry::new(day(20), EntryValue::Skip),
            Entry::new(day(25), EntryValue::YesAuto),
            Entry::new(day(30), EntryValue::YesManual),
        ];
        let actual = build_intervals(Frequency::new(1, 3).unwrap(), &entries);
        let expected = vec![
            Interval::new(day(10), day(10), day(8)),
            Interval::new(day(30), day(30), day(28)),
        ];
        assert_eq!(actual, expected);
    }

    #[test]
    fn two_of_three_spans_both_successes() {
        let actual = build_intervals(Frequency::new(2, 3).unwrap(), &yes(&[0, 2]));
        assert_eq!(actual, vec![Interval::new(day(2), day(0), day(0))]);
    }

    #[test]
    fn monthly_intervals_follow_month_length() {
        let on = |y, m, d| Entry::new(Timestamp::from_ymd(y, m, d).unwrap(), EntryValue::YesManual);
        let ymd = |y, m, d| Timestamp::from_ymd(y, m, d).unwrap();
        let monthly = Frequency::new(1, 30).unwrap();

        // last day of January: February's length decides
        assert_eq!(
            build_intervals(monthly, &[on(2024, 1, 31)]),
            vec![Interval::new(ymd(2024, 1, 31), ymd(2024, 1, 31), ymd(2024, 2, 28))]
        );
        assert_eq!(
            build_intervals(monthly, &[on(2024, 2, 10)]),
            vec![Interval::new(ymd(2024, 2, 10), ymd(2024, 2, 10), ymd(2024, 3, 9))]
        );
        assert_eq!(
            build_intervals(Frequency::new(1, 31).unwrap(), &[on(2023, 4, 15)]),
            vec![Interval::new(ymd(2023, 4, 15), ymd(2023, 4, 15), ymd(2023, 5, 14))]
        );

        // 28 days apart fits a 30-day window but not February 2023
        let two = Frequency::new(2, 30).unwrap();
        assert!(build_intervals(two, &[on(2023, 3, 1), on(2023, 2, 1)]).is_empty());
        assert_eq!(build_intervals(two, &[on(2023, 3, 31), on(2023, 3, 2)]).len(), 1);
    }

    #[test]
    fn window_size_only_changes_monthly_denominators() {
        let end_of_feb = Timestamp::from_ymd(2023, 2, 28).unwrap();
        assert_eq!(window_size(7, end_of_feb), 7);
        assert_eq!(window_size(29, end_of_feb), 29);
        assert_eq!(window_size(30, end_of_feb), 31);
        assert_eq!(window_size(31, end_of_feb.minus(1)), 28);
    }

    #[test]
    fn fewer_successes_than_numerator() {
        assert!(build_intervals(Frequency::THREE_TIMES_PER_WEEK, &yes(&[1, 2])).is_empty());
        assert!(build_intervals(Frequency::DAILY, &[]).is_empty());
    }

    #[test]
    fn snapping_removes_overlaps() {
        let mut intervals = vec![
            Interval::new(day(8), day(8), day(2)),
            Interval::new(day(12), day(12), day(6)),
            Interval::new(day(20), day(20), day(14)),
            Interval::new(day(27), day(27), day(21)),
        ];
        snap_intervals_together(&mut intervals);
        let expected = vec![
            Interval::new(day(8), day(8), day(2)),
            Interval::new(day(15), day(12), day(9)),
            Interval::new(day(22), day(20), day(16)),
            Interval::new(day(29), day(27), day(23)),
        ];
        assert_eq!(intervals, expected);
    }

    #[test]
    fn snapping_is_capped_by_center() {
        let mut intervals = vec![
            Interval::new(day(6), day(4), day(0)),
            Interval::new(day(11), day(8), day(5)),
        ];
        snap_intervals_together(&mut intervals);
        assert_eq!(intervals[1], Interval::new(day(13), day(8), day(7)));

        // center already at end: nothing to give
        let mut pinned = vec![
            Interval::new(day(6), day(4), day(0)),
            Interval::new(day(9), day(3), day(3)),
        ];
        snap_intervals_together(&mut pinned);
        assert_eq!(pinned[1], Interval::new(day(9), day(3), day(3)));
    }

    #[test]
    fn snapping_leaves_disjoint_intervals_alone() {
        let mut intervals = vec![
            Interval::new(day(6), day(6), day(0)),
            Interval::new(day(20), day(20), day(14)),
        ];
        let before = intervals.clone();
        snap_intervals_together(&mut intervals);
        assert_eq!(intervals, before);
    }
}
