//! Integration tests for on-disk habit storage feeding the engine.

use chrono::Weekday;
use habitloop_core::{
    grouped_sum, Database, Entry, EntrySource, EntryValue, Frequency, HabitInfo, HabitKind,
    Timestamp, TruncateField,
};

fn today() -> Timestamp {
    Timestamp::from_ymd(2024, 3, 31).unwrap()
}

fn day(offset: i64) -> Timestamp {
    today().minus(offset)
}

#[test]
fn test_entries_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitloop.db");

    let id = {
        let db = Database::open_at(&path).unwrap();
        let id = db
            .insert_habit(&HabitInfo::new("Walk", Frequency::TWO_TIMES_PER_WEEK, HabitKind::YesNo))
            .unwrap();
        let mut entries = db.entries(id);
        entries.add_or_replace(Entry::new(day(1), EntryValue::YesManual)).unwrap();
        entries.add_or_replace(Entry::new(day(4), EntryValue::YesManual)).unwrap();
        entries
            .add_or_replace(Entry::new(day(2), EntryValue::No).with_notes("rain"))
            .unwrap();
        id
    };

    let db = Database::open_at(&path).unwrap();
    let habit = db.load_habit(id, Some(today()), 0).unwrap();
    assert_eq!(habit.raw_entries().len(), 3);

    let computed = &habit.derived().computed;
    assert_eq!(computed.get(day(4)).value, EntryValue::YesManual);
    assert_eq!(computed.get(day(3)).value, EntryValue::YesAuto);
    // a raw NO inside an interval keeps its note but not its value
    assert_eq!(computed.get(day(2)).value, EntryValue::YesAuto);
    assert_eq!(computed.get(day(2)).notes, "rain");
    assert_eq!(computed.get(day(1)).value, EntryValue::YesManual);
}

#[test]
fn test_habit_mutation_writes_through() {
    let db = Database::open_memory().unwrap();
    let id = db
        .insert_habit(&HabitInfo::new("Floss", Frequency::DAILY, HabitKind::YesNo))
        .unwrap();

    let mut habit = db.load_habit(id, Some(today()), 0).unwrap();
    let entry = Entry::new(day(0), EntryValue::Skip);
    habit.set_entry(entry.clone()).unwrap();
    db.entries(id).add_or_replace(entry).unwrap();

    habit.set_frequency(Frequency::WEEKLY);
    db.update_habit(habit.info()).unwrap();

    let reloaded = db.load_habit(id, Some(today()), 0).unwrap();
    assert_eq!(reloaded.frequency(), Frequency::WEEKLY);
    assert!(!reloaded.derived().differs_from(&habit.derived()));
}

#[test]
fn test_days_ahead_extends_scores() {
    let db = Database::open_memory().unwrap();
    let id = db
        .insert_habit(&HabitInfo::new("Run", Frequency::DAILY, HabitKind::YesNo))
        .unwrap();
    db.entries(id)
        .add_or_replace(Entry::new(day(0), EntryValue::YesManual))
        .unwrap();

    let habit = db.load_habit(id, Some(today()), 3).unwrap();
    let scores = &habit.derived().scores;
    assert_eq!(scores.len(), 4);
    assert!(scores.get(today().plus(3)).value < scores.get(today()).value);
}

#[test]
fn test_grouped_sum_over_stored_entries() {
    let db = Database::open_memory().unwrap();
    let id = db
        .insert_habit(&HabitInfo::new("Gym", Frequency::DAILY, HabitKind::YesNo))
        .unwrap();
    let mut entries = db.entries(id);
    // March 2024: 3 successes, February: 1 success plus a skip
    for (y, m, d, value) in [
        (2024, 3, 30, EntryValue::YesManual),
        (2024, 3, 12, EntryValue::YesManual),
        (2024, 3, 1, EntryValue::YesManual),
        (2024, 3, 2, EntryValue::No),
        (2024, 2, 20, EntryValue::YesManual),
        (2024, 2, 21, EntryValue::Skip),
    ] {
        entries
            .add_or_replace(Entry::new(Timestamp::from_ymd(y, m, d).unwrap(), value))
            .unwrap();
    }

    let known = entries.get_known().unwrap();
    let months = grouped_sum(&known, TruncateField::Month, Weekday::Mon, false);
    assert_eq!(months.len(), 2);
    assert_eq!(months[0].start, Timestamp::from_ymd(2024, 3, 1).unwrap());
    assert_eq!(months[0].total, 3.0);
    assert_eq!(months[1].total, 1.0);
}
