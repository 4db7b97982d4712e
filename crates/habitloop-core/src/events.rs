use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{EntryValue, Frequency, Timestamp};

/// Every change to a habit produces an Event.
/// Mutating calls return the outcome directly; list caches subscribe to
/// the stream and refresh on `Recomputed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HabitEvent {
    EntryRecorded {
        habit_uuid: String,
        day: Timestamp,
        value: EntryValue,
        at: DateTime<Utc>,
    },
    EntryRemoved {
        habit_uuid: String,
        day: Timestamp,
        at: DateTime<Utc>,
    },
    /// Raw entries were replaced by a fresh snapshot from a source.
    EntriesReloaded {
        habit_uuid: String,
        count: usize,
        at: DateTime<Utc>,
    },
    FrequencyChanged {
        habit_uuid: String,
        from: Frequency,
        to: Frequency,
        at: DateTime<Utc>,
    },
    KindChanged {
        habit_uuid: String,
        at: DateTime<Utc>,
    },
    /// Derived entries, scores and streaks were rebuilt and published.
    Recomputed {
        habit_uuid: String,
        computed_entries: usize,
        streaks: usize,
        at: DateTime<Utc>,
    },
}

impl HabitEvent {
    pub fn habit_uuid(&self) -> &str {
        match self {
            HabitEvent::EntryRecorded { habit_uuid, .. }
            | HabitEvent::EntryRemoved { habit_uuid, .. }
            | HabitEvent::EntriesReloaded { habit_uuid, .. }
            | HabitEvent::FrequencyChanged { habit_uuid, .. }
            | HabitEvent::KindChanged { habit_uuid, .. }
            | HabitEvent::Recomputed { habit_uuid, .. } => habit_uuid,
        }
    }

    /// Short user-facing description of what happened.
    pub fn message(&self) -> String {
        match self {
            HabitEvent::EntryRecorded { day, value, .. } => match value {
                EntryValue::YesManual => format!("Marked {day} as done"),
                EntryValue::No => format!("Marked {day} as not done"),
                EntryValue::Skip => format!("Skipped {day}"),
                EntryValue::Amount(v) => format!("Recorded {v} on {day}"),
                EntryValue::Unknown | EntryValue::YesAuto => format!("Updated {day}"),
            },
            HabitEvent::EntryRemoved { day, .. } => format!("Cleared {day}"),
            HabitEvent::EntriesReloaded { count, .. } => format!("Loaded {count} entries"),
            HabitEvent::FrequencyChanged { from, to, .. } => {
                format!("Frequency changed from {from} to {to}")
            }
            HabitEvent::KindChanged { .. } => "Habit type changed".to_string(),
            HabitEvent::Recomputed { computed_entries, streaks, .. } => {
                format!("Recomputed {computed_entries} days and {streaks} streaks")
            }
        }
    }
}
