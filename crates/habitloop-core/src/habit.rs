//! The habit aggregate.
//!
//! A [`Habit`] owns its raw entries and a derived snapshot (materialized
//! entries, scores, streaks). Every mutation rebuilds the snapshot from
//! scratch into a fresh [`DerivedState`] and publishes it with a single
//! `Arc` swap, so readers holding a [`SharedDerived`] handle on another
//! thread see either the old state or the new one, never a mix.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::entries::{EntryList, EntrySource};
use crate::error::{Result, ValidationError};
use crate::events::HabitEvent;
use crate::models::{Entry, EntryValue, Frequency, Timestamp};
use crate::scores::ScoreList;
use crate::streaks::{Streak, StreakList, SuccessRule};

/// Direction of a numerical target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericalTarget {
    AtLeast,
    AtMost,
}

/// Yes/no habits get interval inference; numerical habits record amounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HabitKind {
    #[default]
    YesNo,
    Numerical {
        target_type: NumericalTarget,
        target_value: f64,
        #[serde(default)]
        unit: String,
    },
}

impl HabitKind {
    pub fn is_numerical(&self) -> bool {
        matches!(self, HabitKind::Numerical { .. })
    }

    pub fn success_rule(&self) -> SuccessRule {
        match self {
            HabitKind::YesNo => SuccessRule::YesNo,
            HabitKind::Numerical { target_type: NumericalTarget::AtLeast, target_value, .. } => {
                SuccessRule::AtLeast(*target_value)
            }
            HabitKind::Numerical { target_type: NumericalTarget::AtMost, target_value, .. } => {
                SuccessRule::AtMost(*target_value)
            }
        }
    }

    /// Fraction of the target achieved by `value`, in `[0, 1]`.
    ///
    /// Days without an amount count as zero. Yes/no habits map successes to
    /// one and everything else to zero.
    pub fn completion_ratio(&self, value: &EntryValue) -> f64 {
        let HabitKind::Numerical { target_type, target_value, .. } = self else {
            return if value.is_yes() { 1.0 } else { 0.0 };
        };
        let amount = value.amount().unwrap_or(0.0).max(0.0);
        let target = *target_value;
        match target_type {
            NumericalTarget::AtLeast if target > 0.0 => (amount / target).min(1.0),
            NumericalTarget::AtLeast => 1.0,
            NumericalTarget::AtMost if target > 0.0 => (1.0 - (amount - target) / target).clamp(0.0, 1.0),
            NumericalTarget::AtMost => {
                if amount > 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
        }
    }

    /// Check that a user-supplied value fits this kind.
    pub fn validate(&self, value: &EntryValue) -> Result<(), ValidationError> {
        let ok = match (self, value) {
            (_, EntryValue::YesAuto) => false,
            (HabitKind::YesNo, EntryValue::Amount(_)) => false,
            (HabitKind::Numerical { .. }, EntryValue::No | EntryValue::YesManual) => false,
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(ValidationError::InvalidEntryValue {
                value: value.to_string(),
                message: if self.is_numerical() {
                    "numerical habits take an amount, skip or unknown".into()
                } else {
                    "yes/no habits take yes, no, skip or unknown".into()
                },
            })
        }
    }
}

/// Descriptive data about a habit. Changing the frequency or kind goes
/// through [`Habit`] so the derived state stays in sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitInfo {
    pub id: Option<i64>,
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub description: String,
    pub frequency: Frequency,
    pub kind: HabitKind,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub position: i64,
}

impl HabitInfo {
    pub fn new(name: impl Into<String>, frequency: Frequency, kind: HabitKind) -> Self {
        Self {
            id: None,
            uuid: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            question: String::new(),
            description: String::new(),
            frequency,
            kind,
            archived: false,
            position: 0,
        }
    }
}

/// Everything computed from a habit's raw entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedState {
    pub computed: EntryList,
    pub scores: ScoreList,
    pub streaks: StreakList,
}

impl DerivedState {
    /// Run the whole pipeline. Scores and streaks cover the days from the
    /// oldest derived entry up to `today + days_ahead` (or the newest entry,
    /// if later).
    pub fn derive(
        raw: &EntryList,
        frequency: Frequency,
        kind: &HabitKind,
        today: Timestamp,
        days_ahead: i64,
    ) -> Self {
        let mut computed = EntryList::new();
        computed.recompute_from(raw, frequency, kind.is_numerical());

        let mut to = today.plus(days_ahead.max(0));
        if let Some(newest) = computed.newest() {
            to = to.max(newest);
        }
        let from = computed.oldest().unwrap_or(to).min(to);

        let mut timeline = computed.get_by_interval(from, to);
        timeline.reverse();

        let mut scores = ScoreList::new();
        if kind.is_numerical() {
            let ratios: Vec<Entry> = timeline
                .iter()
                .map(|e| match e.value {
                    EntryValue::Skip => e.clone(),
                    ref v => Entry::new(e.timestamp, EntryValue::Amount(kind.completion_ratio(v))),
                })
                .collect();
            scores.recompute(&ratios, frequency, true);
        } else {
            scores.recompute(&timeline, frequency, false);
        }

        let mut streaks = StreakList::new();
        streaks.recompute(&timeline, kind.success_rule());

        Self {
            computed,
            scores,
            streaks,
        }
    }

    /// Whether a display cache holding `other` needs refreshing.
    pub fn differs_from(&self, other: &DerivedState) -> bool {
        self != other
    }
}

/// Cloneable read handle on a habit's published derived state.
#[derive(Debug, Clone, Default)]
pub struct SharedDerived(Arc<RwLock<Arc<DerivedState>>>);

impl SharedDerived {
    /// Current snapshot. Cheap; never blocks on a recompute in progress.
    pub fn load(&self) -> Arc<DerivedState> {
        Arc::clone(&self.0.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn publish(&self, state: DerivedState) {
        let state = Arc::new(state);
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Compact view of a habit used by list screens and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitSummary {
    pub id: Option<i64>,
    pub uuid: String,
    pub name: String,
    pub frequency: Frequency,
    pub kind: HabitKind,
    pub archived: bool,
    pub today: Timestamp,
    pub today_value: EntryValue,
    pub completed_today: bool,
    pub score: f64,
    pub current_streak: Option<Streak>,
    pub best_streak: Option<Streak>,
}

pub struct Habit {
    info: HabitInfo,
    raw: EntryList,
    derived: SharedDerived,
    subscribers: Vec<Sender<HabitEvent>>,
    days_ahead: i64,
    pinned_today: Option<Timestamp>,
}

impl Habit {
    /// Furthest scores can be extended past today.
    pub const MAX_DAYS_AHEAD: i64 = 3650;

    pub fn new(info: HabitInfo) -> Self {
        let mut habit = Self {
            info,
            raw: EntryList::new(),
            derived: SharedDerived::default(),
            subscribers: Vec::new(),
            days_ahead: 0,
            pinned_today: None,
        };
        habit.recompute();
        habit
    }

    /// Treat `day` as today instead of reading the clock.
    pub fn with_today(mut self, day: Timestamp) -> Self {
        self.pinned_today = Some(day);
        self.recompute();
        self
    }

    /// Extend scores this many days past today, up to
    /// [`Habit::MAX_DAYS_AHEAD`].
    pub fn with_days_ahead(mut self, days: i64) -> Self {
        self.days_ahead = days.clamp(0, Self::MAX_DAYS_AHEAD);
        self.recompute();
        self
    }

    pub fn info(&self) -> &HabitInfo {
        &self.info
    }

    pub fn uuid(&self) -> &str {
        &self.info.uuid
    }

    pub fn frequency(&self) -> Frequency {
        self.info.frequency
    }

    pub fn kind(&self) -> &HabitKind {
        &self.info.kind
    }

    pub fn is_numerical(&self) -> bool {
        self.info.kind.is_numerical()
    }

    pub fn today(&self) -> Timestamp {
        self.pinned_today.unwrap_or_else(Timestamp::today)
    }

    pub fn set_id(&mut self, id: i64) {
        self.info.id = Some(id);
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.info.name = name.into();
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.info.question = question.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.info.description = description.into();
    }

    pub fn set_archived(&mut self, archived: bool) {
        self.info.archived = archived;
    }

    pub fn raw_entries(&self) -> &EntryList {
        &self.raw
    }

    /// Record a day's value and recompute.
    ///
    /// An `UNKNOWN` value without notes carries no information and clears
    /// the day instead.
    pub fn set_entry(&mut self, entry: Entry) -> Result<HabitEvent, ValidationError> {
        self.info.kind.validate(&entry.value)?;
        if entry.value.is_unknown() && entry.notes.is_empty() {
            return Ok(self.remove_entry(entry.timestamp));
        }

        let event = HabitEvent::EntryRecorded {
            habit_uuid: self.info.uuid.clone(),
            day: entry.timestamp,
            value: entry.value,
            at: Utc::now(),
        };
        self.raw.add(entry);
        self.notify(&event);
        self.recompute();
        Ok(event)
    }

    pub fn remove_entry(&mut self, day: Timestamp) -> HabitEvent {
        self.raw.remove(day);
        let event = HabitEvent::EntryRemoved {
            habit_uuid: self.info.uuid.clone(),
            day,
            at: Utc::now(),
        };
        self.notify(&event);
        self.recompute();
        event
    }

    /// Replace the raw entries with a snapshot of `source`.
    pub fn load_entries(&mut self, source: &dyn EntrySource) -> Result<HabitEvent> {
        self.raw = EntryList::from_entries(source.get_known()?);
        let event = HabitEvent::EntriesReloaded {
            habit_uuid: self.info.uuid.clone(),
            count: self.raw.len(),
            at: Utc::now(),
        };
        self.notify(&event);
        self.recompute();
        Ok(event)
    }

    pub fn set_frequency(&mut self, frequency: Frequency) -> HabitEvent {
        let event = HabitEvent::FrequencyChanged {
            habit_uuid: self.info.uuid.clone(),
            from: self.info.frequency,
            to: frequency,
            at: Utc::now(),
        };
        self.info.frequency = frequency;
        self.notify(&event);
        self.recompute();
        event
    }

    pub fn set_kind(&mut self, kind: HabitKind) -> HabitEvent {
        self.info.kind = kind;
        let event = HabitEvent::KindChanged {
            habit_uuid: self.info.uuid.clone(),
            at: Utc::now(),
        };
        self.notify(&event);
        self.recompute();
        event
    }

    /// Rebuild derived state from the raw entries and publish it.
    ///
    /// Idempotent: the same raw entries always publish an equal state.
    pub fn recompute(&mut self) {
        let state = DerivedState::derive(
            &self.raw,
            self.info.frequency,
            &self.info.kind,
            self.today(),
            self.days_ahead,
        );
        let event = HabitEvent::Recomputed {
            habit_uuid: self.info.uuid.clone(),
            computed_entries: state.computed.len(),
            streaks: state.streaks.len(),
            at: Utc::now(),
        };
        debug!(habit = %self.info.uuid, computed = state.computed.len(), "publishing derived state");
        self.derived.publish(state);
        self.notify(&event);
    }

    /// Current derived snapshot.
    pub fn derived(&self) -> Arc<DerivedState> {
        self.derived.load()
    }

    /// Handle for readers that outlive a borrow of the habit, e.g. a list
    /// cache on another thread.
    pub fn shared(&self) -> SharedDerived {
        self.derived.clone()
    }

    /// Receive every event produced by this habit from now on.
    pub fn subscribe(&mut self) -> Receiver<HabitEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: &HabitEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Whether `day` needs no more attention from the user.
    ///
    /// A skipped yes/no day counts as completed here even though it breaks
    /// a streak: the day is settled, not maintained.
    pub fn is_completed_on(&self, day: Timestamp) -> bool {
        let value = self.derived().computed.get(day).value;
        match self.info.kind.success_rule() {
            SuccessRule::YesNo => !matches!(value, EntryValue::No | EntryValue::Unknown),
            rule => rule.is_met(&value),
        }
    }

    pub fn is_entered_on(&self, day: Timestamp) -> bool {
        !self.derived().computed.get(day).value.is_unknown()
    }

    pub fn summary(&self) -> HabitSummary {
        let derived = self.derived();
        let today = self.today();
        let current_streak = derived
            .streaks
            .newest()
            .filter(|s| s.end >= today.minus(1));
        HabitSummary {
            id: self.info.id,
            uuid: self.info.uuid.clone(),
            name: self.info.name.clone(),
            frequency: self.info.frequency,
            kind: self.info.kind.clone(),
            archived: self.info.archived,
            today,
            today_value: derived.computed.get(today).value,
            completed_today: self.is_completed_on(today),
            score: derived.scores.get(today).value,
            current_streak,
            best_streak: derived.streaks.get_best(1).first().copied(),
        }
    }
}

impl std::fmt::Debug for Habit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Habit")
            .field("info", &self.info)
            .field("raw_entries", &self.raw.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
