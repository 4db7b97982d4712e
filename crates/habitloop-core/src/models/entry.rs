use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Timestamp;
use crate::error::ValidationError;

/// Value recorded (or derived) for a single day.
///
/// Yes/no variants are listed from lowest to highest priority. Numerical
/// habits record an [`EntryValue::Amount`] instead and never get inferred
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryValue {
    /// No information about this day
    #[default]
    Unknown,
    /// Expected but not performed
    No,
    /// Not performed, but implied by frequency slack
    YesAuto,
    /// Explicitly performed
    YesManual,
    /// Explicitly exempted
    Skip,
    /// Raw magnitude for numerical habits
    Amount(f64),
}

impl EntryValue {
    /// Integer code of a yes/no value (`UNKNOWN = -1` .. `SKIP = 3`).
    pub fn code(&self) -> Option<i32> {
        match self {
            EntryValue::Unknown => Some(-1),
            EntryValue::No => Some(0),
            EntryValue::YesAuto => Some(1),
            EntryValue::YesManual => Some(2),
            EntryValue::Skip => Some(3),
            EntryValue::Amount(_) => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, EntryValue::Unknown)
    }

    /// `YES_MANUAL` or `YES_AUTO`.
    pub fn is_yes(&self) -> bool {
        matches!(self, EntryValue::YesManual | EntryValue::YesAuto)
    }

    pub fn amount(&self) -> Option<f64> {
        match self {
            EntryValue::Amount(v) => Some(*v),
            _ => None,
        }
    }

    /// Storage tag; amounts are stored alongside in their own column.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryValue::Unknown => "unknown",
            EntryValue::No => "no",
            EntryValue::YesAuto => "yes_auto",
            EntryValue::YesManual => "yes_manual",
            EntryValue::Skip => "skip",
            EntryValue::Amount(_) => "amount",
        }
    }

    /// Rebuild a value from its storage tag and optional amount column.
    pub fn from_parts(tag: &str, amount: Option<f64>) -> Result<Self, ValidationError> {
        match (tag, amount) {
            ("amount", Some(v)) => Ok(EntryValue::Amount(v)),
            ("amount", None) => Err(ValidationError::InvalidEntryValue {
                value: tag.to_string(),
                message: "amount tag without a stored amount".into(),
            }),
            (other, _) => other.parse(),
        }
    }
}

impl fmt::Display for EntryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryValue::Amount(v) => write!(f, "{v}"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for EntryValue {
    type Err = ValidationError;

    /// Accepts storage tags, the short forms `yes`/`y`/`n`, or a number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "unknown" | "clear" => Ok(EntryValue::Unknown),
            "no" | "n" => Ok(EntryValue::No),
            "yes_auto" => Ok(EntryValue::YesAuto),
            "yes" | "y" | "yes_manual" => Ok(EntryValue::YesManual),
            "skip" => Ok(EntryValue::Skip),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(EntryValue::Amount)
                .ok_or_else(|| ValidationError::InvalidEntryValue {
                    value: s.to_string(),
                    message: "expected yes, no, skip, unknown or a number".into(),
                }),
        }
    }
}

/// One day's value, optionally annotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub timestamp: Timestamp,
    pub value: EntryValue,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl Entry {
    pub fn new(timestamp: Timestamp, value: EntryValue) -> Self {
        Self {
            timestamp,
            value,
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn unknown(timestamp: Timestamp) -> Self {
        Self::new(timestamp, EntryValue::Unknown)
    }
}

/// One group of manual successes that satisfies the habit frequency.
///
/// `begin` is the oldest contributing entry, `center` the newest, and
/// `end = begin + denominator - 1`. Monthly frequencies (denominator 30 or
/// 31) use the calendar month length instead of the denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub begin: Timestamp,
    pub center: Timestamp,
    pub end: Timestamp,
}

impl Interval {
    pub fn new(begin: Timestamp, center: Timestamp, end: Timestamp) -> Self {
        Self { begin, center, end }
    }

    /// Number of days covered, endpoints included.
    pub fn length(&self) -> i64 {
        self.begin.days_until(self.end) + 1
    }

    pub fn contains(&self, day: Timestamp) -> bool {
        day >= self.begin && day <= self.end
    }

    /// Move the whole interval `days` into the past, keeping `center`.
    pub fn shifted_back(&self, days: i64) -> Self {
        Self {
            begin: self.begin.minus(days),
            center: self.center,
            end: self.end.minus(days),
        }
    }
}
