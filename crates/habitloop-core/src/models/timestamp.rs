//! Calendar-day timestamps.
//!
//! All derived computation works at day granularity. Time-of-day and
//! timezone normalization happen before a value becomes a [`Timestamp`].

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Local, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Field used to bucket days in aggregation queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncateField {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl FromStr for TruncateField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            other => Err(ValidationError::InvalidValue {
                field: "truncate_field".into(),
                message: format!("unknown field '{other}'"),
            }),
        }
    }
}

/// A single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(NaiveDate);

impl Timestamp {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Build a day from its calendar parts. Returns `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today in the local timezone.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Move `days` into the future, saturating at the last representable day.
    pub fn plus(&self, days: i64) -> Self {
        match Duration::try_days(days).and_then(|d| self.0.checked_add_signed(d)) {
            Some(date) => Self(date),
            None if days < 0 => Self(NaiveDate::MIN),
            None => Self(NaiveDate::MAX),
        }
    }

    /// Move `days` into the past, saturating at the first representable day.
    pub fn minus(&self, days: i64) -> Self {
        match Duration::try_days(days).and_then(|d| self.0.checked_sub_signed(d)) {
            Some(date) => Self(date),
            None if days < 0 => Self(NaiveDate::MAX),
            None => Self(NaiveDate::MIN),
        }
    }

    /// Number of days in this day's month.
    pub fn month_length(&self) -> i64 {
        let first = self.0.with_day(1).unwrap_or(self.0);
        match first.checked_add_months(Months::new(1)) {
            Some(next) => next.signed_duration_since(first).num_days(),
            None => 31,
        }
    }

    pub fn is_last_day_of_month(&self) -> bool {
        i64::from(self.0.day()) == self.month_length()
    }

    /// Signed number of days from `self` to `other`.
    ///
    /// Positive when `other` is newer than `self`.
    pub fn days_until(&self, other: Timestamp) -> i64 {
        (other.0 - self.0).num_days()
    }

    pub fn is_newer_than(&self, other: Timestamp) -> bool {
        self.0 > other.0
    }

    pub fn is_older_than(&self, other: Timestamp) -> bool {
        self.0 < other.0
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// First day of the bucket containing this day.
    ///
    /// `first_weekday` only matters for [`TruncateField::Week`].
    pub fn truncate(&self, field: TruncateField, first_weekday: Weekday) -> Self {
        let date = self.0;
        let truncated = match field {
            TruncateField::Day => Some(date),
            TruncateField::Week => {
                let delta = (7 + date.weekday().num_days_from_monday()
                    - first_weekday.num_days_from_monday())
                    % 7;
                Some(date - Duration::days(i64::from(delta)))
            }
            TruncateField::Month => date.with_day(1),
            TruncateField::Quarter => {
                let quarter_month = (date.month0() / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), quarter_month, 1)
            }
            TruncateField::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
        };
        // Day 1 of an existing month always exists.
        Self(truncated.unwrap_or(date))
    }
}

impl From<NaiveDate> for Timestamp {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for Timestamp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| ValidationError::MalformedDay(s.to_string()))
    }
}
