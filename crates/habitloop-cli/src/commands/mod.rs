pub mod config;
pub mod entry;
pub mod habit;
pub mod stats;

use habitloop_core::{Config, Database, Habit, Timestamp};
use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Settings shared by every command that touches habits.
pub struct Context {
    pinned_today: Option<Timestamp>,
    pub config: Config,
}

impl Context {
    pub fn new(pinned_today: Option<Timestamp>) -> Self {
        Self {
            pinned_today,
            config: Config::load_or_default(),
        }
    }

    pub fn today(&self) -> Timestamp {
        self.pinned_today.unwrap_or_else(Timestamp::today)
    }

    /// Resolve an optional day argument, defaulting to today.
    pub fn day(&self, arg: Option<DayArg>) -> Timestamp {
        arg.map_or_else(|| self.today(), |day| day.resolve(self.today()))
    }

    /// Load a habit with entries and derived state, honouring `--today` and
    /// `scores.days_ahead`.
    pub fn open_habit(&self, db: &Database, id: i64) -> Result<Habit, Box<dyn std::error::Error>> {
        let days_ahead = i64::from(self.config.scores.days_ahead);
        Ok(db.load_habit(id, Some(self.today()), days_ahead)?)
    }
}

/// Parse `today`, `yesterday` or `YYYY-MM-DD` against the system clock.
pub fn parse_day(s: &str) -> Result<Timestamp, String> {
    DayArg::parse(s).map(|day| day.resolve(Timestamp::today()))
}

/// A day given on the command line, resolved against `--today` later.
#[derive(Debug, Clone, Copy)]
pub enum DayArg {
    DaysAgo(i64),
    Date(Timestamp),
}

impl DayArg {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DayArg::DaysAgo(0)),
            "yesterday" => Ok(DayArg::DaysAgo(1)),
            other => other
                .parse::<Timestamp>()
                .map(DayArg::Date)
                .map_err(|e| e.to_string()),
        }
    }

    pub fn resolve(self, today: Timestamp) -> Timestamp {
        match self {
            DayArg::DaysAgo(n) => today.minus(n),
            DayArg::Date(day) => day,
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
