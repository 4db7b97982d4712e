//! # Habitloop Core Library
//!
//! This library provides the core logic for the habitloop habit tracker.
//! It implements a CLI-first philosophy where all operations are available via
//! a standalone CLI binary over the same core library.
//!
//! ## Architecture
//!
//! - **Derivation engine**: turns sparse manual entries plus a target frequency
//!   into a dense per-day timeline ([`entries`]), then computes a decayed
//!   trend score ([`scores`]) and best streaks ([`streaks`]) from it
//! - **Habit aggregate**: owns raw entries and publishes each recompute as an
//!   immutable [`DerivedState`] snapshot
//! - **Aggregation**: grouped sums and histograms for charts ([`aggregate`])
//! - **Storage**: SQLite-based habit and entry storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Habit`]: Habit aggregate with build-then-swap recompute
//! - [`EntrySource`]: Contract for wherever raw entries live
//! - [`Database`]: Habit and raw-entry persistence
//! - [`Config`]: Application configuration management

pub mod aggregate;
pub mod entries;
pub mod error;
pub mod events;
pub mod habit;
pub mod models;
pub mod scores;
pub mod storage;
pub mod streaks;

pub use aggregate::{count_skipped_days, grouped_sum, weekday_frequency, Bucket};
pub use entries::{
    build_entries_from_intervals, build_intervals, normalize_entries, snap_intervals_together,
    window_size, EntryList, EntrySource,
};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::HabitEvent;
pub use habit::{
    DerivedState, Habit, HabitInfo, HabitKind, HabitSummary, NumericalTarget, SharedDerived,
};
pub use models::{Entry, EntryValue, Frequency, Interval, Timestamp, TruncateField};
pub use scores::{compute_scores, Score, ScoreList};
pub use storage::{Config, Database, StoredEntries};
pub use streaks::{best_streaks, find_streaks, Streak, StreakList, SuccessRule};
