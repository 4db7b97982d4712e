use clap::Subcommand;
use habitloop_core::storage::Database;
use habitloop_core::{count_skipped_days, grouped_sum, weekday_frequency, TruncateField};
use serde_json::json;

use super::{print_json, CliResult, Context, DayArg};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Daily scores, newest first
    Scores {
        /// Habit ID
        habit: i64,
        #[arg(long, value_parser = DayArg::parse)]
        from: Option<DayArg>,
        #[arg(long, value_parser = DayArg::parse)]
        to: Option<DayArg>,
    },
    /// Best streaks, newest first
    Streaks {
        /// Habit ID
        habit: i64,
        /// Number of streaks (defaults to streaks.best_limit)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Totals per day, week, month, quarter or year
    Grouped {
        /// Habit ID
        habit: i64,
        #[arg(long, default_value = "month")]
        by: TruncateField,
    },
    /// Successes per weekday for each month
    Weekdays {
        /// Habit ID
        habit: i64,
    },
    /// Skipped days per period
    Skipped {
        /// Habit ID
        habit: i64,
        #[arg(long, default_value = "month")]
        by: TruncateField,
    },
}

pub fn run(action: StatsAction, ctx: &Context) -> CliResult {
    let db = Database::open()?;

    match action {
        StatsAction::Scores { habit, from, to } => {
            let habit = ctx.open_habit(&db, habit)?;
            let to = ctx.day(to);
            let from = from.map_or_else(|| to.minus(30), |day| day.resolve(ctx.today()));
            print_json(&habit.derived().scores.get_by_interval(from, to))?;
        }
        StatsAction::Streaks { habit, limit } => {
            let habit = ctx.open_habit(&db, habit)?;
            let limit = limit.unwrap_or(ctx.config.streaks.best_limit as usize);
            print_json(&habit.derived().streaks.get_best(limit))?;
        }
        StatsAction::Grouped { habit, by } => {
            let habit = ctx.open_habit(&db, habit)?;
            let entries = habit.derived().computed.get_known();
            let buckets = grouped_sum(&entries, by, ctx.config.first_weekday(), habit.is_numerical());
            print_json(&buckets)?;
        }
        StatsAction::Weekdays { habit } => {
            let habit = ctx.open_habit(&db, habit)?;
            let entries = habit.derived().computed.get_known();
            let months: Vec<_> = weekday_frequency(&entries, habit.is_numerical())
                .into_iter()
                .rev()
                .map(|(month, counts)| json!({ "month": month, "mon_to_sun": counts }))
                .collect();
            print_json(&months)?;
        }
        StatsAction::Skipped { habit, by } => {
            let habit = ctx.open_habit(&db, habit)?;
            let entries = habit.derived().computed.get_known();
            print_json(&count_skipped_days(&entries, by, ctx.config.first_weekday()))?;
        }
    }
    Ok(())
}
