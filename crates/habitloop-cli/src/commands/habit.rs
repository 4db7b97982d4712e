//! Habit management commands for CLI.

use clap::{Args, Subcommand};
use habitloop_core::{Database, Frequency, HabitInfo, HabitKind, NumericalTarget};
use serde_json::json;

use super::{print_json, CliResult, Context};

/// Target options; passing `--target` makes a habit numerical.
#[derive(Args, Default)]
pub struct TargetArgs {
    /// Daily target amount
    #[arg(long)]
    target: Option<f64>,
    /// Succeed when the amount stays at or below the target
    #[arg(long, requires = "target")]
    at_most: bool,
    /// Unit of the amount (e.g. "pages")
    #[arg(long, requires = "target")]
    unit: Option<String>,
}

impl TargetArgs {
    fn kind(&self) -> Option<HabitKind> {
        let target_value = self.target?;
        Some(HabitKind::Numerical {
            target_type: if self.at_most {
                NumericalTarget::AtMost
            } else {
                NumericalTarget::AtLeast
            },
            target_value,
            unit: self.unit.clone().unwrap_or_default(),
        })
    }
}

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Create {
        /// Habit name
        name: String,
        /// Target frequency as "times/days" (e.g. "3/7")
        #[arg(long)]
        frequency: Option<Frequency>,
        /// Question shown when recording
        #[arg(long)]
        question: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// List habits with today's status
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },
    /// Show one habit in detail
    Show {
        /// Habit ID
        id: i64,
    },
    /// Edit a habit
    Edit {
        /// Habit ID
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        frequency: Option<Frequency>,
        #[arg(long)]
        question: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Turn a numerical habit back into a yes/no habit
        #[arg(long, conflicts_with = "target")]
        yes_no: bool,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Archive (or restore with --undo) a habit
    Archive {
        /// Habit ID
        id: i64,
        #[arg(long)]
        undo: bool,
    },
    /// Delete a habit and all of its entries
    Delete {
        /// Habit ID
        id: i64,
    },
}

pub fn run(action: HabitAction, ctx: &Context) -> CliResult {
    let db = Database::open()?;

    match action {
        HabitAction::Create {
            name,
            frequency,
            question,
            description,
            target,
        } => {
            let frequency = frequency.unwrap_or_else(|| ctx.config.default_frequency());
            let kind = target.kind().unwrap_or_default();
            let mut info = HabitInfo::new(name, frequency, kind);
            info.question = question.unwrap_or_default();
            info.description = description.unwrap_or_default();

            let id = db.insert_habit(&info)?;
            print_json(&db.get_habit(id)?)?;
        }
        HabitAction::List { all } => {
            let include_archived = all || ctx.config.habits.show_archived;
            let mut summaries = Vec::new();
            for info in db.list_habits(include_archived)? {
                if let Some(id) = info.id {
                    summaries.push(ctx.open_habit(&db, id)?.summary());
                }
            }
            print_json(&summaries)?;
        }
        HabitAction::Show { id } => {
            let habit = ctx.open_habit(&db, id)?;
            let derived = habit.derived();
            let limit = ctx.config.streaks.best_limit as usize;
            print_json(&json!({
                "habit": habit.info(),
                "summary": habit.summary(),
                "raw_entries": habit.raw_entries().len(),
                "best_streaks": derived.streaks.get_best(limit),
            }))?;
        }
        HabitAction::Edit {
            id,
            name,
            frequency,
            question,
            description,
            yes_no,
            target,
        } => {
            let mut habit = ctx.open_habit(&db, id)?;
            if let Some(name) = name {
                habit.rename(name);
            }
            if let Some(question) = question {
                habit.set_question(question);
            }
            if let Some(description) = description {
                habit.set_description(description);
            }
            let mut events = Vec::new();
            if let Some(frequency) = frequency {
                events.push(habit.set_frequency(frequency));
            }
            if yes_no {
                events.push(habit.set_kind(HabitKind::YesNo));
            } else if let Some(kind) = target.kind() {
                events.push(habit.set_kind(kind));
            }
            db.update_habit(habit.info())?;

            let messages: Vec<String> = events.iter().map(|e| e.message()).collect();
            print_json(&json!({ "habit": habit.info(), "changes": messages }))?;
        }
        HabitAction::Archive { id, undo } => {
            let mut info = db.get_habit(id)?;
            info.archived = !undo;
            db.update_habit(&info)?;
            print_json(&info)?;
        }
        HabitAction::Delete { id } => {
            db.delete_habit(id)?;
            print_json(&json!({ "deleted": id }))?;
        }
    }
    Ok(())
}
