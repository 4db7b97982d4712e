//! Entry commands for CLI.

use clap::Subcommand;
use habitloop_core::{Database, Entry, EntrySource, EntryValue, HabitEvent};
use serde_json::json;

use super::{print_json, CliResult, Context, DayArg};

#[derive(Subcommand)]
pub enum EntryAction {
    /// Record a value for a day
    Set {
        /// Habit ID
        habit: i64,
        /// yes, no, skip, unknown, or an amount for numerical habits
        value: EntryValue,
        /// Day to record (defaults to today)
        #[arg(long, value_parser = DayArg::parse)]
        day: Option<DayArg>,
        /// Free-text note for the day
        #[arg(long)]
        notes: Option<String>,
    },
    /// Clear a day
    Remove {
        /// Habit ID
        habit: i64,
        #[arg(long, value_parser = DayArg::parse)]
        day: Option<DayArg>,
    },
    /// List entries, newest first
    List {
        /// Habit ID
        habit: i64,
        /// First day (defaults to 30 days before --to)
        #[arg(long, value_parser = DayArg::parse)]
        from: Option<DayArg>,
        /// Last day (defaults to today)
        #[arg(long, value_parser = DayArg::parse)]
        to: Option<DayArg>,
        /// Show only recorded entries instead of the derived timeline
        #[arg(long)]
        raw: bool,
    },
}

fn event_json(event: &HabitEvent) -> serde_json::Value {
    json!({ "message": event.message(), "event": event })
}

pub fn run(action: EntryAction, ctx: &Context) -> CliResult {
    let db = Database::open()?;

    match action {
        EntryAction::Set {
            habit: id,
            value,
            day,
            notes,
        } => {
            let mut habit = ctx.open_habit(&db, id)?;
            let mut entry = Entry::new(ctx.day(day), value);
            if let Some(notes) = notes {
                entry = entry.with_notes(notes);
            }

            let event = habit.set_entry(entry.clone())?;
            let mut stored = db.entries(id);
            match &event {
                HabitEvent::EntryRemoved { day, .. } => stored.remove(*day)?,
                _ => stored.add_or_replace(entry)?,
            }
            print_json(&event_json(&event))?;
        }
        EntryAction::Remove { habit: id, day } => {
            let mut habit = ctx.open_habit(&db, id)?;
            let event = habit.remove_entry(ctx.day(day));
            if let HabitEvent::EntryRemoved { day, .. } = &event {
                db.entries(id).remove(*day)?;
            }
            print_json(&event_json(&event))?;
        }
        EntryAction::List {
            habit: id,
            from,
            to,
            raw,
        } => {
            let to = ctx.day(to);
            let from = from.map_or_else(|| to.minus(30), |day| day.resolve(ctx.today()));
            let entries: Vec<Entry> = if raw {
                db.entries(id)
                    .get_known()?
                    .into_iter()
                    .filter(|e| e.timestamp >= from && e.timestamp <= to)
                    .collect()
            } else {
                ctx.open_habit(&db, id)?.derived().computed.get_by_interval(from, to)
            };
            print_json(&entries)?;
        }
    }
    Ok(())
}
