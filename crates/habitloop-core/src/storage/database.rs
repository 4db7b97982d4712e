//! SQLite-based habit and entry storage.
//!
//! Provides persistent storage for:
//! - Habit metadata (name, frequency, kind, archive flag, ordering)
//! - Raw entries, one per habit and day
//!
//! Only raw entries are stored. Materialized entries, scores and streaks are
//! always recomputed from them when a [`Habit`] is loaded.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::entries::EntrySource;
use crate::error::{CoreError, DatabaseError, Result, ValidationError};
use crate::habit::{Habit, HabitInfo, HabitKind, NumericalTarget};
use crate::models::{Entry, EntryValue, Frequency, Timestamp};

use super::{data_dir, migrations};

const HABIT_COLUMNS: &str = "id, uuid, name, question, description, freq_num, freq_den, \
                             kind, target_type, target_value, unit, archived, position";

/// Columns of one `habits` row before validation.
struct HabitRow {
    id: i64,
    uuid: String,
    name: String,
    question: String,
    description: String,
    freq_num: i64,
    freq_den: i64,
    kind: String,
    target_type: Option<String>,
    target_value: Option<f64>,
    unit: String,
    archived: bool,
    position: i64,
}

impl HabitRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            uuid: row.get(1)?,
            name: row.get(2)?,
            question: row.get(3)?,
            description: row.get(4)?,
            freq_num: row.get(5)?,
            freq_den: row.get(6)?,
            kind: row.get(7)?,
            target_type: row.get(8)?,
            target_value: row.get(9)?,
            unit: row.get(10)?,
            archived: row.get(11)?,
            position: row.get(12)?,
        })
    }

    fn into_info(self) -> Result<HabitInfo> {
        let corrupt = |message: String| DatabaseError::CorruptRow {
            table: "habits".into(),
            message,
        };
        let frequency =
            Frequency::new(self.freq_num, self.freq_den).map_err(|e| corrupt(e.to_string()))?;
        let kind = match self.kind.as_str() {
            "yes_no" => HabitKind::YesNo,
            "numerical" => {
                let target_type = match self.target_type.as_deref() {
                    Some("at_most") => NumericalTarget::AtMost,
                    Some("at_least") | None => NumericalTarget::AtLeast,
                    Some(other) => return Err(corrupt(format!("unknown target type '{other}'")).into()),
                };
                HabitKind::Numerical {
                    target_type,
                    target_value: self.target_value.unwrap_or(0.0),
                    unit: self.unit,
                }
            }
            other => return Err(corrupt(format!("unknown habit kind '{other}'")).into()),
        };
        Ok(HabitInfo {
            id: Some(self.id),
            uuid: self.uuid,
            name: self.name,
            question: self.question,
            description: self.description,
            frequency,
            kind,
            archived: self.archived,
            position: self.position,
        })
    }
}

/// Storage columns `(kind, target_type, target_value, unit)` for a kind.
fn kind_columns(kind: &HabitKind) -> (&'static str, Option<&'static str>, Option<f64>, &str) {
    match kind {
        HabitKind::YesNo => ("yes_no", None, None, ""),
        HabitKind::Numerical {
            target_type,
            target_value,
            unit,
        } => {
            let target = match target_type {
                NumericalTarget::AtLeast => "at_least",
                NumericalTarget::AtMost => "at_most",
            };
            ("numerical", Some(target), Some(*target_value), unit.as_str())
        }
    }
}

/// SQLite database for habits and their raw entries.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/habitloop.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("habitloop.db");
        Self::open_at(path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "opened habit database");
        Self::init(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Insert a new habit and return its row id. Position defaults to the
    /// end of the list when `info.position` is zero.
    pub fn insert_habit(&self, info: &HabitInfo) -> Result<i64> {
        let (kind, target_type, target_value, unit) = kind_columns(&info.kind);
        let position = if info.position > 0 {
            info.position
        } else {
            self.conn
                .query_row("SELECT COALESCE(MAX(position), 0) + 1 FROM habits", [], |row| row.get(0))?
        };
        self.conn.execute(
            "INSERT INTO habits (uuid, name, question, description, freq_num, freq_den,
                                 kind, target_type, target_value, unit, archived, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                info.uuid,
                info.name,
                info.question,
                info.description,
                info.frequency.numerator(),
                info.frequency.denominator(),
                kind,
                target_type,
                target_value,
                unit,
                info.archived,
                position,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite the stored metadata of `info.id`.
    pub fn update_habit(&self, info: &HabitInfo) -> Result<()> {
        let id = info.id.ok_or_else(|| {
            CoreError::Validation(ValidationError::InvalidValue {
                field: "id".into(),
                message: "habit has not been stored yet".into(),
            })
        })?;
        let (kind, target_type, target_value, unit) = kind_columns(&info.kind);
        let changed = self.conn.execute(
            "UPDATE habits
             SET name = ?2, question = ?3, description = ?4, freq_num = ?5, freq_den = ?6,
                 kind = ?7, target_type = ?8, target_value = ?9, unit = ?10,
                 archived = ?11, position = ?12
             WHERE id = ?1",
            params![
                id,
                info.name,
                info.question,
                info.description,
                info.frequency.numerator(),
                info.frequency.denominator(),
                kind,
                target_type,
                target_value,
                unit,
                info.archived,
                info.position,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::HabitNotFound(id));
        }
        Ok(())
    }

    /// Delete a habit together with all of its entries.
    pub fn delete_habit(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM habits WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(CoreError::HabitNotFound(id));
        }
        Ok(())
    }

    pub fn get_habit(&self, id: i64) -> Result<HabitInfo> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, params![id], HabitRow::from_row)
            .optional()?
            .ok_or(CoreError::HabitNotFound(id))?;
        row.into_info()
    }

    /// Look a habit up by uuid.
    pub fn find_habit(&self, uuid: &str) -> Result<Option<HabitInfo>> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE uuid = ?1");
        self.conn
            .query_row(&sql, params![uuid], HabitRow::from_row)
            .optional()?
            .map(HabitRow::into_info)
            .transpose()
    }

    /// All habits ordered by position.
    pub fn list_habits(&self, include_archived: bool) -> Result<Vec<HabitInfo>> {
        let sql = format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE archived = 0 OR ?1 ORDER BY position, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![include_archived], HabitRow::from_row)?;

        let mut habits = Vec::new();
        for row in rows {
            habits.push(row?.into_info()?);
        }
        Ok(habits)
    }

    /// Load a habit with its raw entries and derived state.
    ///
    /// `today` pins the reference day instead of reading the clock.
    pub fn load_habit(&self, id: i64, today: Option<Timestamp>, days_ahead: i64) -> Result<Habit> {
        let info = self.get_habit(id)?;
        let mut habit = Habit::new(info);
        if let Some(day) = today {
            habit = habit.with_today(day);
        }
        if days_ahead > 0 {
            habit = habit.with_days_ahead(days_ahead);
        }
        habit.load_entries(&self.entries(id))?;
        Ok(habit)
    }

    /// Raw-entry source for one habit.
    pub fn entries(&self, habit_id: i64) -> StoredEntries<'_> {
        StoredEntries {
            conn: &self.conn,
            habit_id,
        }
    }
}

/// Raw entries of one habit, read and written straight through to SQLite.
pub struct StoredEntries<'a> {
    conn: &'a Connection,
    habit_id: i64,
}

impl StoredEntries<'_> {
    pub fn habit_id(&self) -> i64 {
        self.habit_id
    }

    pub fn get(&self, day: Timestamp) -> Result<Option<Entry>> {
        let row = self
            .conn
            .query_row(
                "SELECT day, value, amount, notes FROM entries WHERE habit_id = ?1 AND day = ?2",
                params![self.habit_id, day.to_string()],
                entry_row,
            )
            .optional()?;
        row.map(into_entry).transpose()
    }
}

type EntryRow = (String, String, Option<f64>, String);

fn entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_entry((day, value, amount, notes): EntryRow) -> Result<Entry> {
    let corrupt = |message: String| DatabaseError::CorruptRow {
        table: "entries".into(),
        message,
    };
    let timestamp = day.parse::<Timestamp>().map_err(|e| corrupt(e.to_string()))?;
    let value = EntryValue::from_parts(&value, amount).map_err(|e| corrupt(e.to_string()))?;
    Ok(Entry::new(timestamp, value).with_notes(notes))
}

impl EntrySource for StoredEntries<'_> {
    fn add_or_replace(&mut self, entry: Entry) -> Result<()> {
        let changed = self.conn.execute(
            "INSERT OR REPLACE INTO entries (habit_id, day, value, amount, notes)
             SELECT ?1, ?2, ?3, ?4, ?5 WHERE EXISTS (SELECT 1 FROM habits WHERE id = ?1)",
            params![
                self.habit_id,
                entry.timestamp.to_string(),
                entry.value.as_str(),
                entry.value.amount(),
                entry.notes,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::HabitNotFound(self.habit_id));
        }
        Ok(())
    }

    fn remove(&mut self, day: Timestamp) -> Result<()> {
        self.conn.execute(
            "DELETE FROM entries WHERE habit_id = ?1 AND day = ?2",
            params![self.habit_id, day.to_string()],
        )?;
        Ok(())
    }

    fn get_known(&self) -> Result<Vec<Entry>> {
        let mut stmt = self.conn.prepare(
            "SELECT day, value, amount, notes FROM entries WHERE habit_id = ?1 ORDER BY day DESC",
        )?;
        let rows = stmt.query_map(params![self.habit_id], entry_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(into_entry(row?)?);
        }
        Ok(entries)
    }

    fn clear(&mut self) -> Result<()> {
        self.conn
            .execute("DELETE FROM entries WHERE habit_id = ?1", params![self.habit_id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> Timestamp {
        Timestamp::from_ymd(2024, 3, 31).unwrap().minus(offset)
    }

    #[test]
    fn insert_and_get_habit() {
        let db = Database::open_memory().unwrap();
        let info = HabitInfo::new("Read", Frequency::THREE_TIMES_PER_WEEK, HabitKind::YesNo);
        let id = db.insert_habit(&info).unwrap();

        let stored = db.get_habit(id).unwrap();
        assert_eq!(stored.id, Some(id));
        assert_eq!(stored.uuid, info.uuid);
        assert_eq!(stored.frequency, Frequency::THREE_TIMES_PER_WEEK);
        assert_eq!(stored.kind, HabitKind::YesNo);
        assert_eq!(stored.position, 1);
        assert_eq!(db.find_habit(&info.uuid).unwrap(), Some(stored));
    }

    #[test]
    fn numerical_kind_roundtrip() {
        let db = Database::open_memory().unwrap();
        let kind = HabitKind::Numerical {
            target_type: NumericalTarget::AtMost,
            target_value: 2.5,
            unit: "coffees".into(),
        };
        let id = db.insert_habit(&HabitInfo::new("Coffee", Frequency::DAILY, kind.clone())).unwrap();
        assert_eq!(db.get_habit(id).unwrap().kind, kind);
    }

    #[test]
    fn missing_habit_is_reported() {
        let db = Database::open_memory().unwrap();
        assert!(matches!(db.get_habit(42), Err(CoreError::HabitNotFound(42))));
        assert!(matches!(db.delete_habit(42), Err(CoreError::HabitNotFound(42))));
        assert!(db.entries(42).add_or_replace(Entry::new(day(0), EntryValue::Skip)).is_err());
    }

    #[test]
    fn list_hides_archived_by_default() {
        let db = Database::open_memory().unwrap();
        db.insert_habit(&HabitInfo::new("Run", Frequency::DAILY, HabitKind::YesNo)).unwrap();
        let mut archived = HabitInfo::new("Old", Frequency::WEEKLY, HabitKind::YesNo);
        archived.archived = true;
        db.insert_habit(&archived).unwrap();

        let active = db.list_habits(false).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Run");
        assert_eq!(db.list_habits(true).unwrap().len(), 2);
    }

    #[test]
    fn update_habit_persists_changes() {
        let db = Database::open_memory().unwrap();
        let id = db.insert_habit(&HabitInfo::new("Run", Frequency::DAILY, HabitKind::YesNo)).unwrap();
        let mut info = db.get_habit(id).unwrap();
        info.name = "Jog".into();
        info.frequency = Frequency::TWO_TIMES_PER_WEEK;
        db.update_habit(&info).unwrap();

        let stored = db.get_habit(id).unwrap();
        assert_eq!(stored.name, "Jog");
        assert_eq!(stored.frequency, Frequency::TWO_TIMES_PER_WEEK);
    }

    #[test]
    fn stored_entries_replace_by_day() {
        let db = Database::open_memory().unwrap();
        let id = db.insert_habit(&HabitInfo::new("Run", Frequency::DAILY, HabitKind::YesNo)).unwrap();
        let mut entries = db.entries(id);
        entries.add_or_replace(Entry::new(day(2), EntryValue::YesManual)).unwrap();
        entries.add_or_replace(Entry::new(day(0), EntryValue::No)).unwrap();
        entries
            .add_or_replace(Entry::new(day(0), EntryValue::Skip).with_notes("sick"))
            .unwrap();

        let known = entries.get_known().unwrap();
        assert_eq!(known.len(), 2);
        assert_eq!(known[0], Entry::new(day(0), EntryValue::Skip).with_notes("sick"));
        assert_eq!(known[1].timestamp, day(2));

        entries.remove(day(2)).unwrap();
        assert_eq!(entries.get(day(2)).unwrap(), None);
        entries.clear().unwrap();
        assert!(entries.get_known().unwrap().is_empty());
    }

    #[test]
    fn amounts_survive_storage() {
        let db = Database::open_memory().unwrap();
        let kind = HabitKind::Numerical {
            target_type: NumericalTarget::AtLeast,
            target_value: 10.0,
            unit: "pages".into(),
        };
        let id = db.insert_habit(&HabitInfo::new("Read", Frequency::DAILY, kind)).unwrap();
        db.entries(id).add_or_replace(Entry::new(day(0), EntryValue::Amount(12.5))).unwrap();
        assert_eq!(
            db.entries(id).get(day(0)).unwrap().map(|e| e.value),
            Some(EntryValue::Amount(12.5))
        );
    }

    #[test]
    fn deleting_habit_cascades_to_entries() {
        let db = Database::open_memory().unwrap();
        let id = db.insert_habit(&HabitInfo::new("Run", Frequency::DAILY, HabitKind::YesNo)).unwrap();
        db.entries(id).add_or_replace(Entry::new(day(0), EntryValue::YesManual)).unwrap();
        db.delete_habit(id).unwrap();

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn load_habit_derives_from_stored_entries() {
        let db = Database::open_memory().unwrap();
        let id = db
            .insert_habit(&HabitInfo::new("Stretch", Frequency::new(2, 3).unwrap(), HabitKind::YesNo))
            .unwrap();
        let mut entries = db.entries(id);
        entries.add_or_replace(Entry::new(day(0), EntryValue::YesManual)).unwrap();
        entries.add_or_replace(Entry::new(day(2), EntryValue::YesManual)).unwrap();

        let habit = db.load_habit(id, Some(day(0)), 0).unwrap();
        let computed = &habit.derived().computed;
        assert_eq!(computed.get(day(0)).value, EntryValue::YesManual);
        assert_eq!(computed.get(day(1)).value, EntryValue::YesAuto);
        assert_eq!(computed.get(day(2)).value, EntryValue::YesManual);
    }
}
