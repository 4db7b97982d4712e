//! Database schema migrations for habitloop.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{info, warn};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    if current_version < SCHEMA_VERSION {
        info!(from = current_version, to = SCHEMA_VERSION, "migrated database schema");
    }
    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (fresh database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| row.get::<_, i32>(0))
        .unwrap_or_else(|e| {
            if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
                warn!(error = %e, "failed to read schema_version");
            }
            0
        })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: habits and their raw entries.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS habits (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            uuid         TEXT NOT NULL UNIQUE,
            name         TEXT NOT NULL,
            question     TEXT NOT NULL DEFAULT '',
            description  TEXT NOT NULL DEFAULT '',
            freq_num     INTEGER NOT NULL DEFAULT 1,
            freq_den     INTEGER NOT NULL DEFAULT 1,
            kind         TEXT NOT NULL DEFAULT 'yes_no',
            target_type  TEXT,
            target_value REAL,
            unit         TEXT NOT NULL DEFAULT '',
            archived     INTEGER NOT NULL DEFAULT 0,
            position     INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS entries (
            habit_id INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            day      TEXT NOT NULL,
            value    TEXT NOT NULL,
            amount   REAL,
            PRIMARY KEY (habit_id, day)
        );

        CREATE INDEX IF NOT EXISTS idx_habits_position ON habits(position);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: free-text notes on entries.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    let has_notes: bool = tx
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('entries') WHERE name = 'notes'",
            [],
            |row| row.get::<_, i32>(0),
        )
        .unwrap_or(0)
        > 0;
    if !has_notes {
        tx.execute_batch("ALTER TABLE entries ADD COLUMN notes TEXT NOT NULL DEFAULT '';")?;
    }

    set_schema_version(&tx, 2)?;
    tx.commit()
}
