mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, DisplayConfig, HabitsConfig, ScoresConfig, StreaksConfig};
pub use database::{Database, StoredEntries};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding the database and `config.toml`.
///
/// `HABITLOOP_DATA_DIR` wins when set. Otherwise `~/.config/habitloop`, or
/// `~/.config/habitloop-dev` with `HABITLOOP_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("HABITLOOP_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HABITLOOP_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitloop-dev")
            } else {
                base_dir.join("habitloop")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
