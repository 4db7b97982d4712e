//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - First day of the week for weekly grouping
//! - How many best streaks to report
//! - How far past today scores are extended
//! - Defaults for newly created habits
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::data_dir;
use crate::error::ConfigError;
use crate::habit::Habit;
use crate::models::Frequency;

/// Display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_first_weekday")]
    pub first_weekday: String,
}

/// Streak reporting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreaksConfig {
    #[serde(default = "default_best_limit")]
    pub best_limit: u32,
}

/// Score computation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoresConfig {
    /// Days past today that scores are extended to.
    #[serde(default)]
    pub days_ahead: u32,
}

/// Defaults for habit creation and listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitsConfig {
    #[serde(default = "default_frequency")]
    pub default_frequency: String,
    #[serde(default)]
    pub show_archived: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub streaks: StreaksConfig,
    #[serde(default)]
    pub scores: ScoresConfig,
    #[serde(default)]
    pub habits: HabitsConfig,
}

fn default_first_weekday() -> String {
    "monday".into()
}
fn default_best_limit() -> u32 {
    10
}
fn default_frequency() -> String {
    "1/1".into()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            first_weekday: default_first_weekday(),
        }
    }
}

impl Default for StreaksConfig {
    fn default() -> Self {
        Self {
            best_limit: default_best_limit(),
        }
    }
}

impl Default for HabitsConfig {
    fn default() -> Self {
        Self {
            default_frequency: default_frequency(),
            show_archived: false,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as a non-negative integer")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `<data_dir>/config.toml`, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse
    /// for that key.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Every key with its current value, in dot-path form.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    fn validate(&self) -> Result<(), ConfigError> {
        parse_weekday(&self.display.first_weekday)?;
        self.habits
            .default_frequency
            .parse::<Frequency>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "habits.default_frequency".into(),
                message: e.to_string(),
            })?;
        if i64::from(self.scores.days_ahead) > Habit::MAX_DAYS_AHEAD {
            return Err(ConfigError::InvalidValue {
                key: "scores.days_ahead".into(),
                message: format!("must be at most {}", Habit::MAX_DAYS_AHEAD),
            });
        }
        Ok(())
    }

    /// First day of the week used for weekly grouping.
    pub fn first_weekday(&self) -> Weekday {
        parse_weekday(&self.display.first_weekday).unwrap_or(Weekday::Mon)
    }

    /// Frequency given to habits created without one.
    pub fn default_frequency(&self) -> Frequency {
        self.habits.default_frequency.parse().unwrap_or_default()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

fn parse_weekday(value: &str) -> Result<Weekday, ConfigError> {
    value.trim().parse::<Weekday>().map_err(|_| ConfigError::InvalidValue {
        key: "display.first_weekday".into(),
        message: format!("'{value}' is not a day of the week"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.display.first_weekday, "monday");
        assert_eq!(parsed.streaks.best_limit, 10);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[display]\nfirst_weekday = \"sunday\"\n").unwrap();
        assert_eq!(parsed.first_weekday(), Weekday::Sun);
        assert_eq!(parsed.scores.days_ahead, 0);
        assert_eq!(parsed.default_frequency(), Frequency::DAILY);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("streaks.best_limit").as_deref(), Some("10"));
        assert_eq!(cfg.get("habits.show_archived").as_deref(), Some("false"));
        assert_eq!(cfg.get("habits.default_frequency").as_deref(), Some("1/1"));
        assert!(cfg.get("display.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_bool() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "habits.show_archived", "true").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "habits.show_archived").unwrap(),
            &serde_json::Value::Bool(true)
        );
    }

    #[test]
    fn set_json_value_by_path_updates_nested_number() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "scores.days_ahead", "7").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "scores.days_ahead").unwrap(),
            &serde_json::Value::Number(7.into())
        );
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "display.nonexistent_key", "value");
        assert!(matches!(result, Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "habits.show_archived", "not_a_bool");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn apply_validates_semantics() {
        let mut cfg = Config::default();
        cfg.apply("display.first_weekday", "sunday").unwrap();
        assert_eq!(cfg.first_weekday(), Weekday::Sun);

        assert!(cfg.apply("display.first_weekday", "someday").is_err());
        assert!(cfg.apply("habits.default_frequency", "3/2").is_err());
        // failed updates leave the config untouched
        assert_eq!(cfg.first_weekday(), Weekday::Sun);
        assert_eq!(cfg.default_frequency(), Frequency::DAILY);
    }

    #[test]
    fn days_ahead_is_bounded() {
        let mut cfg = Config::default();
        cfg.apply("scores.days_ahead", "30").unwrap();
        assert_eq!(cfg.scores.days_ahead, 30);

        let result = cfg.apply("scores.days_ahead", "4000000000");
        assert!(matches!(result, Err(ConfigError::InvalidValue { ref key, .. }) if key == "scores.days_ahead"));
        assert_eq!(cfg.scores.days_ahead, 30);
    }

    #[test]
    fn load_rejects_out_of_range_days_ahead() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scores]\ndays_ahead = 4000000000\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn entries_lists_every_leaf() {
        let keys: Vec<String> = Config::default().entries().into_iter().map(|(k, _)| k).collect();
        for key in [
            "display.first_weekday",
            "streaks.best_limit",
            "scores.days_ahead",
            "habits.default_frequency",
            "habits.show_archived",
        ] {
            assert!(keys.iter().any(|k| k == key), "missing {key}");
        }
    }

    #[test]
    fn load_from_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.streaks.best_limit, 10);

        std::fs::write(&path, "[streaks]\nbest_limit = 3\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().streaks.best_limit, 3);

        std::fs::write(&path, "[display]\nfirst_weekday = \"funday\"\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::InvalidValue { .. })));
    }
}
