use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::repository::sqlite::DEFAULT_DB_FILE_NAME;
use crate::time::parse_duration;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "tickler.log";

/// `<data_dir>/config.toml`. Every key is optional.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database_file: String,
    pub refresh_interval: String,
    pub reminder_interval: String,
    pub reminder_lookahead: String,
    pub snooze: String,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_file: DEFAULT_DB_FILE_NAME.to_string(),
            refresh_interval: "1m".to_string(),
            reminder_interval: "1m".to_string(),
            reminder_lookahead: "1h".to_string(),
            snooze: "1h".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

/// `Config` with its durations parsed, plus where everything lives.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    pub refresh_interval: Duration,
    pub reminder_interval: Duration,
    pub reminder_lookahead: Duration,
    pub snooze: Duration,
    pub log_filter: String,
}

impl Settings {
    /// Loads `config.toml` from `data_dir` (default `~/.tickler`) if it exists.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        let config = Config::load_from(&data_dir.join(CONFIG_FILE_NAME))?;
        Self::from_config(data_dir, config)
    }

    pub fn from_config(data_dir: PathBuf, config: Config) -> Result<Self> {
        let duration = |key: &str, value: &str| {
            parse_duration(value).with_context(|| format!("invalid `{}` in {}", key, CONFIG_FILE_NAME))
        };

        Ok(Self {
            database_path: data_dir.join(&config.database_file),
            log_path: data_dir.join(LOG_FILE_NAME),
            refresh_interval: duration("refresh_interval", &config.refresh_interval)?,
            reminder_interval: duration("reminder_interval", &config.reminder_interval)?,
            reminder_lookahead: duration("reminder_lookahead", &config.reminder_lookahead)?,
            snooze: duration("snooze", &config.snooze)?,
            log_filter: config.log_filter,
            data_dir,
        })
    }
}

impl Config {
    /// Defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("could not parse {}", path.display()))
    }

    #[cfg(test)]
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home_dir.join(".tickler"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        let settings = Settings::load(Some(dir.path().to_path_buf())).unwrap();

        assert_eq!(settings.database_path, dir.path().join("tasks.db"));
        assert_eq!(settings.log_path, dir.path().join(LOG_FILE_NAME));
        assert_eq!(settings.refresh_interval, Duration::minutes(1));
        assert_eq!(settings.reminder_interval, Duration::minutes(1));
        assert_eq!(settings.reminder_lookahead, Duration::hours(1));
        assert_eq!(settings.snooze, Duration::hours(1));
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn test_partial_file_overrides_some_keys() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "snooze = \"15m\"\nlog_filter = \"tickler_core=debug\"\n",
        )
        .unwrap();

        let settings = Settings::load(Some(dir.path().to_path_buf())).unwrap();
        assert_eq!(settings.snooze, Duration::minutes(15));
        assert_eq!(settings.log_filter, "tickler_core=debug");
        assert_eq!(settings.reminder_lookahead, Duration::hours(1));
    }

    #[test]
    fn test_bad_duration_is_reported_with_key() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        fs::write(dir.path().join(CONFIG_FILE_NAME), "reminder_interval = \"soon\"\n").unwrap();

        let err = Settings::load(Some(dir.path().to_path_buf())).unwrap_err();
        assert!(format!("{:#}", err).contains("reminder_interval"));
    }

    #[test]
    fn test_oversized_snooze_is_a_config_error() {
        let config = Config {
            snooze: "100000000w".to_string(),
            ..Config::default()
        };
        let err = Settings::from_config(PathBuf::from("/tmp/tickler"), config).unwrap_err();
        assert!(format!("{:#}", err).contains("snooze"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::TempDir::new().expect("create temp dir");
        let path = dir.path().join("sub").join(CONFIG_FILE_NAME);
        let config = Config {
            database_file: "other.db".to_string(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }
}
