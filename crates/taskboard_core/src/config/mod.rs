use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKBOARD_CONFIG_PATH";

pub const DEFAULT_TICK_SECONDS: u64 = 1;
pub const DEFAULT_PROGRESS_PER_TICK: f64 = 0.1;
pub const DEFAULT_TREND_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
    #[serde(default = "default_progress_per_tick")]
    pub progress_per_tick: f64,
    #[serde(default = "default_trend_window_days")]
    pub trend_window_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_seconds: DEFAULT_TICK_SECONDS,
            progress_per_tick: DEFAULT_PROGRESS_PER_TICK,
            trend_window_days: DEFAULT_TREND_WINDOW_DAYS,
        }
    }
}

fn default_tick_seconds() -> u64 {
    DEFAULT_TICK_SECONDS
}

fn default_progress_per_tick() -> f64 {
    DEFAULT_PROGRESS_PER_TICK
}

fn default_trend_window_days() -> u32 {
    DEFAULT_TREND_WINDOW_DAYS
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigOverrides {
    pub tick_seconds: Option<u64>,
    pub progress_per_tick: Option<f64>,
    pub trend_window_days: Option<u32>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskboard")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskboard")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config() -> Result<Config, AppError> {
    let path = config_path()?;
    load_config_from_path(&path)
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<(), AppError> {
    if config.tick_seconds == 0 {
        return Err(AppError::invalid_data("tick_seconds must be at least 1"));
    }
    if !(config.progress_per_tick > 0.0 && config.progress_per_tick <= 100.0) {
        return Err(AppError::invalid_data(
            "progress_per_tick must be in (0, 100]",
        ));
    }
    if config.trend_window_days == 0 {
        return Err(AppError::invalid_data(
            "trend_window_days must be at least 1",
        ));
    }

    Ok(())
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Result<Config, AppError> {
    let mut merged = base.clone();
    if let Some(tick_seconds) = overrides.tick_seconds {
        merged.tick_seconds = tick_seconds;
    }
    if let Some(progress_per_tick) = overrides.progress_per_tick {
        merged.progress_per_tick = progress_per_tick;
    }
    if let Some(trend_window_days) = overrides.trend_window_days {
        merged.trend_window_days = trend_window_days;
    }

    validate(&merged)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigOverrides, load_config_with_fallback_from_path, merge_overrides};
    use super::{load_config_from_path, validate};
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskboard-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, Config::default());
        assert!(result.error.is_some());
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "tick_seconds": 5,
            "progress_per_tick": 2.5
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.tick_seconds, 5);
        assert_eq!(loaded.progress_per_tick, 2.5);
        assert_eq!(loaded.trend_window_days, 7);
    }

    #[test]
    fn load_config_rejects_out_of_range_values() {
        let path = temp_path("zero-tick-config.json");
        let content = serde_json::json!({ "tick_seconds": 0 });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let err = load_config_from_path(&path).unwrap_err();
        fs::remove_file(&path).ok();

        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn validate_rejects_nonpositive_progress_increment() {
        let config = Config {
            progress_per_tick: 0.0,
            ..Config::default()
        };
        assert_eq!(validate(&config).unwrap_err().code(), "invalid_data");

        let config = Config {
            progress_per_tick: 150.0,
            ..Config::default()
        };
        assert_eq!(validate(&config).unwrap_err().code(), "invalid_data");
    }

    #[test]
    fn merge_overrides_updates_selected_fields() {
        let base = Config::default();
        let overrides = ConfigOverrides {
            tick_seconds: Some(10),
            progress_per_tick: None,
            trend_window_days: Some(14),
        };

        let merged = merge_overrides(&base, &overrides).unwrap();

        assert_eq!(merged.tick_seconds, 10);
        assert_eq!(merged.progress_per_tick, base.progress_per_tick);
        assert_eq!(merged.trend_window_days, 14);
    }

    #[test]
    fn merge_overrides_preserves_base_config() {
        let base = Config::default();
        let overrides = ConfigOverrides {
            tick_seconds: Some(30),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides).unwrap();

        assert_eq!(base.tick_seconds, super::DEFAULT_TICK_SECONDS);
        assert_eq!(merged.tick_seconds, 30);
    }

    #[test]
    fn merge_overrides_rejects_invalid_values() {
        let base = Config::default();
        let overrides = ConfigOverrides {
            trend_window_days: Some(0),
            ..ConfigOverrides::default()
        };

        let err = merge_overrides(&base, &overrides).unwrap_err();
        assert_eq!(err.code(), "invalid_data");
    }

    #[test]
    fn merge_with_empty_overrides_returns_clone() {
        let base = Config::default();
        let merged = merge_overrides(&base, &ConfigOverrides::default()).unwrap();

        assert_eq!(merged, base);
    }
}
