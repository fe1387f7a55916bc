use crate::model::habits::DEFAULT_STREAK_LOOKBACK_DAYS;
use crate::model::pomodoro::PomodoroSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub board: BoardConfig,
    pub habits: HabitsConfig,
    pub pomodoro: PomodoroSettings,
    pub log_level: Option<String>,
}

/// Sticky board geometry, in pixels.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct BoardConfig {
    pub min_width: i32,
    pub min_height: i32,
    pub default_width: i32,
    pub default_height: i32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            min_width: 120,
            min_height: 60,
            default_width: 170,
            default_height: 80,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct HabitsConfig {
    pub streak_lookback_days: u32,
}

impl Default for HabitsConfig {
    fn default() -> Self {
        HabitsConfig {
            streak_lookback_days: DEFAULT_STREAK_LOOKBACK_DAYS,
        }
    }
}

impl Config {
    /// Reads `config.yml` from the workspace directory, falling back to defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        let config: Config = serde_yaml::from_str(&data)
            .with_context(|| format!("parsing {:?}", path))?;
        config
            .pomodoro
            .validate()
            .with_context(|| format!("invalid pomodoro section in {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
        let path = dir.join(CONFIG_FILE);
        let serialized = serde_yaml::to_string(self).context("serializing config")?;
        fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.board.min_width, 120);
        assert_eq!(config.habits.streak_lookback_days, 365);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "board:\n  min_width: 200\nhabits:\n  streak_lookback_days: 30\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.board.min_width, 200);
        assert_eq!(config.board.min_height, 60);
        assert_eq!(config.habits.streak_lookback_days, 30);
        assert_eq!(config.pomodoro, PomodoroSettings::default());
    }

    #[test]
    fn test_bad_pomodoro_section_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "pomodoro:\n  sessions_before_long: 0\n").unwrap();
        assert!(Config::load(dir.path()).is_err());
        fs::write(&path, "pomodoro:\n  focus_minutes: 4294967295\n").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.log_level = Some("debug".into());
        config.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), config);
    }
}
