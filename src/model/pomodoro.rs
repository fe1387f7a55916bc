use crate::model::{fresh_id, StoreError};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    #[default]
    Focus,
    ShortBreak,
    LongBreak,
}

impl TimerMode {
    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::ShortBreak => "short break",
            TimerMode::LongBreak => "long break",
        }
    }
}

pub const MAX_MINUTES: u32 = 24 * 60;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PomodoroSettings {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub sessions_before_long: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        PomodoroSettings {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_before_long: 4,
        }
    }
}

impl PomodoroSettings {
    pub fn minutes_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Focus => self.focus_minutes,
            TimerMode::ShortBreak => self.short_break_minutes,
            TimerMode::LongBreak => self.long_break_minutes,
        }
    }

    /// Durations must fall within one minute and one day; long breaks need a
    /// positive cadence.
    pub fn validate(&self) -> Result<(), StoreError> {
        let durations = [self.focus_minutes, self.short_break_minutes, self.long_break_minutes];
        if durations.iter().any(|m| *m == 0 || *m > MAX_MINUTES) {
            return Err(StoreError::InvalidSettings(format!(
                "durations must be between 1 and {} minutes",
                MAX_MINUTES
            )));
        }
        if self.sessions_before_long == 0 {
            return Err(StoreError::InvalidSettings(
                "sessions before a long break must be at least one".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PomodoroSession {
    pub id: String,
    pub date: NaiveDate,
    pub focus_minutes: u32,
    #[serde(default)]
    pub task_title: Option<String>,
    pub completed_at: DateTime<Local>,
}

/// Live countdown state; never written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub time_left: u32,
    pub is_running: bool,
    pub mode: TimerMode,
    pub current_task_title: String,
}

impl Default for Timer {
    fn default() -> Self {
        Timer {
            time_left: PomodoroSettings::default().focus_minutes * 60,
            is_running: false,
            mode: TimerMode::Focus,
            current_task_title: String::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Pomodoro {
    #[serde(default)]
    pub settings: PomodoroSettings,
    #[serde(default)]
    pub sessions: Vec<PomodoroSession>,
    #[serde(default)]
    pub sessions_completed: u32,
    #[serde(skip)]
    pub timer: Timer,
}

impl Pomodoro {
    pub fn with_settings(settings: PomodoroSettings) -> Self {
        let mut pomodoro = Pomodoro {
            settings,
            ..Pomodoro::default()
        };
        pomodoro.reset_timer();
        pomodoro
    }

    pub fn set_running(&mut self, running: bool) {
        self.timer.is_running = running;
    }

    pub fn set_task_title(&mut self, title: impl Into<String>) {
        self.timer.current_task_title = title.into();
    }

    pub fn set_mode(&mut self, mode: TimerMode) {
        self.timer.mode = mode;
        self.reset_timer();
    }

    /// Counts one second down, stopping at zero.
    pub fn tick(&mut self) {
        self.timer.time_left = self.timer.time_left.saturating_sub(1);
    }

    pub fn reset_timer(&mut self) {
        self.timer.time_left = self.settings.minutes_for(self.timer.mode).saturating_mul(60);
        self.timer.is_running = false;
    }

    /// Finishes the current period. A focus period is recorded and followed by a break.
    pub fn complete_session(&mut self, now: DateTime<Local>) -> TimerMode {
        let next = match self.timer.mode {
            TimerMode::Focus => {
                self.sessions_completed += 1;
                let title = self.timer.current_task_title.trim();
                let id = fresh_id("pom-", |candidate| self.sessions.iter().any(|s| s.id == candidate));
                self.sessions.push(PomodoroSession {
                    id,
                    date: now.date_naive(),
                    focus_minutes: self.settings.focus_minutes,
                    task_title: (!title.is_empty()).then(|| title.to_string()),
                    completed_at: now,
                });
                if self.sessions_completed % self.settings.sessions_before_long.max(1) == 0 {
                    TimerMode::LongBreak
                } else {
                    TimerMode::ShortBreak
                }
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Focus,
        };
        self.set_mode(next);
        next
    }

    pub fn update_settings<F>(&mut self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut PomodoroSettings),
    {
        let mut settings = self.settings;
        f(&mut settings);
        settings.validate()?;
        self.settings = settings;
        self.reset_timer();
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.sessions.clear();
        self.sessions_completed = 0;
    }

    pub fn sessions_on(&self, date: NaiveDate) -> impl Iterator<Item = &PomodoroSession> {
        self.sessions.iter().filter(move |s| s.date == date)
    }

    pub fn focus_minutes_on(&self, date: NaiveDate) -> u32 {
        self.sessions_on(date).map(|s| s.focus_minutes).sum()
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_tick_stops_at_zero() {
        let mut p = Pomodoro::with_settings(PomodoroSettings {
            focus_minutes: 1,
            ..PomodoroSettings::default()
        });
        assert_eq!(p.timer.time_left, 60);
        for _ in 0..70 {
            p.tick();
        }
        assert_eq!(p.timer.time_left, 0);
    }

    #[test]
    fn test_long_break_every_n_sessions() {
        let mut p = Pomodoro::with_settings(PomodoroSettings {
            sessions_before_long: 2,
            ..PomodoroSettings::default()
        });
        p.set_task_title("  write report ");
        assert_eq!(p.complete_session(at(2024, 1, 1)), TimerMode::ShortBreak);
        assert_eq!(p.timer.time_left, 5 * 60);
        assert_eq!(p.complete_session(at(2024, 1, 1)), TimerMode::Focus);
        assert_eq!(p.complete_session(at(2024, 1, 1)), TimerMode::LongBreak);
        assert_eq!(p.timer.time_left, 15 * 60);
        assert!(!p.timer.is_running);
        assert_eq!(p.sessions_completed, 2);
        assert_eq!(p.sessions[0].task_title.as_deref(), Some("write report"));
        assert_eq!(p.focus_minutes_on(at(2024, 1, 1).date_naive()), 50);
        assert_eq!(p.focus_minutes_on(at(2024, 1, 2).date_naive()), 0);
    }

    #[test]
    fn test_update_settings_validates() {
        let mut p = Pomodoro::default();
        assert!(p.update_settings(|s| s.focus_minutes = 0).is_err());
        assert_eq!(p.settings, PomodoroSettings::default());
        p.update_settings(|s| s.focus_minutes = 50).unwrap();
        assert_eq!(p.timer.time_left, 50 * 60);
    }

    #[test]
    fn test_settings_bounds() {
        let mut p = Pomodoro::default();
        assert!(p.update_settings(|s| s.focus_minutes = u32::MAX).is_err());
        assert!(p.update_settings(|s| s.long_break_minutes = MAX_MINUTES + 1).is_err());
        assert!(p.update_settings(|s| s.sessions_before_long = 0).is_err());
        p.update_settings(|s| s.focus_minutes = MAX_MINUTES).unwrap();
        assert_eq!(p.timer.time_left, MAX_MINUTES * 60);
    }

    #[test]
    fn test_unchecked_settings_do_not_panic() {
        let mut p = Pomodoro::with_settings(PomodoroSettings {
            focus_minutes: u32::MAX,
            sessions_before_long: 0,
            ..PomodoroSettings::default()
        });
        assert_eq!(p.timer.time_left, u32::MAX);
        assert_eq!(p.complete_session(at(2024, 1, 1)), TimerMode::LongBreak);
    }

    #[test]
    fn test_clear_history_and_clock() {
        let mut p = Pomodoro::default();
        p.complete_session(at(2024, 1, 1));
        p.clear_history();
        assert!(p.sessions.is_empty());
        assert_eq!(p.sessions_completed, 0);
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(61), "01:01");
    }
}
