use crate::config::Config;
use crate::model::calendar::CalendarEvents;
use crate::model::habits::Habits;
use crate::model::notes::Notes;
use crate::model::pomodoro::Pomodoro;
use crate::model::schedule::Schedule;
use crate::model::sticky::TaskBoard;
use crate::model::StoreError;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_DIR: &str = ".planboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceScope {
    Project,
    Global,
}

impl WorkspaceScope {
    pub fn label(self) -> &'static str {
        match self {
            WorkspaceScope::Project => "project",
            WorkspaceScope::Global => "global",
        }
    }
}

/// Directory holding one YAML file per store.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub dir: PathBuf,
    pub scope: WorkspaceScope,
}

/// A collection persisted as its own file inside the workspace.
pub trait Store: Serialize + DeserializeOwned + Default {
    const FILE: &'static str;

    /// Initial state when the workspace has no file for this store yet.
    fn fresh(_config: &Config) -> Self {
        Self::default()
    }

    /// Checks loaded values and rebuilds state that is not persisted.
    fn after_load(&mut self, _config: &Config) -> Result<(), StoreError> {
        Ok(())
    }
}

impl Store for Schedule {
    const FILE: &'static str = "schedule.yml";
}

impl Store for TaskBoard {
    const FILE: &'static str = "taskboard.yml";
}

impl Store for Habits {
    const FILE: &'static str = "habits.yml";
}

impl Store for CalendarEvents {
    const FILE: &'static str = "calendar.yml";
}

impl Store for Notes {
    const FILE: &'static str = "notes.yml";
}

impl Store for Pomodoro {
    const FILE: &'static str = "pomodoro.yml";

    fn fresh(config: &Config) -> Self {
        Pomodoro::with_settings(config.pomodoro)
    }

    fn after_load(&mut self, _config: &Config) -> Result<(), StoreError> {
        self.settings.validate()?;
        self.reset_timer();
        Ok(())
    }
}

impl Workspace {
    pub fn path_of<S: Store>(&self) -> PathBuf {
        self.dir.join(S::FILE)
    }
}

pub fn init_project_workspace() -> Result<Workspace> {
    let cwd = env::current_dir()?;
    let dir = cwd.join(PROJECT_DIR);
    fs::create_dir_all(&dir).context("failed to create .planboard directory")?;
    let workspace = Workspace {
        dir,
        scope: WorkspaceScope::Project,
    };
    if !workspace.dir.join(crate::config::CONFIG_FILE).exists() {
        Config::default().save(&workspace.dir)?;
    }
    Ok(workspace)
}

pub fn locate_workspace(start: &Path) -> Result<Workspace> {
    if let Some(dir) = find_project_workspace(start) {
        return Ok(Workspace {
            dir,
            scope: WorkspaceScope::Project,
        });
    }
    Ok(Workspace {
        dir: global_workspace_dir()?,
        scope: WorkspaceScope::Global,
    })
}

/// Loads a store, or its default when the file does not exist yet.
pub fn load_store<S: Store>(workspace: &Workspace, config: &Config) -> Result<S> {
    let path = workspace.path_of::<S>();
    let mut store: S = if path.exists() {
        let data = fs::read_to_string(&path).with_context(|| format!("reading {:?}", path))?;
        serde_yaml::from_str(&data).with_context(|| format!("parsing {:?}", path))?
    } else {
        S::fresh(config)
    };
    store
        .after_load(config)
        .with_context(|| format!("validating {:?}", path))?;
    Ok(store)
}

pub fn save_store<S: Store>(workspace: &Workspace, store: &S) -> Result<()> {
    fs::create_dir_all(&workspace.dir).with_context(|| format!("creating {:?}", workspace.dir))?;
    let path = workspace.path_of::<S>();
    let serialized = serde_yaml::to_string(store).with_context(|| format!("serializing {}", S::FILE))?;
    fs::write(&path, serialized).with_context(|| format!("writing {:?}", path))?;
    tracing::debug!(file = S::FILE, "store saved");
    Ok(())
}

fn find_project_workspace(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_workspace_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "planboard").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardConfig;
    use chrono::NaiveDate;

    fn workspace_in(dir: &Path) -> Workspace {
        Workspace {
            dir: dir.join(PROJECT_DIR),
            scope: WorkspaceScope::Project,
        }
    }

    #[test]
    fn test_missing_store_loads_default() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace_in(tmp.path());
        let schedule: Schedule = load_store(&ws, &Config::default()).unwrap();
        assert_eq!(schedule, Schedule::default());
        assert!(!ws.path_of::<Schedule>().exists());
    }

    #[test]
    fn test_store_survives_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace_in(tmp.path());
        let today = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        let mut schedule = Schedule::default();
        let day = schedule.add_day(today);
        let task = schedule.add_task(&day, "read").unwrap();
        schedule.toggle_label(&day, &task, "Study").unwrap();
        save_store(&ws, &schedule).unwrap();

        let mut habits = Habits::default();
        let habit = habits.add_habit("Stretch", None);
        habits.toggle_completion(&habit, today).unwrap();
        save_store(&ws, &habits).unwrap();

        let mut board = TaskBoard::default();
        board.add_task("note", &BoardConfig::default());
        save_store(&ws, &board).unwrap();

        let config = Config::default();
        assert_eq!(load_store::<Schedule>(&ws, &config).unwrap(), schedule);
        assert_eq!(load_store::<Habits>(&ws, &config).unwrap(), habits);
        assert_eq!(load_store::<TaskBoard>(&ws, &config).unwrap(), board);

        let raw = fs::read_to_string(ws.path_of::<Habits>()).unwrap();
        assert!(raw.contains("2024-04-01"));
    }

    #[test]
    fn test_pomodoro_timer_rebuilt_on_load() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace_in(tmp.path());
        let mut pomodoro = Pomodoro::default();
        pomodoro.update_settings(|s| s.focus_minutes = 40).unwrap();
        pomodoro.tick();
        save_store(&ws, &pomodoro).unwrap();

        let loaded: Pomodoro = load_store(&ws, &Config::default()).unwrap();
        assert_eq!(loaded.settings.focus_minutes, 40);
        assert_eq!(loaded.timer.time_left, 40 * 60);
    }

    #[test]
    fn test_pomodoro_with_bad_settings_fails_to_load() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace_in(tmp.path());
        fs::create_dir_all(&ws.dir).unwrap();
        let path = ws.path_of::<Pomodoro>();

        fs::write(&path, "settings:\n  sessions_before_long: 0\n").unwrap();
        assert!(load_store::<Pomodoro>(&ws, &Config::default()).is_err());

        fs::write(&path, "settings:\n  short_break_minutes: 4294967295\n").unwrap();
        assert!(load_store::<Pomodoro>(&ws, &Config::default()).is_err());

        fs::write(&path, "settings:\n  focus_minutes: 30\n").unwrap();
        let loaded: Pomodoro = load_store(&ws, &Config::default()).unwrap();
        assert_eq!(loaded.timer.time_left, 30 * 60);
    }

    #[test]
    fn test_fresh_pomodoro_uses_configured_settings() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = workspace_in(tmp.path());
        let mut config = Config::default();
        config.pomodoro.focus_minutes = 45;
        let pomodoro: Pomodoro = load_store(&ws, &config).unwrap();
        assert_eq!(pomodoro.settings.focus_minutes, 45);
        assert_eq!(pomodoro.timer.time_left, 45 * 60);
    }

    #[test]
    fn test_find_project_workspace_walks_up() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join(PROJECT_DIR)).unwrap();
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let ws = locate_workspace(&nested).unwrap();
        assert_eq!(ws.scope, WorkspaceScope::Project);
        assert_eq!(ws.dir, tmp.path().join(PROJECT_DIR));
    }
}
