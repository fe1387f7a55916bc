use crate::config::BoardConfig;
use crate::model::{fresh_id, palette_color, StoreError};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub type StickyId = String;

pub const STICKY_COLORS: [&str; 8] = [
    "#114b5f", "#6d1a36", "#A3A886", "#4a6741", "#7c5295", "#b8860b", "#2d5a7b", "#8b4513",
];

const GRID_COLUMNS: usize = 5;
const GRID_ORIGIN_X: i32 = 40;
const GRID_ORIGIN_Y: i32 = 20;
const GRID_PITCH_X: i32 = 200;
const GRID_PITCH_Y: i32 = 180;
const PLACEMENT_JITTER: i32 = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StickyTask {
    pub id: StickyId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub color: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct TaskBoard {
    #[serde(default)]
    pub tasks: Vec<StickyTask>,
}

impl StickyTask {
    /// Size with unset (zero) dimensions replaced by the board defaults.
    pub fn effective_size(&self, cfg: &BoardConfig) -> (i32, i32) {
        let w = if self.width > 0 { self.width } else { cfg.default_width };
        let h = if self.height > 0 { self.height } else { cfg.default_height };
        (w, h)
    }
}

impl TaskBoard {
    pub fn get(&self, id: &str) -> Option<&StickyTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Adds a task on the next slot of a staggered grid.
    pub fn add_task(&mut self, title: impl Into<String>, cfg: &BoardConfig) -> StickyId {
        let count = self.tasks.len();
        let col = (count % GRID_COLUMNS) as i32;
        let row = (count / GRID_COLUMNS) as i32;
        let mut rng = rand::thread_rng();
        let x = GRID_ORIGIN_X + col * GRID_PITCH_X + rng.gen_range(-PLACEMENT_JITTER..=PLACEMENT_JITTER);
        let y = GRID_ORIGIN_Y + row * GRID_PITCH_Y + rng.gen_range(-PLACEMENT_JITTER..=PLACEMENT_JITTER);
        let id = fresh_id("st-", |candidate| self.get(candidate).is_some());
        self.tasks.push(StickyTask {
            id: id.clone(),
            title: title.into(),
            completed: false,
            color: palette_color(&STICKY_COLORS, count),
            x: x.max(0),
            y: y.max(0),
            width: cfg.default_width,
            height: cfg.default_height,
        });
        id
    }

    pub fn update_task<F>(&mut self, id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut StickyTask),
    {
        let task = self.get_mut(id)?;
        let (x, y, w, h) = (task.x, task.y, task.width, task.height);
        f(task);
        // geometry only changes through move_task / resize_task
        task.id = id.to_string();
        task.x = x;
        task.y = y;
        task.width = w;
        task.height = h;
        Ok(())
    }

    pub fn move_task(&mut self, id: &str, x: i32, y: i32) -> Result<(), StoreError> {
        let task = self.get_mut(id)?;
        task.x = x;
        task.y = y;
        tracing::debug!(id, x, y, "sticky moved");
        Ok(())
    }

    pub fn resize_task(&mut self, id: &str, width: i32, height: i32) -> Result<(), StoreError> {
        let task = self.get_mut(id)?;
        task.width = width;
        task.height = height;
        tracing::debug!(id, width, height, "sticky resized");
        Ok(())
    }

    pub fn delete_task(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Err(StoreError::StickyNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        before - self.tasks.len()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut StickyTask, StoreError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::StickyNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_task_staggers_grid() {
        let cfg = BoardConfig::default();
        let mut board = TaskBoard::default();
        for n in 0..6 {
            board.add_task(format!("t{}", n), &cfg);
        }
        let first = &board.tasks[0];
        assert!((30..=50).contains(&first.x));
        assert!((10..=30).contains(&first.y));
        let fifth = &board.tasks[4];
        assert!((830..=850).contains(&fifth.x));
        let sixth = &board.tasks[5];
        assert!((30..=50).contains(&sixth.x));
        assert!((190..=210).contains(&sixth.y));
        assert_eq!(sixth.color, STICKY_COLORS[5]);
        assert_eq!((first.width, first.height), (cfg.default_width, cfg.default_height));
    }

    #[test]
    fn test_update_task_cannot_touch_geometry() {
        let cfg = BoardConfig::default();
        let mut board = TaskBoard::default();
        let id = board.add_task("write", &cfg);
        let before = board.get(&id).cloned().unwrap();
        board
            .update_task(&id, |t| {
                t.title = "rewrite".into();
                t.completed = true;
                t.x = 999;
                t.width = 1;
            })
            .unwrap();
        let after = board.get(&id).unwrap();
        assert_eq!(after.title, "rewrite");
        assert!(after.completed);
        assert_eq!((after.x, after.width), (before.x, before.width));
    }

    #[test]
    fn test_move_resize_and_missing() {
        let cfg = BoardConfig::default();
        let mut board = TaskBoard::default();
        let id = board.add_task("a", &cfg);
        board.move_task(&id, 300, 400).unwrap();
        board.resize_task(&id, 220, 90).unwrap();
        let t = board.get(&id).unwrap();
        assert_eq!((t.x, t.y, t.width, t.height), (300, 400, 220, 90));
        assert_eq!(
            board.move_task("st-missing", 1, 1),
            Err(StoreError::StickyNotFound("st-missing".into()))
        );
    }

    #[test]
    fn test_clear_completed_and_delete() {
        let cfg = BoardConfig::default();
        let mut board = TaskBoard::default();
        let a = board.add_task("a", &cfg);
        let b = board.add_task("b", &cfg);
        board.update_task(&b, |t| t.completed = true).unwrap();
        assert_eq!(board.clear_completed(), 1);
        assert!(board.get(&b).is_none());
        board.delete_task(&a).unwrap();
        assert!(board.tasks.is_empty());
    }

    #[test]
    fn test_effective_size_defaults_zero() {
        let cfg = BoardConfig::default();
        let task = StickyTask {
            id: "st-x".into(),
            title: String::new(),
            completed: false,
            color: STICKY_COLORS[0].into(),
            x: 0,
            y: 0,
            width: 0,
            height: 95,
        };
        assert_eq!(task.effective_size(&cfg), (170, 95));
    }
}
