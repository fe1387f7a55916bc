use crate::model::schedule::{Schedule, Task};

/// What the pointer is currently over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Task { task_id: String },
    /// The body of a day column, including an empty one.
    Day { day_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    /// Snapshot taken at drag start, used for the drag overlay.
    pub task: Task,
    pub source_day_id: String,
}

/// Translates a drag gesture over day columns into schedule mutations.
///
/// Crossing into another day moves the task immediately, while reordering
/// inside a day waits for the drop.
#[derive(Debug, Default)]
pub struct ColumnarDrag {
    session: Option<DragSession>,
}

impl ColumnarDrag {
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn on_drag_start(&mut self, schedule: &Schedule, task_id: &str) {
        self.session = match (schedule.find_task(task_id), schedule.find_task_day(task_id)) {
            (Some(task), Some(day_id)) => Some(DragSession {
                task: task.clone(),
                source_day_id: day_id.to_string(),
            }),
            _ => None,
        };
    }

    /// Moves the dragged task when the hovered target belongs to another day.
    /// Returns whether the schedule changed.
    pub fn on_drag_over(&mut self, schedule: &mut Schedule, target: Option<&DropTarget>) -> bool {
        let (Some(session), Some(target)) = (self.session.as_ref(), target) else {
            return false;
        };
        let task_id = session.task.id.as_str();
        if matches!(target, DropTarget::Task { task_id: over } if over == task_id) {
            return false;
        }
        let Some(current_day) = schedule.find_task_day(task_id).map(str::to_string) else {
            return false;
        };
        let Some(target_day) = owning_day(schedule, target) else {
            return false;
        };
        if target_day == current_day {
            return false;
        }
        match schedule.move_task(task_id, &current_day, &target_day) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "drag over ignored");
                false
            }
        }
    }

    /// Commits a reorder when the task is dropped on another task of its own
    /// day. The session ends whatever the outcome.
    pub fn on_drag_end(&mut self, schedule: &mut Schedule, target: Option<&DropTarget>) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        let Some(DropTarget::Task { task_id: over_id }) = target else {
            return false;
        };
        let task_id = session.task.id.as_str();
        if over_id == task_id {
            return false;
        }
        let (Some(day_id), Some(over_day)) = (schedule.find_task_day(task_id), schedule.find_task_day(over_id))
        else {
            return false;
        };
        if day_id != over_day {
            return false;
        }
        let day_id = day_id.to_string();
        reorder_within_day(schedule, &day_id, task_id, over_id)
    }

    /// Abandons the drag. Cross-day moves already made on hover stay.
    pub fn cancel(&mut self) {
        self.session = None;
    }
}

/// Shifts a task `offset` places within its day, clamped to the ends.
pub fn nudge(schedule: &mut Schedule, task_id: &str, offset: isize) -> bool {
    let Some(day) = schedule
        .find_task_day(task_id)
        .and_then(|id| schedule.day(id))
    else {
        return false;
    };
    let Some(from) = day.task_index(task_id) else {
        return false;
    };
    let last = day.tasks.len().saturating_sub(1) as isize;
    let to = (from as isize + offset).clamp(0, last) as usize;
    if to == from {
        return false;
    }
    let (day_id, over_id) = (day.id.clone(), day.tasks[to].id.clone());
    reorder_within_day(schedule, &day_id, task_id, &over_id)
}

/// Removes the element at `from` and reinserts it at `to`.
pub fn array_move<T>(mut items: Vec<T>, from: usize, to: usize) -> Vec<T> {
    if from >= items.len() || to >= items.len() {
        return items;
    }
    let item = items.remove(from);
    items.insert(to, item);
    items
}

fn reorder_within_day(schedule: &mut Schedule, day_id: &str, task_id: &str, over_id: &str) -> bool {
    let Some(day) = schedule.day(day_id) else {
        return false;
    };
    let (Some(from), Some(to)) = (day.task_index(task_id), day.task_index(over_id)) else {
        return false;
    };
    let reordered = array_move(day.tasks.clone(), from, to);
    match schedule.reorder_tasks(day_id, reordered) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(%err, "reorder ignored");
            false
        }
    }
}

fn owning_day(schedule: &Schedule, target: &DropTarget) -> Option<String> {
    match target {
        DropTarget::Task { task_id } => schedule.find_task_day(task_id).map(str::to_string),
        DropTarget::Day { day_id } => schedule.day(day_id).map(|d| d.id.clone()),
    }
}
