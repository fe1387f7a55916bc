use crate::model::{fresh_id, StoreError};
use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub type DayId = String;
pub type TaskId = String;

pub const DEFAULT_TITLE: &str = "My Schedule";
pub const DEFAULT_TIME_BUDGET: &str = "2 Hours";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn next(self) -> Self {
        match self {
            Priority::None => Priority::Low,
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::None => "",
            Priority::Low => "Low",
            Priority::Medium => "Med",
            Priority::High => "High",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Today,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Day {
    pub id: DayId,
    pub title: String,
    pub date: NaiveDate,
    pub time_budget: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TemplateTask {
    pub title: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DayTemplate {
    pub id: String,
    pub name: String,
    pub tasks: Vec<TemplateTask>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub title: String,
    #[serde(default)]
    pub days: Vec<Day>,
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub templates: Vec<DayTemplate>,
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            title: DEFAULT_TITLE.into(),
            days: Vec::new(),
            filter: Filter::All,
            templates: Vec::new(),
        }
    }
}

impl Task {
    fn blank(id: TaskId, title: String) -> Self {
        Task {
            id,
            title,
            details: Vec::new(),
            completed: false,
            priority: Priority::None,
            labels: BTreeSet::new(),
        }
    }
}

impl Day {
    pub fn display_date(&self) -> String {
        self.date.format("%-d %b").to_string()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn task_index(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }
}

impl Schedule {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn visible_days(&self, today: NaiveDate) -> Vec<&Day> {
        self.days
            .iter()
            .filter(|d| self.filter == Filter::All || d.date == today)
            .collect()
    }

    pub fn find_day_index(&self, id: &str) -> Option<usize> {
        self.days.iter().position(|d| d.id == id)
    }

    pub fn day(&self, id: &str) -> Option<&Day> {
        self.days.iter().find(|d| d.id == id)
    }

    /// Id of the day currently owning `task_id`.
    pub fn find_task_day(&self, task_id: &str) -> Option<&str> {
        self.days
            .iter()
            .find(|d| d.tasks.iter().any(|t| t.id == task_id))
            .map(|d| d.id.as_str())
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.days
            .iter()
            .flat_map(|d| d.tasks.iter())
            .find(|t| t.id == task_id)
    }

    pub fn task_count(&self) -> usize {
        self.days.iter().map(|d| d.tasks.len()).sum()
    }

    /// Appends a day dated after the last one, or `today` when the list is empty.
    pub fn add_day(&mut self, today: NaiveDate) -> DayId {
        let date = self
            .days
            .last()
            .map(|d| d.date + ChronoDuration::days(1))
            .unwrap_or(today);
        let id = self.fresh_id("id-");
        self.days.push(Day {
            id: id.clone(),
            title: date.format("%a").to_string(),
            date,
            time_budget: DEFAULT_TIME_BUDGET.into(),
            tasks: Vec::new(),
        });
        id
    }

    pub fn delete_day(&mut self, day_id: &str) -> Result<(), StoreError> {
        let idx = self.day_index_or_err(day_id)?;
        self.days.remove(idx);
        Ok(())
    }

    pub fn update_day<F>(&mut self, day_id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Day),
    {
        let idx = self.day_index_or_err(day_id)?;
        let day = &mut self.days[idx];
        let (id, tasks) = (day.id.clone(), day.tasks.clone());
        f(day);
        // identity and membership are not editable through a field update
        day.id = id;
        day.tasks = tasks;
        Ok(())
    }

    pub fn add_task(&mut self, day_id: &str, title: impl Into<String>) -> Result<TaskId, StoreError> {
        let idx = self.day_index_or_err(day_id)?;
        let id = self.fresh_id("id-");
        self.days[idx].tasks.push(Task::blank(id.clone(), title.into()));
        Ok(id)
    }

    pub fn delete_task(&mut self, day_id: &str, task_id: &str) -> Result<(), StoreError> {
        let (d, t) = self.task_position(day_id, task_id)?;
        self.days[d].tasks.remove(t);
        Ok(())
    }

    pub fn update_task<F>(&mut self, day_id: &str, task_id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Task),
    {
        let (d, t) = self.task_position(day_id, task_id)?;
        let task = &mut self.days[d].tasks[t];
        let id = task.id.clone();
        f(task);
        task.id = id;
        Ok(())
    }

    pub fn toggle_task(&mut self, day_id: &str, task_id: &str, checked: bool) -> Result<(), StoreError> {
        self.update_task(day_id, task_id, |t| t.completed = checked)
    }

    pub fn cycle_priority(&mut self, day_id: &str, task_id: &str) -> Result<Priority, StoreError> {
        let mut next = Priority::None;
        self.update_task(day_id, task_id, |t| {
            t.priority = t.priority.next();
            next = t.priority;
        })?;
        Ok(next)
    }

    pub fn toggle_label(&mut self, day_id: &str, task_id: &str, label: &str) -> Result<(), StoreError> {
        self.update_task(day_id, task_id, |t| {
            if !t.labels.remove(label) {
                t.labels.insert(label.to_string());
            }
        })
    }

    /// Removes the task from the source day and appends it to the target day.
    pub fn move_task(
        &mut self,
        task_id: &str,
        source_day_id: &str,
        target_day_id: &str,
    ) -> Result<(), StoreError> {
        let target_idx = self.day_index_or_err(target_day_id)?;
        let (src_idx, task_idx) = self.task_position(source_day_id, task_id)?;
        if src_idx == target_idx {
            return Ok(());
        }
        let task = self.days[src_idx].tasks.remove(task_idx);
        self.days[target_idx].tasks.push(task);
        tracing::debug!(task_id, source_day_id, target_day_id, "moved task");
        Ok(())
    }

    /// Replaces a day's task sequence with a permutation of itself.
    pub fn reorder_tasks(&mut self, day_id: &str, new_tasks: Vec<Task>) -> Result<(), StoreError> {
        let idx = self.day_index_or_err(day_id)?;
        if !is_permutation(&self.days[idx].tasks, &new_tasks) {
            return Err(StoreError::NotAPermutation(day_id.to_string()));
        }
        self.days[idx].tasks = new_tasks;
        Ok(())
    }

    pub fn save_as_template(&mut self, day_id: &str, name: impl Into<String>) -> Result<String, StoreError> {
        let idx = self.day_index_or_err(day_id)?;
        let tasks = self.days[idx]
            .tasks
            .iter()
            .map(|t| TemplateTask {
                title: t.title.clone(),
                details: t.details.clone(),
                priority: t.priority,
                labels: t.labels.clone(),
            })
            .collect();
        let id = self.fresh_id("tpl-");
        self.templates.push(DayTemplate {
            id: id.clone(),
            name: name.into(),
            tasks,
        });
        Ok(id)
    }

    pub fn apply_template(&mut self, day_id: &str, template_id: &str) -> Result<usize, StoreError> {
        let template = self
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
            .ok_or_else(|| StoreError::TemplateNotFound(template_id.to_string()))?;
        let idx = self.day_index_or_err(day_id)?;
        for entry in &template.tasks {
            let id = self.fresh_id("id-");
            self.days[idx].tasks.push(Task {
                id,
                title: entry.title.clone(),
                details: entry.details.clone(),
                completed: false,
                priority: entry.priority,
                labels: entry.labels.clone(),
            });
        }
        Ok(template.tasks.len())
    }

    pub fn delete_template(&mut self, template_id: &str) -> Result<(), StoreError> {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != template_id);
        if self.templates.len() == before {
            return Err(StoreError::TemplateNotFound(template_id.to_string()));
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Schedule::default();
    }

    fn fresh_id(&self, prefix: &str) -> String {
        fresh_id(prefix, |candidate| {
            self.days.iter().any(|d| d.id == candidate)
                || self.find_task(candidate).is_some()
                || self.templates.iter().any(|t| t.id == candidate)
        })
    }

    fn day_index_or_err(&self, day_id: &str) -> Result<usize, StoreError> {
        self.find_day_index(day_id)
            .ok_or_else(|| StoreError::DayNotFound(day_id.to_string()))
    }

    fn task_position(&self, day_id: &str, task_id: &str) -> Result<(usize, usize), StoreError> {
        let d = self.day_index_or_err(day_id)?;
        let t = self.days[d]
            .task_index(task_id)
            .ok_or_else(|| StoreError::TaskNotFound {
                day: day_id.to_string(),
                task: task_id.to_string(),
            })?;
        Ok((d, t))
    }
}

fn is_permutation(current: &[Task], proposed: &[Task]) -> bool {
    if current.len() != proposed.len() {
        return false;
    }
    let mut counts: HashMap<&str, isize> = HashMap::new();
    for t in current {
        *counts.entry(t.id.as_str()).or_default() += 1;
    }
    for t in proposed {
        *counts.entry(t.id.as_str()).or_default() -= 1;
    }
    counts.values().all(|c| *c == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn schedule_with(tasks_per_day: &[usize]) -> Schedule {
        let mut schedule = Schedule::default();
        for (i, count) in tasks_per_day.iter().enumerate() {
            let day_id = schedule.add_day(date("2024-03-01"));
            for n in 0..*count {
                schedule.add_task(&day_id, format!("d{}t{}", i, n)).unwrap();
            }
        }
        schedule
    }

    fn ids(day: &Day) -> Vec<String> {
        day.tasks.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_add_day_increments_date() {
        let mut schedule = Schedule::default();
        schedule.add_day(date("2024-02-28"));
        schedule.add_day(date("2030-01-01"));
        schedule.add_day(date("2030-01-01"));
        let dates: Vec<_> = schedule.days.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date("2024-02-28"), date("2024-02-29"), date("2024-03-01")]);
        assert_eq!(schedule.days[0].title, "Wed");
        assert_eq!(schedule.days[0].display_date(), "28 Feb");
        assert_eq!(schedule.days[0].time_budget, DEFAULT_TIME_BUDGET);
    }

    #[test]
    fn test_update_day_keeps_tasks_and_id() {
        let mut schedule = schedule_with(&[2]);
        let day_id = schedule.days[0].id.clone();
        schedule
            .update_day(&day_id, |d| {
                d.title = "Gym".into();
                d.tasks.clear();
                d.id = "other".into();
            })
            .unwrap();
        assert_eq!(schedule.days[0].title, "Gym");
        assert_eq!(schedule.days[0].id, day_id);
        assert_eq!(schedule.days[0].tasks.len(), 2);
    }

    #[test]
    fn test_move_task_appends_to_target() {
        let mut schedule = schedule_with(&[3, 1]);
        let (a, b) = (schedule.days[0].id.clone(), schedule.days[1].id.clone());
        let moved = schedule.days[0].tasks[1].id.clone();
        schedule.move_task(&moved, &a, &b).unwrap();
        assert_eq!(schedule.days[0].tasks.len(), 2);
        assert_eq!(schedule.days[1].tasks.last().map(|t| t.id.clone()), Some(moved.clone()));
        assert_eq!(schedule.find_task_day(&moved), Some(b.as_str()));
    }

    #[test]
    fn test_move_task_same_day_is_noop() {
        let mut schedule = schedule_with(&[3]);
        let before = schedule.clone();
        let day = schedule.days[0].id.clone();
        let task = schedule.days[0].tasks[0].id.clone();
        schedule.move_task(&task, &day, &day).unwrap();
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_move_task_missing_entities() {
        let mut schedule = schedule_with(&[1, 0]);
        let (a, b) = (schedule.days[0].id.clone(), schedule.days[1].id.clone());
        assert_eq!(
            schedule.move_task("nope", &a, &b),
            Err(StoreError::TaskNotFound {
                day: a.clone(),
                task: "nope".into()
            })
        );
        let task = schedule.days[0].tasks[0].id.clone();
        assert_eq!(
            schedule.move_task(&task, &a, "missing"),
            Err(StoreError::DayNotFound("missing".into()))
        );
        assert_eq!(schedule.days[0].tasks.len(), 1);
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let mut schedule = schedule_with(&[3]);
        let day = schedule.days[0].id.clone();
        let mut dropped = schedule.days[0].tasks.clone();
        dropped.pop();
        assert_eq!(
            schedule.reorder_tasks(&day, dropped),
            Err(StoreError::NotAPermutation(day.clone()))
        );
        let mut duplicated = schedule.days[0].tasks.clone();
        duplicated[2] = duplicated[0].clone();
        assert!(schedule.reorder_tasks(&day, duplicated).is_err());
        assert_eq!(schedule.days[0].tasks.len(), 3);
    }

    #[test]
    fn test_cycle_priority_and_labels() {
        let mut schedule = schedule_with(&[1]);
        let day = schedule.days[0].id.clone();
        let task = schedule.days[0].tasks[0].id.clone();
        let seen: Vec<_> = (0..4)
            .map(|_| schedule.cycle_priority(&day, &task).unwrap())
            .collect();
        assert_eq!(seen, vec![Priority::Low, Priority::Medium, Priority::High, Priority::None]);

        schedule.toggle_label(&day, &task, "Work").unwrap();
        assert!(schedule.days[0].tasks[0].labels.contains("Work"));
        schedule.toggle_label(&day, &task, "Work").unwrap();
        assert!(schedule.days[0].tasks[0].labels.is_empty());
    }

    #[test]
    fn test_templates_copy_and_apply() {
        let mut schedule = schedule_with(&[2, 0]);
        let (a, b) = (schedule.days[0].id.clone(), schedule.days[1].id.clone());
        let first = schedule.days[0].tasks[0].id.clone();
        schedule.toggle_task(&a, &first, true).unwrap();
        let tpl = schedule.save_as_template(&a, "Study day").unwrap();

        assert_eq!(schedule.apply_template(&b, &tpl).unwrap(), 2);
        let applied = &schedule.days[1].tasks;
        assert_eq!(applied.len(), 2);
        assert!(applied.iter().all(|t| !t.completed));
        assert!(applied.iter().all(|t| schedule.days[0].task_index(&t.id).is_none()));

        schedule.delete_template(&tpl).unwrap();
        assert_eq!(
            schedule.apply_template(&b, &tpl),
            Err(StoreError::TemplateNotFound(tpl.clone()))
        );
    }

    #[test]
    fn test_visible_days_today_filter() {
        let mut schedule = schedule_with(&[0, 0, 0]);
        schedule.set_filter(Filter::Today);
        let visible = schedule.visible_days(date("2024-03-02"));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].date, date("2024-03-02"));
    }

    #[test]
    fn test_delete_day_discards_tasks() {
        let mut schedule = schedule_with(&[2, 1]);
        let a = schedule.days[0].id.clone();
        schedule.delete_day(&a).unwrap();
        assert_eq!(schedule.task_count(), 1);
        schedule.reset();
        assert_eq!(schedule, Schedule::default());
    }

    proptest! {
        #[test]
        fn prop_move_preserves_total(counts in proptest::collection::vec(0usize..5, 2..5), pick in 0usize..20, target in 0usize..5) {
            let mut schedule = schedule_with(&counts);
            let total = schedule.task_count();
            let all: Vec<(String, String)> = schedule
                .days
                .iter()
                .flat_map(|d| d.tasks.iter().map(move |t| (d.id.clone(), t.id.clone())))
                .collect();
            prop_assume!(!all.is_empty());
            let (source, task) = all[pick % all.len()].clone();
            let target_id = schedule.days[target % schedule.days.len()].id.clone();

            schedule.move_task(&task, &source, &target_id).unwrap();

            prop_assert_eq!(schedule.task_count(), total);
            let owners: Vec<_> = schedule
                .days
                .iter()
                .filter(|d| d.task_index(&task).is_some())
                .map(|d| d.id.clone())
                .collect();
            prop_assert_eq!(owners, vec![target_id.clone()]);
            prop_assert_eq!(schedule.day(&target_id).map(|d| ids(d).iter().filter(|i| **i == task).count()), Some(1));
        }
    }
}
