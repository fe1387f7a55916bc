use crate::model::{fresh_id, palette_color, StoreError};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type HabitId = String;

pub const HABIT_COLORS: [&str; 8] = [
    "#114b5f", "#A3A886", "#6d1a36", "#63B3ED", "#D69E2E", "#9F7AEA", "#ED8936", "#48BB78",
];

pub const DEFAULT_STREAK_LOOKBACK_DAYS: u32 = 365;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    /// Sparse: a missing date means not completed.
    #[serde(default)]
    pub completions: BTreeMap<NaiveDate, bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Habits {
    #[serde(default)]
    pub habits: Vec<Habit>,
}

impl Habit {
    pub fn done_on(&self, date: NaiveDate) -> bool {
        self.completions.get(&date).copied().unwrap_or(false)
    }
}

/// Consecutive completed days ending at `as_of`, looking back at most `lookback` days.
pub fn current_streak(habit: &Habit, as_of: NaiveDate, lookback: u32) -> u32 {
    let mut streak = 0;
    for offset in 0..lookback {
        let day = as_of - ChronoDuration::days(i64::from(offset));
        if !habit.done_on(day) {
            break;
        }
        streak += 1;
    }
    streak
}

/// Longest run of completed days that are exactly one calendar day apart.
pub fn best_streak(habit: &Habit) -> u32 {
    let mut dates = habit
        .completions
        .iter()
        .filter(|(_, done)| **done)
        .map(|(date, _)| *date);
    let Some(mut prev) = dates.next() else {
        return 0;
    };
    let (mut best, mut run) = (1, 1);
    for date in dates {
        if (date - prev).num_days() == 1 {
            run += 1;
            best = best.max(run);
        } else {
            run = 1;
        }
        prev = date;
    }
    best
}

impl Habits {
    pub fn get(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    pub fn add_habit(&mut self, name: impl Into<String>, color: Option<String>) -> HabitId {
        let id = fresh_id("hab-", |candidate| self.get(candidate).is_some());
        let color = color.unwrap_or_else(|| palette_color(&HABIT_COLORS, self.habits.len()));
        self.habits.push(Habit {
            id: id.clone(),
            name: name.into(),
            color,
            created_at: Utc::now(),
            completions: BTreeMap::new(),
        });
        id
    }

    pub fn delete_habit(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.habits.len();
        self.habits.retain(|h| h.id != id);
        if self.habits.len() == before {
            return Err(StoreError::HabitNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Edits name or color; the id and completion history are preserved.
    pub fn update_habit<F>(&mut self, id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Habit),
    {
        let habit = self.get_mut(id)?;
        let (habit_id, created_at, completions) =
            (habit.id.clone(), habit.created_at, habit.completions.clone());
        f(habit);
        habit.id = habit_id;
        habit.created_at = created_at;
        habit.completions = completions;
        Ok(())
    }

    /// Flips the completion for `date`, treating an absent entry as not done.
    pub fn toggle_completion(&mut self, habit_id: &str, date: NaiveDate) -> Result<bool, StoreError> {
        let habit = self.get_mut(habit_id)?;
        let entry = habit.completions.entry(date).or_insert(false);
        *entry = !*entry;
        tracing::debug!(habit_id, %date, done = *entry, "toggled completion");
        Ok(*entry)
    }

    pub fn done_on(&self, date: NaiveDate) -> usize {
        self.habits.iter().filter(|h| h.done_on(date)).count()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Habit, StoreError> {
        self.habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| StoreError::HabitNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn habit_with(entries: &[(&str, bool)]) -> Habit {
        Habit {
            id: "hab-test".into(),
            name: "Read".into(),
            color: HABIT_COLORS[0].into(),
            created_at: Utc::now(),
            completions: entries.iter().map(|(d, v)| (date(d), *v)).collect(),
        }
    }

    #[test]
    fn test_streaks_break_on_false() {
        let habit = habit_with(&[
            ("2024-01-01", true),
            ("2024-01-02", true),
            ("2024-01-03", false),
            ("2024-01-04", true),
        ]);
        assert_eq!(current_streak(&habit, date("2024-01-04"), DEFAULT_STREAK_LOOKBACK_DAYS), 1);
        assert_eq!(best_streak(&habit), 2);
    }

    #[test]
    fn test_empty_habit_has_no_streaks() {
        let habit = habit_with(&[]);
        assert_eq!(current_streak(&habit, date("2024-01-04"), DEFAULT_STREAK_LOOKBACK_DAYS), 0);
        assert_eq!(best_streak(&habit), 0);
    }

    #[test]
    fn test_current_streak_requires_as_of_day() {
        let habit = habit_with(&[("2024-01-01", true), ("2024-01-02", true)]);
        assert_eq!(current_streak(&habit, date("2024-01-03"), 365), 0);
        assert_eq!(current_streak(&habit, date("2024-01-02"), 365), 2);
    }

    #[test]
    fn test_current_streak_is_bounded_by_lookback() {
        let start = date("2023-01-01");
        let mut habit = habit_with(&[]);
        for offset in 0..400 {
            habit.completions.insert(start + ChronoDuration::days(offset), true);
        }
        let as_of = start + ChronoDuration::days(399);
        assert_eq!(current_streak(&habit, as_of, 365), 365);
        assert_eq!(current_streak(&habit, as_of, 500), 400);
        assert_eq!(best_streak(&habit), 400);
    }

    #[test]
    fn test_best_streak_across_month_and_year() {
        let habit = habit_with(&[
            ("2023-12-30", true),
            ("2023-12-31", true),
            ("2024-01-01", true),
            ("2024-02-28", true),
            ("2024-02-29", true),
            ("2024-03-01", true),
            ("2024-03-02", true),
        ]);
        assert_eq!(best_streak(&habit), 4);
    }

    #[test]
    fn test_toggle_twice_restores_value() {
        let mut store = Habits::default();
        let id = store.add_habit("Run", None);
        let day = date("2024-05-05");
        assert!(store.toggle_completion(&id, day).unwrap());
        assert!(!store.toggle_completion(&id, day).unwrap());
        assert_eq!(store.get(&id).unwrap().completions.get(&day), Some(&false));
        assert_eq!(
            store.toggle_completion("hab-none", day),
            Err(StoreError::HabitNotFound("hab-none".into()))
        );
    }

    #[test]
    fn test_streaks_do_not_mutate() {
        let habit = habit_with(&[("2024-01-01", true), ("2024-01-03", false)]);
        let before = habit.clone();
        current_streak(&habit, date("2024-01-10"), 365);
        best_streak(&habit);
        assert_eq!(habit, before);
    }

    #[test]
    fn test_update_habit_keeps_history() {
        let mut store = Habits::default();
        let id = store.add_habit("Walk", Some("#000000".into()));
        store.toggle_completion(&id, date("2024-01-01")).unwrap();
        store
            .update_habit(&id, |h| {
                h.name = "Long walk".into();
                h.completions.clear();
            })
            .unwrap();
        let habit = store.get(&id).unwrap();
        assert_eq!(habit.name, "Long walk");
        assert_eq!(habit.color, "#000000");
        assert!(habit.done_on(date("2024-01-01")));
        assert_eq!(store.done_on(date("2024-01-01")), 1);
    }
}
