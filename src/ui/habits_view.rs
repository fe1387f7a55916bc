use super::{hex_color, truncate_text, App, DeleteTarget, InputAction, StoreKind};
use crate::model::habits::{best_streak, current_streak, Habit, Habits};
use anyhow::Result;
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

const HISTORY_DAYS: i64 = 14;
const NAME_WIDTH: usize = 18;

#[derive(Default)]
pub(super) struct HabitsView {
    selected: usize,
    /// Days before today the date cursor sits on.
    days_back: i64,
}

impl HabitsView {
    pub(super) fn clamp(&mut self, habits: &Habits) {
        self.selected = self.selected.min(habits.habits.len().saturating_sub(1));
    }

    pub(super) fn select_last(&mut self, habits: &Habits) {
        self.selected = habits.habits.len().saturating_sub(1);
    }

    fn cursor_date(&self, today: NaiveDate) -> NaiveDate {
        today - ChronoDuration::days(self.days_back)
    }
}

impl App {
    pub(super) fn handle_habits_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.habits_view.selected = self.habits_view.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => self.habits_view.selected += 1,
            KeyCode::Left | KeyCode::Char('h') => {
                self.habits_view.days_back = (self.habits_view.days_back + 1).min(HISTORY_DAYS - 1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.habits_view.days_back = (self.habits_view.days_back - 1).max(0);
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let date = self.habits_view.cursor_date(Local::now().date_naive());
                if let Some(habit_id) = self.selected_habit().map(|h| h.id.clone()) {
                    let done = self.habits.toggle_completion(&habit_id, date)?;
                    let state = if done { "done" } else { "not done" };
                    self.persist(StoreKind::Habits, format!("{} {} on {}", habit_id, state, date))?;
                }
            }
            KeyCode::Char('n') => self.prompt(InputAction::NewHabit, ""),
            KeyCode::Char('d') => {
                if let Some(habit_id) = self.selected_habit().map(|h| h.id.clone()) {
                    self.confirm_delete(DeleteTarget::Habit { habit_id });
                }
            }
            _ => {}
        }
        self.habits_view.clamp(&self.habits);
        Ok(())
    }

    fn selected_habit(&self) -> Option<&Habit> {
        self.habits.habits.get(self.habits_view.selected)
    }

    pub(super) fn draw_habits(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let today = Local::now().date_naive();
        let lookback = self.config.habits.streak_lookback_days;
        let cursor = self.habits_view.cursor_date(today);
        let dates: Vec<NaiveDate> = (0..HISTORY_DAYS)
            .rev()
            .map(|back| today - ChronoDuration::days(back))
            .collect();

        let mut lines = Vec::new();
        let mut header = vec![Span::raw(format!("{:width$} ", "", width = NAME_WIDTH))];
        for date in &dates {
            let style = if *date == cursor {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            header.push(Span::styled(format!("{:>3}", date.format("%d")), style));
        }
        header.push(Span::styled("   now best", Style::default().fg(Color::Gray)));
        lines.push(Line::from(header));

        if self.habits.habits.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "No habits yet (n adds one)",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for (idx, habit) in self.habits.habits.iter().enumerate() {
            let selected = idx == self.habits_view.selected;
            let color = hex_color(&habit.color);
            let mut name_style = Style::default().fg(color).add_modifier(Modifier::BOLD);
            if selected {
                name_style = name_style.add_modifier(Modifier::REVERSED);
            }
            let mut spans = vec![Span::styled(
                format!(
                    "{:width$} ",
                    truncate_text(&habit.name, NAME_WIDTH),
                    width = NAME_WIDTH
                ),
                name_style,
            )];
            for date in &dates {
                let mut style = Style::default().fg(if habit.done_on(*date) {
                    color
                } else {
                    Color::DarkGray
                });
                if selected && *date == cursor {
                    style = style.bg(Color::Rgb(252, 214, 112));
                }
                let mark = if habit.done_on(*date) { "  ■" } else { "  ·" };
                spans.push(Span::styled(mark, style));
            }
            spans.push(Span::styled(
                format!(
                    " {:>5} {:>4}",
                    current_streak(habit, today, lookback),
                    best_streak(habit)
                ),
                Style::default().fg(Color::LightYellow),
            ));
            lines.push(Line::from(spans));
        }

        let block = Block::default()
            .title(Span::styled(
                format!(
                    "Habits ({}/{} done today)",
                    self.habits.done_on(today),
                    self.habits.habits.len()
                ),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(Color::Rgb(16, 18, 24)));
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .block(block);
        f.render_widget(paragraph, area);
    }

    pub(super) fn habits_detail(&self) -> (Vec<Line<'static>>, String) {
        let today = Local::now().date_naive();
        let cursor = self.habits_view.cursor_date(today);
        match self.selected_habit() {
            Some(habit) => (
                vec![
                    Line::from(Span::styled(
                        habit.name.clone(),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(format!(
                        "{}: {}",
                        cursor.format("%a %-d %b"),
                        if habit.done_on(cursor) { "done" } else { "not done" }
                    )),
                ],
                "Selected".into(),
            ),
            None => (vec![Line::from("No habit selected")], "Selected".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_date_counts_back_from_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let view = HabitsView {
            selected: 0,
            days_back: 1,
        };
        assert_eq!(view.cursor_date(today), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
