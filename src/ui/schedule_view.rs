use super::{adjust_offset, color_for_index, truncate_text, App, DeleteTarget, InputAction, StoreKind};
use crate::drag::columnar::{nudge, ColumnarDrag, DropTarget};
use crate::drag::{self, closest_corners, Point};
use crate::model::schedule::{Filter, Priority, Schedule, Task};
use anyhow::Result;
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

const MIN_COLUMN_WIDTH: u16 = 24;

/// Selection, pointer state and the cell layout of the last frame.
#[derive(Default)]
pub(super) struct ScheduleView {
    selected_day: usize,
    selected_task: usize,
    drag: ColumnarDrag,
    press: Option<Press>,
    overlay: Option<drag::Rect>,
    day_areas: Vec<(Rect, String)>,
    task_areas: Vec<(Rect, String)>,
}

#[derive(Clone)]
struct Press {
    task_id: String,
    origin: Point,
    start: drag::Rect,
}

fn cell_rect(area: Rect) -> drag::Rect {
    drag::Rect::new(
        area.x as i32,
        area.y as i32,
        area.width as i32,
        area.height as i32,
    )
}

impl ScheduleView {
    pub(super) fn cancel_drag(&mut self) {
        self.drag.cancel();
        self.press = None;
        self.overlay = None;
    }

    pub(super) fn clamp(&mut self, schedule: &Schedule) {
        let days = visible_day_ids(schedule);
        self.selected_day = self.selected_day.min(days.len().saturating_sub(1));
        let len = days
            .get(self.selected_day)
            .and_then(|id| schedule.day(id))
            .map(|d| d.tasks.len())
            .unwrap_or(0);
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    fn task_at(&self, pointer: Point) -> Option<(drag::Rect, String)> {
        self.task_areas
            .iter()
            .map(|(area, id)| (cell_rect(*area), id))
            .find(|(rect, _)| rect.contains(pointer))
            .map(|(rect, id)| (rect, id.clone()))
    }

    /// Closest-corners target for the dragged rectangle over the last frame's
    /// task rows and day columns.
    fn drop_target(&self, active: &drag::Rect) -> Option<DropTarget> {
        let candidates: Vec<(drag::Rect, DropTarget)> = self
            .task_areas
            .iter()
            .map(|(area, id)| {
                (
                    cell_rect(*area),
                    DropTarget::Task {
                        task_id: id.clone(),
                    },
                )
            })
            .chain(self.day_areas.iter().map(|(area, id)| {
                (
                    cell_rect(*area),
                    DropTarget::Day { day_id: id.clone() },
                )
            }))
            .collect();
        closest_corners(active, &candidates).cloned()
    }
}

fn visible_day_ids(schedule: &Schedule) -> Vec<String> {
    schedule
        .visible_days(Local::now().date_naive())
        .into_iter()
        .map(|d| d.id.clone())
        .collect()
}

impl App {
    pub(super) fn handle_schedule_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                if self.schedule_view.selected_day > 0 {
                    self.schedule_view.selected_day -= 1;
                    self.schedule_view.selected_task = 0;
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.schedule_view.selected_day += 1;
                self.schedule_view.selected_task = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.schedule_view.selected_task = self.schedule_view.selected_task.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => self.schedule_view.selected_task += 1,
            KeyCode::Char('m') | KeyCode::Char('>') => self.move_selected_task(1)?,
            KeyCode::Char('b') | KeyCode::Char('<') => self.move_selected_task(-1)?,
            KeyCode::Char('J') => self.nudge_selected_task(1)?,
            KeyCode::Char('K') => self.nudge_selected_task(-1)?,
            KeyCode::Char('a') => {
                let id = self.schedule.add_day(Local::now().date_naive());
                if let Some(idx) = visible_day_ids(&self.schedule).iter().position(|d| *d == id) {
                    self.schedule_view.selected_day = idx;
                    self.schedule_view.selected_task = 0;
                }
                self.persist(StoreKind::Schedule, format!("Added day {}", id))?;
            }
            KeyCode::Char('f') => {
                let next = match self.schedule.filter {
                    Filter::All => Filter::Today,
                    Filter::Today => Filter::All,
                };
                self.schedule.set_filter(next);
                self.schedule_view.selected_day = 0;
                self.persist(StoreKind::Schedule, format!("Filter: {:?}", next))?;
            }
            KeyCode::Char('n') => match self.current_day_id() {
                Some(day_id) => self.prompt(InputAction::NewTask { day_id }, ""),
                None => self.status = "Add a day first (a)".into(),
            },
            KeyCode::Char('e') => match self.current_task() {
                Some((day_id, task)) => {
                    let title = task.title.clone();
                    let task_id = task.id.clone();
                    self.prompt(InputAction::RenameTask { day_id, task_id }, &title);
                }
                None => self.status = "No task selected".into(),
            },
            KeyCode::Char('x') | KeyCode::Char(' ') => {
                if let Some((day_id, task)) = self.current_task() {
                    let (task_id, checked) = (task.id.clone(), !task.completed);
                    self.schedule.toggle_task(&day_id, &task_id, checked)?;
                    let verb = if checked { "Completed" } else { "Reopened" };
                    self.persist(StoreKind::Schedule, format!("{} {}", verb, task_id))?;
                }
            }
            KeyCode::Char('p') => {
                if let Some((day_id, task)) = self.current_task() {
                    let task_id = task.id.clone();
                    let priority = self.schedule.cycle_priority(&day_id, &task_id)?;
                    self.persist(
                        StoreKind::Schedule,
                        format!("Priority {:?} on {}", priority, task_id),
                    )?;
                }
            }
            KeyCode::Char('d') => {
                if let Some((day_id, task)) = self.current_task() {
                    let task_id = task.id.clone();
                    self.confirm_delete(DeleteTarget::Task { day_id, task_id });
                } else if let Some(day_id) = self.current_day_id() {
                    self.confirm_delete(DeleteTarget::Day { day_id });
                }
            }
            KeyCode::Esc => {
                self.schedule_view.cancel_drag();
                self.status = "Drag canceled".into();
            }
            _ => {}
        }
        self.schedule_view.clamp(&self.schedule);
        Ok(())
    }

    pub(super) fn handle_schedule_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        let pointer = Point::new(mouse.column as i32, mouse.row as i32);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.schedule_view.cancel_drag();
                if let Some((start, task_id)) = self.schedule_view.task_at(pointer) {
                    self.follow_task(&task_id);
                    self.schedule_view.press = Some(Press {
                        task_id,
                        origin: pointer,
                        start,
                    });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(press) = self.schedule_view.press.clone() else {
                    return Ok(());
                };
                if !self.schedule_view.drag.is_dragging() {
                    self.schedule_view.drag.on_drag_start(&self.schedule, &press.task_id);
                    tracing::debug!(task = %press.task_id, "drag started");
                }
                let (dx, dy) = pointer.delta_from(press.origin);
                let active = press.start.translate(dx, dy);
                self.schedule_view.overlay = Some(active);
                let target = self.schedule_view.drop_target(&active);
                if self
                    .schedule_view
                    .drag
                    .on_drag_over(&mut self.schedule, target.as_ref())
                {
                    self.follow_task(&press.task_id);
                    self.persist(StoreKind::Schedule, format!("Moved {}", press.task_id))?;
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.schedule_view.overlay = None;
                let Some(press) = self.schedule_view.press.take() else {
                    return Ok(());
                };
                if !self.schedule_view.drag.is_dragging() {
                    return Ok(());
                }
                let (dx, dy) = pointer.delta_from(press.origin);
                let target = self
                    .schedule_view
                    .drop_target(&press.start.translate(dx, dy));
                if self
                    .schedule_view
                    .drag
                    .on_drag_end(&mut self.schedule, target.as_ref())
                {
                    self.follow_task(&press.task_id);
                    self.persist(StoreKind::Schedule, format!("Reordered {}", press.task_id))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Points the selection at a task wherever it currently lives.
    pub(super) fn follow_task(&mut self, task_id: &str) {
        let Some(day_id) = self.schedule.find_task_day(task_id) else {
            return;
        };
        let days = visible_day_ids(&self.schedule);
        if let Some(day_idx) = days.iter().position(|d| d == day_id) {
            self.schedule_view.selected_day = day_idx;
            self.schedule_view.selected_task = self
                .schedule
                .day(day_id)
                .and_then(|d| d.task_index(task_id))
                .unwrap_or(0);
        }
    }

    fn current_day_id(&self) -> Option<String> {
        visible_day_ids(&self.schedule)
            .get(self.schedule_view.selected_day)
            .cloned()
    }

    fn current_task(&self) -> Option<(String, &Task)> {
        let day_id = self.current_day_id()?;
        let task = self
            .schedule
            .day(&day_id)?
            .tasks
            .get(self.schedule_view.selected_task)?;
        Some((day_id, task))
    }

    fn move_selected_task(&mut self, delta: isize) -> Result<()> {
        let Some((source, task)) = self.current_task() else {
            self.status = "No task selected".into();
            return Ok(());
        };
        let task_id = task.id.clone();
        let days = visible_day_ids(&self.schedule);
        let target_idx = self.schedule_view.selected_day as isize + delta;
        if target_idx < 0 || target_idx as usize >= days.len() {
            self.status = "No day in that direction".into();
            return Ok(());
        }
        let target = days[target_idx as usize].clone();
        match self.schedule.move_task(&task_id, &source, &target) {
            Ok(()) => {
                self.follow_task(&task_id);
                self.persist(StoreKind::Schedule, format!("Moved {} to {}", task_id, target))?;
            }
            Err(err) => self.status = format!("Move failed: {}", err),
        }
        Ok(())
    }

    fn nudge_selected_task(&mut self, offset: isize) -> Result<()> {
        let Some((_, task)) = self.current_task() else {
            return Ok(());
        };
        let task_id = task.id.clone();
        if nudge(&mut self.schedule, &task_id, offset) {
            self.follow_task(&task_id);
            self.persist(StoreKind::Schedule, format!("Reordered {}", task_id))?;
        }
        Ok(())
    }

    pub(super) fn draw_schedule(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        self.schedule_view.day_areas.clear();
        self.schedule_view.task_areas.clear();
        let today = Local::now().date_naive();
        let days = self.schedule.visible_days(today);
        if days.is_empty() {
            let hint = match self.schedule.filter {
                Filter::Today => "Nothing scheduled today (f shows all days)",
                Filter::All => "No days yet (a adds one)",
            };
            let msg = Paragraph::new(hint)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("planboard"));
            f.render_widget(Clear, area);
            f.render_widget(msg, area);
            return;
        }

        let per_screen = (area.width / MIN_COLUMN_WIDTH).max(1) as usize;
        let first = self
            .schedule_view
            .selected_day
            .saturating_sub(per_screen.saturating_sub(1))
            .min(days.len().saturating_sub(per_screen));
        let shown = &days[first..days.len().min(first + per_screen)];
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                shown
                    .iter()
                    .map(|_| Constraint::Ratio(1, shown.len() as u32))
                    .collect::<Vec<_>>(),
            )
            .split(area);

        let dragged = self.schedule_view.drag.session().map(|s| s.task.id.clone());
        for (offset, day) in shown.iter().enumerate() {
            let idx = first + offset;
            let selected_day = idx == self.schedule_view.selected_day;
            let accent = color_for_index(idx);
            let block = Block::default()
                .title(Span::styled(
                    format!(
                        "{} {} ({}/{}) {}",
                        day.title,
                        day.display_date(),
                        day.completed_count(),
                        day.tasks.len(),
                        day.time_budget
                    ),
                    Style::default()
                        .fg(accent)
                        .add_modifier(if selected_day {
                            Modifier::BOLD | Modifier::UNDERLINED
                        } else {
                            Modifier::BOLD
                        }),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent))
                .style(Style::default().bg(Color::Rgb(16, 18, 24)));
            let inner = block.inner(chunks[offset]);
            f.render_widget(block, chunks[offset]);
            self.schedule_view
                .day_areas
                .push((chunks[offset], day.id.clone()));

            if day.tasks.is_empty() {
                f.render_widget(
                    Paragraph::new(Span::styled("(empty)", Style::default().fg(Color::DarkGray))),
                    Rect { height: inner.height.min(1), ..inner },
                );
                continue;
            }
            let viewport = inner.height as usize;
            let scroll = if selected_day {
                adjust_offset(self.schedule_view.selected_task, 0, viewport, 1, day.tasks.len())
            } else {
                0
            };
            for (row, (t_idx, task)) in day.tasks.iter().enumerate().skip(scroll).enumerate() {
                if row >= viewport {
                    break;
                }
                let row_area = Rect {
                    y: inner.y + row as u16,
                    height: 1,
                    ..inner
                };
                let selected = selected_day && t_idx == self.schedule_view.selected_task;
                let lifted = dragged.as_deref() == Some(task.id.as_str());
                f.render_widget(
                    Paragraph::new(task_line(task, inner.width as usize, selected, lifted)),
                    row_area,
                );
                self.schedule_view.task_areas.push((row_area, task.id.clone()));
            }
        }

        if let (Some(rect), Some(session)) = (self.schedule_view.overlay, self.schedule_view.drag.session()) {
            draw_overlay(f, area, rect, &session.task);
        }
    }

    pub(super) fn schedule_detail(&self) -> (Vec<Line<'static>>, String) {
        match self.current_task() {
            Some((_, task)) => {
                let mut lines = vec![Line::from(Span::styled(
                    task.title.clone(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))];
                for detail in &task.details {
                    lines.push(Line::from(format!("- {}", detail)));
                }
                (lines, "Selected".into())
            }
            None => (vec![Line::from("No task selected")], "Selected".into()),
        }
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::None => Color::Gray,
        Priority::Low => Color::LightBlue,
        Priority::Medium => Color::LightYellow,
        Priority::High => Color::LightRed,
    }
}

fn task_line(task: &Task, width: usize, selected: bool, lifted: bool) -> Line<'static> {
    let mut spans = vec![Span::styled(
        if task.completed { "[x] " } else { "[ ] " },
        Style::default().fg(Color::DarkGray),
    )];
    let mut title_style = Style::default().fg(Color::White);
    if task.completed {
        title_style = title_style.fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT);
    }
    if selected {
        title_style = title_style
            .bg(Color::Rgb(252, 214, 112))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD);
    }
    if lifted {
        title_style = title_style.add_modifier(Modifier::DIM);
    }
    spans.push(Span::styled(
        truncate_text(&task.title, width.saturating_sub(4)),
        title_style,
    ));
    if task.priority != Priority::None {
        spans.push(Span::styled(
            format!(" !{}", task.priority.label()),
            Style::default().fg(priority_color(task.priority)),
        ));
    }
    for label in &task.labels {
        spans.push(Span::styled(
            format!(" #{}", label),
            Style::default().fg(Color::LightMagenta),
        ));
    }
    Line::from(spans)
}

/// Floating copy of the dragged task, clipped to the board area.
fn draw_overlay(f: &mut ratatui::Frame<'_>, area: Rect, rect: drag::Rect, task: &Task) {
    let left = rect.x.max(area.x as i32);
    let top = rect.y.max(area.y as i32);
    let right = (rect.x + rect.width).min((area.x + area.width) as i32);
    let bottom = (rect.y + rect.height + 2).min((area.y + area.height) as i32);
    if right - left < 4 || bottom - top < 3 {
        return;
    }
    let cells = Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    );
    let card = Paragraph::new(task_line(task, cells.width.saturating_sub(2) as usize, false, false))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Rgb(252, 214, 112))),
        );
    f.render_widget(Clear, cells);
    f.render_widget(card, cells);
}
