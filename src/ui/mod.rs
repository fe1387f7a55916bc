mod habits_view;
mod schedule_view;
mod sticky_view;

use crate::config::Config;
use crate::model::habits::Habits;
use crate::model::schedule::Schedule;
use crate::model::sticky::TaskBoard;
use crate::storage::{load_store, save_store, Workspace};
use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use habits_view::HabitsView;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use schedule_view::ScheduleView;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};
use sticky_view::StickyView;

pub fn run(workspace: Workspace, config: Config) -> Result<()> {
    let mut app = App::load(workspace, config)?;
    let mut terminal = setup_terminal()?;
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App {
    workspace: Workspace,
    config: Config,
    schedule: Schedule,
    board: TaskBoard,
    habits: Habits,
    view: ViewMode,
    mode: Mode,
    status: String,
    last_save: Instant,
    schedule_view: ScheduleView,
    sticky_view: StickyView,
    habits_view: HabitsView,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ViewMode {
    Schedule,
    Sticky,
    Habits,
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Schedule => "Schedule",
            ViewMode::Sticky => "Sticky Board",
            ViewMode::Habits => "Habits",
        }
    }
}

/// Which file a mutation has to be written back to.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum StoreKind {
    Schedule,
    Board,
    Habits,
}

enum Mode {
    Normal,
    Input { action: InputAction, field: FieldValue },
    ConfirmDelete(DeleteTarget),
}

#[derive(Clone, Debug)]
enum InputAction {
    NewTask { day_id: String },
    RenameTask { day_id: String, task_id: String },
    NewSticky,
    EditSticky { sticky_id: String },
    NewHabit,
}

impl InputAction {
    fn prompt(&self) -> &'static str {
        match self {
            InputAction::NewTask { .. } => "New Task",
            InputAction::RenameTask { .. } => "Rename Task",
            InputAction::NewSticky => "New Sticky Note",
            InputAction::EditSticky { .. } => "Edit Sticky Note",
            InputAction::NewHabit => "New Habit",
        }
    }
}

#[derive(Clone, Debug)]
enum DeleteTarget {
    Task { day_id: String, task_id: String },
    Day { day_id: String },
    Sticky { sticky_id: String },
    Habit { habit_id: String },
}

#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_grapheme(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_grapheme(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_grapheme(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }
}

impl App {
    fn load(workspace: Workspace, config: Config) -> Result<Self> {
        let schedule: Schedule = load_store(&workspace, &config)?;
        let board: TaskBoard = load_store(&workspace, &config)?;
        let habits: Habits = load_store(&workspace, &config)?;
        let status = format!("Loaded workspace from {}", workspace.dir.display());
        let sticky_view = StickyView::new(config.board);
        Ok(App {
            workspace,
            config,
            schedule,
            board,
            habits,
            view: ViewMode::Schedule,
            mode: Mode::Normal,
            status,
            last_save: Instant::now(),
            schedule_view: ScheduleView::default(),
            sticky_view,
            habits_view: HabitsView::default(),
        })
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                match event::read()? {
                    Event::Key(key) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle_key(key)? {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Input { .. } => self.handle_input_key(key),
            Mode::ConfirmDelete(_) => self.handle_confirm_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('1') => {
                self.set_view(ViewMode::Schedule);
                return Ok(false);
            }
            KeyCode::Char('2') => {
                self.set_view(ViewMode::Sticky);
                return Ok(false);
            }
            KeyCode::Char('3') => {
                self.set_view(ViewMode::Habits);
                return Ok(false);
            }
            _ => {}
        }

        match self.view {
            ViewMode::Schedule => self.handle_schedule_key(key)?,
            ViewMode::Sticky => self.handle_sticky_key(key)?,
            ViewMode::Habits => self.handle_habits_key(key)?,
        }
        Ok(false)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if !matches!(self.mode, Mode::Normal) {
            return Ok(());
        }
        match self.view {
            ViewMode::Schedule => self.handle_schedule_mouse(mouse),
            ViewMode::Sticky => self.handle_sticky_mouse(mouse),
            ViewMode::Habits => Ok(()),
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        if let Mode::Input { action, field } = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    close = true;
                    self.status = "Canceled".into();
                }
                KeyCode::Enter => {
                    close = self.submit_input(action.clone(), field.value.trim())?;
                }
                KeyCode::Left => field.move_left(),
                KeyCode::Right => field.move_right(),
                KeyCode::Backspace => field.backspace(),
                KeyCode::Char(c) => {
                    if !key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    {
                        field.insert_char(c);
                    }
                }
                _ => {}
            }
        }
        if !close {
            self.mode = mode;
        }
        Ok(false)
    }

    /// Applies a submitted prompt. Returns whether the prompt can close.
    fn submit_input(&mut self, action: InputAction, text: &str) -> Result<bool> {
        match action {
            InputAction::NewTask { day_id } => {
                if text.is_empty() {
                    self.status = "Task title required".into();
                    return Ok(false);
                }
                match self.schedule.add_task(&day_id, text) {
                    Ok(id) => {
                        self.follow_task(&id);
                        self.persist(StoreKind::Schedule, format!("Added task {}", id))?;
                    }
                    Err(err) => self.status = format!("Could not add task: {}", err),
                }
            }
            InputAction::RenameTask { day_id, task_id } => {
                match self
                    .schedule
                    .update_task(&day_id, &task_id, |t| t.title = text.to_string())
                {
                    Ok(()) => self.persist(StoreKind::Schedule, format!("Renamed {}", task_id))?,
                    Err(err) => self.status = format!("Could not rename: {}", err),
                }
            }
            InputAction::NewSticky => {
                let id = self.board.add_task(text, &self.config.board);
                self.sticky_view.select_last(&self.board);
                self.persist(StoreKind::Board, format!("Added sticky {}", id))?;
            }
            InputAction::EditSticky { sticky_id } => {
                match self
                    .board
                    .update_task(&sticky_id, |t| t.title = text.to_string())
                {
                    Ok(()) => self.persist(StoreKind::Board, format!("Updated {}", sticky_id))?,
                    Err(err) => self.status = format!("Could not edit: {}", err),
                }
            }
            InputAction::NewHabit => {
                if text.is_empty() {
                    self.status = "Habit name required".into();
                    return Ok(false);
                }
                let id = self.habits.add_habit(text, None);
                self.habits_view.select_last(&self.habits);
                self.persist(StoreKind::Habits, format!("Added habit {}", id))?;
            }
        }
        Ok(true)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let target = match &self.mode {
            Mode::ConfirmDelete(target) => target.clone(),
            _ => return Ok(false),
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.mode = Mode::Normal;
                self.delete(target)?;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn delete(&mut self, target: DeleteTarget) -> Result<()> {
        let (result, store, label) = match &target {
            DeleteTarget::Task { day_id, task_id } => (
                self.schedule.delete_task(day_id, task_id),
                StoreKind::Schedule,
                task_id.clone(),
            ),
            DeleteTarget::Day { day_id } => (
                self.schedule.delete_day(day_id),
                StoreKind::Schedule,
                day_id.clone(),
            ),
            DeleteTarget::Sticky { sticky_id } => (
                self.board.delete_task(sticky_id),
                StoreKind::Board,
                sticky_id.clone(),
            ),
            DeleteTarget::Habit { habit_id } => (
                self.habits.delete_habit(habit_id),
                StoreKind::Habits,
                habit_id.clone(),
            ),
        };
        match result {
            Ok(()) => {
                self.clamp_selections();
                self.persist(store, format!("Deleted {}", label))
            }
            Err(err) => {
                self.status = format!("Delete failed: {}", err);
                Ok(())
            }
        }
    }

    fn prompt(&mut self, action: InputAction, initial: &str) {
        self.status = format!("{} (Enter save, Esc cancel)", action.prompt());
        self.mode = Mode::Input {
            action,
            field: FieldValue::new(initial),
        };
    }

    fn confirm_delete(&mut self, target: DeleteTarget) {
        self.status = "Delete? (y to confirm, n/Esc to cancel)".into();
        self.mode = Mode::ConfirmDelete(target);
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.schedule_view.cancel_drag();
            self.sticky_view.cancel_gesture();
            self.view = view;
            self.status = format!("Switched to {} view", view.label());
        }
    }

    fn clamp_selections(&mut self) {
        self.schedule_view.clamp(&self.schedule);
        self.sticky_view.clamp(&self.board);
        self.habits_view.clamp(&self.habits);
    }

    fn persist(&mut self, store: StoreKind, message: impl Into<String>) -> Result<()> {
        match store {
            StoreKind::Schedule => save_store(&self.workspace, &self.schedule)?,
            StoreKind::Board => save_store(&self.workspace, &self.board)?,
            StoreKind::Habits => save_store(&self.workspace, &self.habits)?,
        }
        self.last_save = Instant::now();
        self.status = message.into();
        tracing::info!(?store, status = %self.status, "persisted");
        Ok(())
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        match self.view {
            ViewMode::Schedule => self.draw_schedule(f, layout[1]),
            ViewMode::Sticky => self.draw_sticky(f, layout[1]),
            ViewMode::Habits => self.draw_habits(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Input { action, field } => self.draw_input(f, action.prompt(), field),
            Mode::ConfirmDelete(target) => self.draw_confirm(f, target),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "planboard ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                self.schedule.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(self.workspace.scope.label(), Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.workspace.dir.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.view.label().to_lowercase()),
                Style::default().fg(Color::Magenta),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let (detail_lines, title) = match self.view {
            ViewMode::Schedule => self.schedule_detail(),
            ViewMode::Sticky => self.sticky_detail(),
            ViewMode::Habits => self.habits_detail(),
        };
        let detail = Paragraph::new(detail_lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(title),
            );
        f.render_widget(detail, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("1", Style::default().fg(Color::LightCyan)),
            Span::raw(" schedule  "),
            Span::styled("2", Style::default().fg(Color::LightCyan)),
            Span::raw(" board  "),
            Span::styled("3", Style::default().fg(Color::LightCyan)),
            Span::raw(" habits  "),
        ];
        let keys: &[(&'static str, &'static str, Color)] = match self.view {
            ViewMode::Schedule => &[
                ("h j k l", "select", Color::LightCyan),
                ("m/b", "next/prev day", Color::LightGreen),
                ("J/K", "reorder", Color::LightGreen),
                ("n", "new", Color::LightMagenta),
                ("a", "add day", Color::LightMagenta),
                ("e", "rename", Color::LightYellow),
                ("x", "done", Color::LightYellow),
                ("p", "priority", Color::LightYellow),
                ("f", "filter", Color::LightYellow),
                ("d", "delete", Color::LightRed),
            ],
            ViewMode::Sticky => &[
                ("Tab", "select", Color::LightCyan),
                ("h j k l", "nudge", Color::LightGreen),
                ("n", "new", Color::LightMagenta),
                ("e", "edit", Color::LightYellow),
                ("x", "done", Color::LightYellow),
                ("c", "clear done", Color::LightRed),
                ("d", "delete", Color::LightRed),
            ],
            ViewMode::Habits => &[
                ("j/k", "habit", Color::LightCyan),
                ("h/l", "day", Color::LightCyan),
                ("space", "toggle", Color::LightYellow),
                ("n", "new", Color::LightMagenta),
                ("d", "delete", Color::LightRed),
            ],
        };
        for (key, label, color) in keys {
            spans.push(Span::styled(*key, Style::default().fg(*color)));
            spans.push(Span::raw(format!(" {}  ", label)));
        }
        spans.push(Span::styled("q", Style::default().fg(Color::LightRed)));
        spans.push(Span::raw(" quit"));
        Line::from(spans)
    }

    fn draw_input(&self, f: &mut ratatui::Frame<'_>, title: &str, field: &FieldValue) {
        let area = centered_rect(60, 20, f.size());
        let lines = vec![
            Line::from(Span::styled(field.with_caret(), Style::default().fg(Color::Cyan))),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to save • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let dialog = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(Span::styled(
                        title.to_string(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, target: &DeleteTarget) {
        let area = centered_rect(50, 30, f.size());
        let title = match target {
            DeleteTarget::Task { task_id, .. } => self
                .schedule
                .find_task(task_id)
                .map(|t| t.title.clone())
                .unwrap_or_else(|| task_id.clone()),
            DeleteTarget::Day { day_id } => self
                .schedule
                .day(day_id)
                .map(|d| format!("{} {}", d.title, d.display_date()))
                .unwrap_or_else(|| day_id.clone()),
            DeleteTarget::Sticky { sticky_id } => self
                .board
                .get(sticky_id)
                .map(|t| t.title.clone())
                .unwrap_or_else(|| sticky_id.clone()),
            DeleteTarget::Habit { habit_id } => self
                .habits
                .get(habit_id)
                .map(|h| h.name.clone())
                .unwrap_or_else(|| habit_id.clone()),
        };
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", title),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn color_for_index(idx: usize) -> Color {
    let palette = [
        Color::Cyan,
        Color::LightGreen,
        Color::LightMagenta,
        Color::LightBlue,
        Color::LightYellow,
        Color::LightRed,
    ];
    palette[idx % palette.len()]
}

/// `#rrggbb` to an RGB terminal color.
fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 {
        return Color::Gray;
    }
    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out.chars().take(max).collect()
}

fn prev_grapheme(cursor: usize, text: &str) -> usize {
    if cursor == 0 {
        return 0;
    }
    let mut prev = 0;
    for (idx, _) in text.char_indices() {
        if idx >= cursor {
            break;
        }
        prev = idx;
    }
    prev
}

fn next_grapheme(cursor: usize, text: &str) -> usize {
    for (idx, ch) in text.char_indices() {
        if idx > cursor {
            return idx;
        }
        if idx == cursor {
            return cursor + ch.len_utf8();
        }
    }
    text.len()
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}
