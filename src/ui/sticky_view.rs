use super::{hex_color, truncate_text, App, DeleteTarget, InputAction, StoreKind};
use crate::config::BoardConfig;
use crate::drag::freeform::{
    clamp_position, FreeformDrag, GestureKind, GesturePreview, PointerTarget,
};
use crate::drag::{self, Point};
use crate::model::sticky::{StickyTask, TaskBoard};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Pixels per terminal cell.
const CELL_WIDTH_PX: i32 = 10;
const CELL_HEIGHT_PX: i32 = 20;

pub(super) struct StickyView {
    selected: usize,
    drag: FreeformDrag,
    preview: Option<GesturePreview>,
    limits: BoardConfig,
    canvas: Rect,
}

impl StickyView {
    pub(super) fn new(limits: BoardConfig) -> Self {
        StickyView {
            selected: 0,
            drag: FreeformDrag::new(limits),
            preview: None,
            limits,
            canvas: Rect::default(),
        }
    }

    pub(super) fn cancel_gesture(&mut self) {
        self.drag.cancel();
        self.preview = None;
    }

    pub(super) fn clamp(&mut self, board: &TaskBoard) {
        self.selected = self.selected.min(board.tasks.len().saturating_sub(1));
    }

    pub(super) fn select_last(&mut self, board: &TaskBoard) {
        self.selected = board.tasks.len().saturating_sub(1);
    }

    fn to_pixels(&self, column: u16, row: u16) -> Point {
        Point::new(
            (column as i32 - self.canvas.x as i32) * CELL_WIDTH_PX,
            (row as i32 - self.canvas.y as i32) * CELL_HEIGHT_PX,
        )
    }

    /// Cell rectangle of a pixel rectangle, clipped to the canvas.
    fn to_cells(&self, px: drag::Rect) -> Option<Rect> {
        let left = self.canvas.x as i32 + px.x.max(0) / CELL_WIDTH_PX;
        let top = self.canvas.y as i32 + px.y.max(0) / CELL_HEIGHT_PX;
        let right = left + (px.width / CELL_WIDTH_PX).max(4);
        let bottom = top + (px.height / CELL_HEIGHT_PX).max(3);
        let clip_right = (self.canvas.x + self.canvas.width) as i32;
        let clip_bottom = (self.canvas.y + self.canvas.height) as i32;
        let (right, bottom) = (right.min(clip_right), bottom.min(clip_bottom));
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(
            left as u16,
            top as u16,
            (right - left) as u16,
            (bottom - top) as u16,
        ))
    }

    fn geometry(&self, task: &StickyTask) -> drag::Rect {
        if let Some(preview) = self.preview.as_ref().filter(|p| p.item_id == task.id) {
            return preview.rect;
        }
        let (width, height) = task.effective_size(&self.limits);
        drag::Rect::new(task.x, task.y, width, height)
    }

    /// Draw order: the note under an active gesture goes last so it stays on top.
    fn draw_order<'a>(&self, board: &'a TaskBoard) -> Vec<(usize, &'a StickyTask)> {
        let active = self.drag.active_item();
        let mut order: Vec<_> = board
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| Some(t.id.as_str()) != active)
            .collect();
        order.extend(
            board
                .tasks
                .iter()
                .enumerate()
                .filter(|(_, t)| Some(t.id.as_str()) == active),
        );
        order
    }

    /// Topmost note under the pointer and which part of it was hit.
    fn hit(&self, board: &TaskBoard, column: u16, row: u16) -> Option<(usize, PointerTarget)> {
        self.draw_order(board).into_iter().rev().find_map(|(idx, task)| {
            let cells = self.to_cells(self.geometry(task))?;
            let inside = column >= cells.x
                && column < cells.x + cells.width
                && row >= cells.y
                && row < cells.y + cells.height;
            if !inside {
                return None;
            }
            let right = cells.x + cells.width - 1;
            let bottom = cells.y + cells.height - 1;
            let target = if column == right && row == bottom {
                PointerTarget::ResizeHandle
            } else if row == cells.y + 1 && column > cells.x && column <= cells.x + 3 {
                PointerTarget::Button
            } else {
                PointerTarget::Body
            };
            Some((idx, target))
        })
    }
}

impl App {
    pub(super) fn handle_sticky_key(&mut self, key: KeyEvent) -> Result<()> {
        let count = self.board.tasks.len();
        let current = self.board.tasks.get(self.sticky_view.selected).cloned();
        match key.code {
            KeyCode::Tab if count > 0 => {
                self.sticky_view.selected = (self.sticky_view.selected + 1) % count;
            }
            KeyCode::BackTab if count > 0 => {
                self.sticky_view.selected = (self.sticky_view.selected + count - 1) % count;
            }
            KeyCode::Char('n') => self.prompt(InputAction::NewSticky, ""),
            KeyCode::Char('e') => match current {
                Some(task) => self.prompt(
                    InputAction::EditSticky {
                        sticky_id: task.id.clone(),
                    },
                    &task.title,
                ),
                None => self.status = "No note selected".into(),
            },
            KeyCode::Char('x') => {
                if let Some(task) = current {
                    self.toggle_sticky(&task.id)?;
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = current {
                    self.confirm_delete(DeleteTarget::Sticky { sticky_id: task.id });
                }
            }
            KeyCode::Char('c') => {
                let removed = self.board.clear_completed();
                self.sticky_view.clamp(&self.board);
                self.persist(
                    StoreKind::Board,
                    format!("Cleared {} completed note(s)", removed),
                )?;
            }
            KeyCode::Left | KeyCode::Char('h') => self.nudge_sticky(current, -CELL_WIDTH_PX, 0)?,
            KeyCode::Right | KeyCode::Char('l') => self.nudge_sticky(current, CELL_WIDTH_PX, 0)?,
            KeyCode::Up | KeyCode::Char('k') => self.nudge_sticky(current, 0, -CELL_HEIGHT_PX)?,
            KeyCode::Down | KeyCode::Char('j') => self.nudge_sticky(current, 0, CELL_HEIGHT_PX)?,
            KeyCode::Esc => {
                self.sticky_view.cancel_gesture();
                self.status = "Gesture canceled".into();
            }
            _ => {}
        }
        Ok(())
    }

    pub(super) fn handle_sticky_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        let pointer = self.sticky_view.to_pixels(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some((idx, target)) = self.sticky_view.hit(&self.board, mouse.column, mouse.row)
                else {
                    return Ok(());
                };
                self.sticky_view.selected = idx;
                let Some(task) = self.board.tasks.get(idx).cloned() else {
                    return Ok(());
                };
                if target == PointerTarget::Button {
                    return self.toggle_sticky(&task.id);
                }
                if self.sticky_view.drag.on_pointer_down(&task, target, pointer) {
                    self.sticky_view.preview = self.sticky_view.drag.on_pointer_move(pointer);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.sticky_view.preview = self.sticky_view.drag.on_pointer_move(pointer);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let kind = self.sticky_view.preview.take().map(|p| p.kind);
                if self.sticky_view.drag.on_pointer_up(&mut self.board, pointer) {
                    let verb = match kind {
                        Some(GestureKind::Resize) => "Resized",
                        _ => "Moved",
                    };
                    self.persist(StoreKind::Board, format!("{} note", verb))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn toggle_sticky(&mut self, sticky_id: &str) -> Result<()> {
        match self.board.update_task(sticky_id, |t| t.completed = !t.completed) {
            Ok(()) => self.persist(StoreKind::Board, format!("Toggled {}", sticky_id)),
            Err(err) => {
                self.status = format!("Toggle failed: {}", err);
                Ok(())
            }
        }
    }

    fn nudge_sticky(&mut self, current: Option<StickyTask>, dx: i32, dy: i32) -> Result<()> {
        let Some(task) = current else {
            return Ok(());
        };
        let (x, y) = clamp_position((task.x, task.y), (dx, dy));
        if (x, y) == (task.x, task.y) {
            return Ok(());
        }
        self.board.move_task(&task.id, x, y)?;
        self.persist(StoreKind::Board, format!("Moved {} to ({}, {})", task.id, x, y))
    }

    pub(super) fn draw_sticky(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(Span::styled(
                format!(
                    "Sticky Board ({}/{} done)",
                    self.board.completed_count(),
                    self.board.tasks.len()
                ),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .style(Style::default().bg(Color::Rgb(16, 18, 24)));
        self.sticky_view.canvas = block.inner(area);
        f.render_widget(block, area);

        if self.board.tasks.is_empty() {
            let hint = Paragraph::new("Empty board (n adds a note)")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            f.render_widget(hint, self.sticky_view.canvas);
            return;
        }

        for (idx, task) in self.sticky_view.draw_order(&self.board) {
            let Some(cells) = self.sticky_view.to_cells(self.sticky_view.geometry(task)) else {
                continue;
            };
            let selected = idx == self.sticky_view.selected;
            let color = hex_color(&task.color);
            let mut title_style = Style::default().fg(Color::White);
            if task.completed {
                title_style = title_style
                    .fg(Color::Gray)
                    .add_modifier(Modifier::CROSSED_OUT);
            }
            let title = if task.title.trim().is_empty() {
                "New task".to_string()
            } else {
                task.title.clone()
            };
            let lines = vec![Line::from(vec![
                Span::styled(
                    if task.completed { "[x] " } else { "[ ] " },
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    truncate_text(&title, (cells.width as usize).saturating_sub(6)),
                    title_style,
                ),
            ])];
            let border = if selected {
                Style::default()
                    .fg(Color::Rgb(252, 214, 112))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let note = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(border)
                        .style(Style::default().bg(color)),
                );
            f.render_widget(Clear, cells);
            f.render_widget(note, cells);
        }
    }

    pub(super) fn sticky_detail(&self) -> (Vec<Line<'static>>, String) {
        match self.board.tasks.get(self.sticky_view.selected) {
            Some(task) => {
                let geometry = self.sticky_view.geometry(task);
                (
                    vec![
                        Line::from(Span::styled(
                            task.title.clone(),
                            Style::default()
                                .fg(Color::Yellow)
                                .add_modifier(Modifier::BOLD),
                        )),
                        Line::from(format!(
                            "({}, {}) {}x{} px",
                            geometry.x, geometry.y, geometry.width, geometry.height
                        )),
                    ],
                    "Selected".into(),
                )
            }
            None => (vec![Line::from("No note selected")], "Selected".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_with_canvas() -> StickyView {
        let mut view = StickyView::new(BoardConfig::default());
        view.canvas = Rect::new(1, 4, 100, 30);
        view
    }

    #[test]
    fn test_cell_pixel_conversion() {
        let view = view_with_canvas();
        assert_eq!(view.to_pixels(1, 4), Point::new(0, 0));
        assert_eq!(view.to_pixels(11, 6), Point::new(100, 40));
        let cells = view.to_cells(drag::Rect::new(100, 40, 170, 80)).unwrap();
        assert_eq!(cells, Rect::new(11, 6, 17, 4));
    }

    #[test]
    fn test_hit_regions() {
        let mut view = view_with_canvas();
        let mut board = TaskBoard::default();
        let limits = BoardConfig::default();
        let id = board.add_task("hit me", &limits);
        board.move_task(&id, 100, 40).unwrap();
        assert_eq!(view.hit(&board, 15, 8), Some((0, PointerTarget::Body)));
        assert_eq!(view.hit(&board, 27, 9), Some((0, PointerTarget::ResizeHandle)));
        assert_eq!(view.hit(&board, 13, 7), Some((0, PointerTarget::Button)));
        assert_eq!(view.hit(&board, 20, 7), Some((0, PointerTarget::Body)));
        assert_eq!(view.hit(&board, 11, 6), Some((0, PointerTarget::Body)));
        assert_eq!(view.hit(&board, 50, 20), None);

        view.canvas = Rect::new(1, 4, 5, 3);
        assert_eq!(view.hit(&board, 15, 8), None);
    }

    #[test]
    fn test_topmost_note_wins() {
        let view = view_with_canvas();
        let limits = BoardConfig::default();
        let mut board = TaskBoard::default();
        let a = board.add_task("a", &limits);
        let b = board.add_task("b", &limits);
        board.move_task(&a, 0, 0).unwrap();
        board.move_task(&b, 50, 20).unwrap();
        assert_eq!(view.hit(&board, 8, 6).map(|(idx, _)| idx), Some(1));
    }
}
