use crate::config::BoardConfig;
use crate::drag::{Point, Rect};
use crate::model::sticky::{StickyTask, TaskBoard};

/// Part of a note the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Body,
    ResizeHandle,
    Input,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Gesture {
    item_id: String,
    kind: GestureKind,
    origin: Point,
    start: Rect,
}

/// Where the note would land if the pointer were released now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GesturePreview {
    pub item_id: String,
    pub kind: GestureKind,
    pub rect: Rect,
}

/// Tracks one move or resize gesture on the sticky board. Nothing reaches
/// the store until the pointer is released.
#[derive(Debug, Default)]
pub struct FreeformDrag {
    gesture: Option<Gesture>,
    limits: BoardConfig,
}

pub fn clamp_position(start: (i32, i32), delta: (i32, i32)) -> (i32, i32) {
    ((start.0 + delta.0).max(0), (start.1 + delta.1).max(0))
}

pub fn clamp_size(start: (i32, i32), delta: (i32, i32), limits: &BoardConfig) -> (i32, i32) {
    (
        (start.0 + delta.0).max(limits.min_width),
        (start.1 + delta.1).max(limits.min_height),
    )
}

impl FreeformDrag {
    pub fn new(limits: BoardConfig) -> Self {
        FreeformDrag {
            gesture: None,
            limits,
        }
    }

    pub fn active_item(&self) -> Option<&str> {
        self.gesture.as_ref().map(|g| g.item_id.as_str())
    }

    /// Starts a gesture unless the press landed on an inner control or
    /// another gesture is still running. Returns whether one started.
    pub fn on_pointer_down(&mut self, item: &StickyTask, target: PointerTarget, pointer: Point) -> bool {
        if self.gesture.is_some() {
            return false;
        }
        let kind = match target {
            PointerTarget::Input | PointerTarget::Button => return false,
            PointerTarget::Body => GestureKind::Move,
            PointerTarget::ResizeHandle => GestureKind::Resize,
        };
        let (width, height) = item.effective_size(&self.limits);
        self.gesture = Some(Gesture {
            item_id: item.id.clone(),
            kind,
            origin: pointer,
            start: Rect::new(item.x, item.y, width, height),
        });
        true
    }

    /// Visual-only update while the pointer moves.
    pub fn on_pointer_move(&self, pointer: Point) -> Option<GesturePreview> {
        let gesture = self.gesture.as_ref()?;
        Some(GesturePreview {
            item_id: gesture.item_id.clone(),
            kind: gesture.kind,
            rect: self.project(gesture, pointer),
        })
    }

    /// Commits the gesture with one store call and forgets it. A release that
    /// leaves the geometry unchanged commits nothing.
    pub fn on_pointer_up(&mut self, board: &mut TaskBoard, pointer: Point) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        let rect = self.project(&gesture, pointer);
        if rect == gesture.start {
            return false;
        }
        let result = match gesture.kind {
            GestureKind::Move => board.move_task(&gesture.item_id, rect.x, rect.y),
            GestureKind::Resize => board.resize_task(&gesture.item_id, rect.width, rect.height),
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "gesture commit ignored");
                false
            }
        }
    }

    /// Drops the gesture in flight; nothing is committed.
    pub fn cancel(&mut self) {
        self.gesture = None;
    }

    fn project(&self, gesture: &Gesture, pointer: Point) -> Rect {
        let delta = pointer.delta_from(gesture.origin);
        let start = gesture.start;
        match gesture.kind {
            GestureKind::Move => {
                let (x, y) = clamp_position((start.x, start.y), delta);
                Rect { x, y, ..start }
            }
            GestureKind::Resize => {
                let (width, height) = clamp_size((start.width, start.height), delta, &self.limits);
                Rect { width, height, ..start }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn board_with_one() -> (TaskBoard, String) {
        let mut board = TaskBoard::default();
        let id = board.add_task("drag me", &BoardConfig::default());
        board.move_task(&id, 100, 50).unwrap();
        (board, id)
    }

    #[test]
    fn test_move_commits_on_release_only() {
        let (mut board, id) = board_with_one();
        let mut drag = FreeformDrag::new(BoardConfig::default());
        let item = board.get(&id).cloned().unwrap();

        assert!(drag.on_pointer_down(&item, PointerTarget::Body, Point::new(110, 60)));
        let preview = drag.on_pointer_move(Point::new(140, 20)).unwrap();
        assert_eq!((preview.rect.x, preview.rect.y), (130, 10));
        assert_eq!(board.get(&id).map(|t| (t.x, t.y)), Some((100, 50)));

        assert!(drag.on_pointer_up(&mut board, Point::new(150, 90)));
        assert_eq!(board.get(&id).map(|t| (t.x, t.y)), Some((140, 80)));
        assert!(drag.active_item().is_none());
    }

    #[test]
    fn test_click_without_motion_commits_nothing() {
        let (mut board, id) = board_with_one();
        let mut drag = FreeformDrag::new(BoardConfig::default());
        let item = board.get(&id).cloned().unwrap();
        let before = board.clone();

        assert!(drag.on_pointer_down(&item, PointerTarget::Body, Point::new(110, 60)));
        assert!(!drag.on_pointer_up(&mut board, Point::new(110, 60)));
        assert!(drag.on_pointer_down(&item, PointerTarget::ResizeHandle, Point::new(270, 130)));
        assert!(!drag.on_pointer_up(&mut board, Point::new(270, 130)));

        assert_eq!(board, before);
        assert!(drag.active_item().is_none());
    }

    #[test]
    fn test_move_clamps_at_origin() {
        let (mut board, id) = board_with_one();
        let mut drag = FreeformDrag::new(BoardConfig::default());
        let item = board.get(&id).cloned().unwrap();
        drag.on_pointer_down(&item, PointerTarget::Body, Point::new(0, 0));
        drag.on_pointer_up(&mut board, Point::new(-500, -20));
        assert_eq!(board.get(&id).map(|t| (t.x, t.y)), Some((0, 30)));
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let (mut board, id) = board_with_one();
        let limits = BoardConfig::default();
        let mut drag = FreeformDrag::new(limits);
        let item = board.get(&id).cloned().unwrap();
        assert!(drag.on_pointer_down(&item, PointerTarget::ResizeHandle, Point::new(0, 0)));
        let preview = drag.on_pointer_move(Point::new(30, 10)).unwrap();
        assert_eq!(preview.kind, GestureKind::Resize);
        assert_eq!((preview.rect.width, preview.rect.height), (200, 90));

        drag.on_pointer_up(&mut board, Point::new(-1000, -1000));
        let t = board.get(&id).unwrap();
        assert_eq!((t.width, t.height), (limits.min_width, limits.min_height));
        assert_eq!((t.x, t.y), (100, 50));
    }

    #[test]
    fn test_inner_controls_do_not_start_gesture() {
        let (mut board, id) = board_with_one();
        let mut drag = FreeformDrag::new(BoardConfig::default());
        let item = board.get(&id).cloned().unwrap();
        assert!(!drag.on_pointer_down(&item, PointerTarget::Button, Point::new(0, 0)));
        assert!(!drag.on_pointer_down(&item, PointerTarget::Input, Point::new(0, 0)));
        assert!(drag.on_pointer_move(Point::new(50, 50)).is_none());
        assert!(!drag.on_pointer_up(&mut board, Point::new(50, 50)));
        assert_eq!(board.get(&id).map(|t| (t.x, t.y)), Some((100, 50)));
    }

    #[test]
    fn test_resize_excludes_concurrent_move() {
        let (mut board, id) = board_with_one();
        let mut drag = FreeformDrag::new(BoardConfig::default());
        let item = board.get(&id).cloned().unwrap();
        assert!(drag.on_pointer_down(&item, PointerTarget::ResizeHandle, Point::new(0, 0)));
        assert!(!drag.on_pointer_down(&item, PointerTarget::Body, Point::new(0, 0)));
        drag.on_pointer_up(&mut board, Point::new(20, 20));
        let t = board.get(&id).unwrap();
        assert_eq!((t.x, t.y, t.width, t.height), (100, 50, 190, 100));
    }

    #[test]
    fn test_zero_size_item_resizes_from_default() {
        let (mut board, id) = board_with_one();
        board.resize_task(&id, 0, 0).unwrap();
        let mut drag = FreeformDrag::new(BoardConfig::default());
        let item = board.get(&id).cloned().unwrap();
        drag.on_pointer_down(&item, PointerTarget::ResizeHandle, Point::new(0, 0));
        drag.on_pointer_up(&mut board, Point::new(10, 0));
        assert_eq!(board.get(&id).map(|t| (t.width, t.height)), Some((180, 80)));
    }

    #[test]
    fn test_deleted_item_commit_is_ignored() {
        let (mut board, id) = board_with_one();
        let mut drag = FreeformDrag::new(BoardConfig::default());
        let item = board.get(&id).cloned().unwrap();
        drag.on_pointer_down(&item, PointerTarget::Body, Point::new(0, 0));
        board.delete_task(&id).unwrap();
        assert!(!drag.on_pointer_up(&mut board, Point::new(5, 5)));
        assert!(drag.active_item().is_none());
    }

    proptest! {
        #[test]
        fn prop_clamps_hold(x in 0i32..2000, y in 0i32..2000, w in 0i32..600, h in 0i32..600,
                            dx in -5000i32..5000, dy in -5000i32..5000) {
            let limits = BoardConfig::default();
            let (nx, ny) = clamp_position((x, y), (dx, dy));
            prop_assert!(nx >= 0 && ny >= 0);
            let (nw, nh) = clamp_size((w, h), (dx, dy), &limits);
            prop_assert!(nw >= limits.min_width && nh >= limits.min_height);
        }
    }
}
