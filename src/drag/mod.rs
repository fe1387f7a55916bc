//! Pointer gesture engines for the two boards.
//!
//! Both engines keep their in-flight state locally and reach the stores only
//! through the stores' mutation methods.

pub mod columnar;
pub mod freeform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn delta_from(self, origin: Point) -> (i32, i32) {
        (self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Top-left, top-right, bottom-left, bottom-right.
    fn corners(&self) -> [(f64, f64); 4] {
        let (l, t) = (f64::from(self.x), f64::from(self.y));
        let (r, b) = (l + f64::from(self.width), t + f64::from(self.height));
        [(l, t), (r, t), (l, b), (r, b)]
    }
}

/// Mean distance between matching corners of two rectangles.
fn corner_distance(a: &Rect, b: &Rect) -> f64 {
    let total: f64 = a
        .corners()
        .iter()
        .zip(b.corners().iter())
        .map(|((ax, ay), (bx, by))| (ax - bx).hypot(ay - by))
        .sum();
    total / 4.0
}

/// Picks the candidate whose corners lie nearest the dragged rectangle's
/// corners. Equal distances resolve to the earlier candidate.
pub fn closest_corners<'a, T>(active: &Rect, candidates: &'a [(Rect, T)]) -> Option<&'a T> {
    let mut best: Option<(f64, &'a T)> = None;
    for (rect, target) in candidates {
        let distance = corner_distance(active, rect);
        match best {
            Some((d, _)) if d <= distance => {}
            _ => best = Some((distance, target)),
        }
    }
    best.map(|(_, target)| target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_corners_prefers_nearest() {
        let active = Rect::new(0, 10, 10, 1);
        let candidates = vec![
            (Rect::new(0, 0, 10, 1), "a"),
            (Rect::new(0, 9, 10, 1), "b"),
            (Rect::new(20, 10, 10, 1), "c"),
        ];
        assert_eq!(closest_corners(&active, &candidates), Some(&"b"));
    }

    #[test]
    fn test_closest_corners_tie_keeps_first() {
        let active = Rect::new(0, 5, 10, 1);
        let candidates = vec![(Rect::new(0, 4, 10, 1), 1), (Rect::new(0, 6, 10, 1), 2)];
        assert_eq!(closest_corners(&active, &candidates), Some(&1));
    }

    #[test]
    fn test_closest_corners_empty() {
        let candidates: Vec<(Rect, u8)> = Vec::new();
        assert_eq!(closest_corners(&Rect::default(), &candidates), None);
    }

    #[test]
    fn test_rect_contains_and_translate() {
        let r = Rect::new(2, 3, 4, 2).translate(1, -1);
        assert_eq!(r, Rect::new(3, 2, 4, 2));
        assert!(r.contains(Point::new(3, 2)));
        assert!(r.contains(Point::new(6, 3)));
        assert!(!r.contains(Point::new(7, 3)));
        assert_eq!(Point::new(5, 5).delta_from(Point::new(7, 1)), (-2, 4));
    }
}
