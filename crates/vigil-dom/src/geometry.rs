//! Geometry
//!
//! DOMRect as reported to visibility and size watchers.

use serde::{Deserialize, Serialize};

/// DOMRect - rectangle geometry
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DOMRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DOMRect {
    /// Create with dimensions
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn top(&self) -> f64 { self.y }
    pub fn left(&self) -> f64 { self.x }
    pub fn right(&self) -> f64 { self.x + self.width }
    pub fn bottom(&self) -> f64 { self.y + self.height }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Get intersection rect, `None` when the rects only touch or are apart
    pub fn intersection(&self, other: &DOMRect) -> Option<DOMRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > x && bottom > y {
            Some(DOMRect::from_xywh(x, y, right - x, bottom - y))
        } else {
            None
        }
    }

    /// Grow (or shrink, with negative values) each edge independently
    pub fn expand(&self, top: f64, right: f64, bottom: f64, left: f64) -> DOMRect {
        DOMRect::from_xywh(
            self.x - left,
            self.y - top,
            (self.width + left + right).max(0.0),
            (self.height + top + bottom).max(0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        let a = DOMRect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let b = DOMRect::from_xywh(50.0, 50.0, 100.0, 100.0);

        let i = a.intersection(&b).unwrap();
        assert_eq!(i, DOMRect::from_xywh(50.0, 50.0, 50.0, 50.0));
        assert_eq!(i.area(), 2500.0);
    }

    #[test]
    fn test_touching_rects_do_not_intersect() {
        let a = DOMRect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let b = DOMRect::from_xywh(100.0, 0.0, 10.0, 10.0);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_expand() {
        let r = DOMRect::from_xywh(0.0, 0.0, 800.0, 600.0).expand(0.0, 0.0, -50.0, 0.0);
        assert_eq!(r.bottom(), 550.0);
        assert_eq!(r.width, 800.0);
    }
}
