use serde::{Deserialize, Serialize};

/// Window rectangle in screen points, top-left origin (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WindowBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Grow the rectangle by `amount` on each side.
    pub fn outset(&self, amount: f64) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + amount * 2.0,
            height: self.height + amount * 2.0,
        }
    }

    /// True when the two rectangles share a region of non-zero area.
    pub fn intersects(&self, other: &WindowBounds) -> bool {
        self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A screen position. Which origin it uses depends on the producer:
/// cursor locations from the platform are bottom-left, like [`SurfaceRect`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Surface frame in screen points, bottom-left origin anchored to the
/// primary display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    /// Half-open containment: the right and top edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Flip window bounds into surface coordinates.
pub fn to_surface_rect(bounds: WindowBounds, primary_display_height: f64) -> SurfaceRect {
    SurfaceRect {
        x: bounds.x,
        y: primary_display_height - bounds.y - bounds.height,
        width: bounds.width,
        height: bounds.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outset_grows_each_side() {
        let bounds = WindowBounds::new(0.0, 0.0, 100.0, 100.0).outset(20.0);
        assert_eq!(bounds, WindowBounds::new(-20.0, -20.0, 140.0, 140.0));
    }

    #[test]
    fn test_intersects_overlap_and_disjoint() {
        let a = WindowBounds::new(0.0, 0.0, 100.0, 100.0);
        assert!(a.intersects(&WindowBounds::new(50.0, 50.0, 150.0, 150.0)));
        assert!(!a.intersects(&WindowBounds::new(500.0, 500.0, 100.0, 100.0)));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = WindowBounds::new(0.0, 0.0, 100.0, 100.0);
        assert!(!a.intersects(&WindowBounds::new(100.0, 0.0, 50.0, 50.0)));
    }

    #[test]
    fn test_surface_rect_flips_y() {
        let rect = to_surface_rect(WindowBounds::new(10.0, 100.0, 300.0, 200.0), 1000.0);
        assert_eq!(
            rect,
            SurfaceRect {
                x: 10.0,
                y: 700.0,
                width: 300.0,
                height: 200.0
            }
        );
    }

    #[test]
    fn test_surface_rect_contains() {
        let rect = SurfaceRect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(rect.contains(Point::new(0.0, 0.0)));
        assert!(rect.contains(Point::new(9.9, 9.9)));
        assert!(!rect.contains(Point::new(10.0, 5.0)));
        assert!(!rect.contains(Point::new(-1.0, 5.0)));
    }
}
