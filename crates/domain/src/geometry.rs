//! Screen-space geometry: points, sizes and rectangles.
//!
//! All coordinates are in pixels. Screen coordinates may be negative on
//! multi-monitor layouts, sizes may not.

use serde::{Deserialize, Serialize};

/// A pixel position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Shift this point by `origin`, turning a window-relative position into
    /// an absolute one.
    #[must_use]
    pub const fn offset_by(self, origin: Point) -> Self {
        Self {
            x: self.x + origin.x,
            y: self.y + origin.y,
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a rectangle from exclusive corner coordinates, as reported by
    /// most windowing APIs. Inverted corners collapse to an empty rectangle.
    #[must_use]
    pub fn from_corners(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        let width = u32::try_from(right - left).unwrap_or(0);
        let height = u32::try_from(bottom - top).unwrap_or(0);
        Self::new(left, top, width, height)
    }

    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn right(&self) -> i32 {
        self.left.saturating_add_unsigned(self.width)
    }

    #[must_use]
    pub fn bottom(&self) -> i32 {
        self.top.saturating_add_unsigned(self.height)
    }

    /// Whether `point` lies inside (right and bottom edges excluded).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right() && point.y >= self.top && point.y < self.bottom()
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}@({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}
