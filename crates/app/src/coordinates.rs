//! Window-relative to absolute screen coordinate conversion.

use framebot_domain::geometry::{Point, Rect, Size};

/// Maps positions inside a captured window frame to screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateMapper {
    window: Rect,
}

impl CoordinateMapper {
    #[must_use]
    pub const fn new(window: Rect) -> Self {
        Self { window }
    }

    /// Screen position of the centre of a template matched at `location`
    /// (top-left, frame-relative).
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn match_center(&self, location: Point, template: Size) -> Point {
        let center = Point::new(
            location.x + (template.width / 2) as i32,
            location.y + (template.height / 2) as i32,
        );
        center.offset_by(self.window.origin())
    }

    /// Screen position at a fraction of the window's width and height.
    ///
    /// The result is truncated toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn fraction(&self, x_fraction: f64, y_fraction: f64) -> Point {
        let x = f64::from(self.window.left) + f64::from(self.window.width) * x_fraction;
        let y = f64::from(self.window.top) + f64::from(self.window.height) * y_fraction;
        Point::new(x as i32, y as i32)
    }
}
