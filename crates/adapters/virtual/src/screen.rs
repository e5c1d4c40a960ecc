//! Scripted screens and the hotspots that move between them.

use image::DynamicImage;

use framebot_domain::geometry::{Point, Rect, Size};

/// One full-window frame the virtual window can show.
#[derive(Debug, Clone)]
pub struct Screen {
    pub name: String,
    pub frame: DynamicImage,
    pub hotspots: Vec<Hotspot>,
}

impl Screen {
    pub fn new(name: impl Into<String>, frame: impl Into<DynamicImage>) -> Self {
        Self {
            name: name.into(),
            frame: frame.into(),
            hotspots: Vec::new(),
        }
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.frame.width(), self.frame.height())
    }

    /// First hotspot covering a window-relative point.
    #[must_use]
    pub fn hotspot_at(&self, point: Point) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.area.contains(point))
    }
}

/// A window-relative area that switches to another screen when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotspot {
    pub area: Rect,
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn should_pick_first_hotspot_when_areas_overlap() {
        let mut screen = Screen::new("lobby", GrayImage::new(10, 10));
        screen.hotspots.push(Hotspot {
            area: Rect::new(0, 0, 5, 5),
            target: "shop".to_string(),
        });
        screen.hotspots.push(Hotspot {
            area: Rect::new(2, 2, 5, 5),
            target: "mail".to_string(),
        });

        let hit = screen.hotspot_at(Point::new(3, 3)).unwrap();
        assert_eq!(hit.target, "shop");
        assert!(screen.hotspot_at(Point::new(9, 9)).is_none());
    }
}
