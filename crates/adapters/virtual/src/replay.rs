//! Build a virtual window from a directory of captured frames.

use std::path::{Path, PathBuf};

use framebot_domain::geometry::{Point, Rect};

use crate::error::VirtualDesktopError;
use crate::screen::Screen;
use crate::VirtualDesktop;

impl VirtualDesktop {
    /// Load every `*.png` in `dir`, sorted by file name, as consecutive
    /// screens of a window placed at `origin`.
    ///
    /// The window takes the size of the first frame and advances to the next
    /// frame on every click. Screens are named after the file stem.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualDesktopError::NoScreens`] for a directory without
    /// frames, and IO, decode or size errors for unreadable or mismatched
    /// frames.
    pub fn from_replay_dir(
        title: impl Into<String>,
        origin: Point,
        dir: &Path,
    ) -> Result<Self, VirtualDesktopError> {
        let frames = frame_paths(dir)?;
        let mut screens = Vec::with_capacity(frames.len());
        for path in frames {
            let frame = image::open(&path).map_err(|source| VirtualDesktopError::Decode {
                path: path.clone(),
                source,
            })?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            screens.push(Screen::new(name, frame));
        }

        let first = screens.first().ok_or(VirtualDesktopError::NoScreens)?;
        let size = first.size();
        let bounds = Rect::new(origin.x, origin.y, size.width, size.height);
        tracing::info!(
            dir = %dir.display(),
            frames = screens.len(),
            %bounds,
            "replay desktop loaded"
        );

        screens
            .into_iter()
            .try_fold(Self::new(title, bounds), Self::with_screen)
            .map(Self::advance_on_click)
    }
}

fn frame_paths(dir: &Path) -> Result<Vec<PathBuf>, VirtualDesktopError> {
    let io = |source| VirtualDesktopError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io)? {
        let path = entry.map_err(io)?.path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if path.is_file() && is_png {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
