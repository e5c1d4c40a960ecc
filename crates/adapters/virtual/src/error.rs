//! Virtual desktop errors.

use std::path::PathBuf;

use framebot_app::ports::WindowHandle;
use framebot_domain::error::FramebotError;
use framebot_domain::geometry::{Rect, Size};

/// Failures raised by the simulated window.
#[derive(Debug, thiserror::Error)]
pub enum VirtualDesktopError {
    #[error("no virtual window with handle {0}")]
    UnknownWindow(WindowHandle),

    #[error("screen `{name}` is {actual} but the window is {expected}")]
    ScreenSize {
        name: String,
        expected: Size,
        actual: Size,
    },

    #[error("no screen named `{0}`")]
    UnknownScreen(String),

    #[error("the virtual window has no screens")]
    NoScreens,

    #[error("capture region {region} is outside the window {window}")]
    RegionOutsideWindow { region: Rect, window: Rect },

    #[error("cannot read replay frames from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode replay frame {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl From<VirtualDesktopError> for FramebotError {
    fn from(err: VirtualDesktopError) -> Self {
        Self::Platform(Box::new(err))
    }
}
