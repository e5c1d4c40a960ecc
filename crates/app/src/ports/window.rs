//! Window port: find the target window and query its placement.

use std::fmt;
use std::future::Future;

use framebot_domain::error::FramebotError;
use framebot_domain::geometry::Rect;

/// Opaque handle to a top-level window, meaningful only to the adapter that
/// issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Locates windows by title and manipulates their z-order.
pub trait WindowLocator {
    /// Find a top-level window whose title matches `title` exactly.
    fn find_by_title(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<Option<WindowHandle>, FramebotError>> + Send;

    /// Raise the window above all others and give it input focus.
    fn bring_to_foreground(
        &self,
        handle: WindowHandle,
    ) -> impl Future<Output = Result<(), FramebotError>> + Send;

    /// Current outer bounds of the window in screen coordinates.
    fn bounds(&self, handle: WindowHandle)
    -> impl Future<Output = Result<Rect, FramebotError>> + Send;

    /// Whether this process may deliver input to the window.
    ///
    /// Returns `false` when the window runs at a higher privilege level than
    /// the automation process.
    fn can_drive(
        &self,
        handle: WindowHandle,
    ) -> impl Future<Output = Result<bool, FramebotError>> + Send;
}
