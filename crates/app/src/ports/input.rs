//! Input port: synthesize mouse input at absolute screen coordinates.

use std::future::Future;

use framebot_domain::error::FramebotError;
use framebot_domain::geometry::Point;

/// Drives the system pointer.
pub trait InputController {
    /// Move the pointer to an absolute screen position.
    fn move_to(&self, point: Point) -> impl Future<Output = Result<(), FramebotError>> + Send;

    /// Press the left button at the current pointer position.
    fn press_left(&self) -> impl Future<Output = Result<(), FramebotError>> + Send;

    /// Release the left button at the current pointer position.
    fn release_left(&self) -> impl Future<Output = Result<(), FramebotError>> + Send;
}
