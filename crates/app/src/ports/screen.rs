//! Screen port: capture pixels from a screen rectangle.

use std::future::Future;

use image::DynamicImage;

use framebot_domain::error::FramebotError;
use framebot_domain::geometry::Rect;

/// Captures the visible contents of a screen region.
pub trait ScreenSampler {
    /// Capture `region`, returning an image exactly `region.width` by
    /// `region.height` pixels in whatever pixel format the source produces.
    fn capture(&self, region: Rect)
    -> impl Future<Output = Result<DynamicImage, FramebotError>> + Send;
}
