//! Template port: load reference images by name.

use std::future::Future;
use std::sync::Arc;

use image::GrayImage;

use framebot_domain::error::FramebotError;

/// Resolves template names to grayscale reference images.
pub trait TemplateSource {
    /// Load the template called `name`.
    ///
    /// Implementations return [`FramebotError::NotFound`] when no template by
    /// that name exists.
    fn load(&self, name: &str) -> impl Future<Output = Result<Arc<GrayImage>, FramebotError>> + Send;
}
