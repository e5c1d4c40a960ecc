//! Template loading errors.

use std::path::PathBuf;

use framebot_domain::error::FramebotError;

/// Errors raised while reading or decoding a template file.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The file exists but could not be read.
    #[error("cannot read template {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a decodable image.
    #[error("cannot decode template {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The name escapes the template directory.
    #[error("template name `{0}` must be a relative path inside the template directory")]
    InvalidName(String),
}

impl From<TemplateError> for FramebotError {
    fn from(err: TemplateError) -> Self {
        Self::Platform(Box::new(err))
    }
}
