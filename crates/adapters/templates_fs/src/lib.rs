//! # framebot-adapter-templates-fs
//!
//! Loads reference images from a directory on disk.
//!
//! Names are relative paths under the root directory. A name without an
//! extension gets the configured default one (`png`). Decoded templates are
//! converted to 8-bit grayscale and kept in memory for the lifetime of the
//! store, so each file is read at most once.
//!
//! ## Dependency rule
//!
//! Depends on `framebot-app` (port traits) and `framebot-domain` only.

mod error;

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use image::GrayImage;

use framebot_app::ports::TemplateSource;
use framebot_domain::error::{FramebotError, NotFoundError};
use framebot_domain::template::DEFAULT_EXTENSION;

pub use error::TemplateError;

type Cache = HashMap<String, Arc<GrayImage>>;

/// Template source backed by a directory of image files.
#[derive(Debug, Clone)]
pub struct FsTemplateStore {
    root: PathBuf,
    extension: String,
    cache: Arc<Mutex<Cache>>,
}

impl FsTemplateStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            cache: Arc::default(),
        }
    }

    /// Override the extension appended to names that have none.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of decoded templates currently held in memory.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.lock().len()
    }

    /// Drop every cached template so the next load re-reads the file.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Resolve a template name to a file path under the root.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidName`] for absolute paths and names
    /// containing `..`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, TemplateError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.trim().is_empty() || escapes {
            return Err(TemplateError::InvalidName(name.to_string()));
        }

        let mut path = self.root.join(relative);
        if path.extension().is_none() {
            path.set_extension(&self.extension);
        }
        Ok(path)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TemplateSource for FsTemplateStore {
    #[tracing::instrument(skip(self))]
    async fn load(&self, name: &str) -> Result<Arc<GrayImage>, FramebotError> {
        let cached = self.lock().get(name).cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }

        let path = self.resolve(name)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(NotFoundError {
                    entity: "Template",
                    id: name.to_string(),
                }
                .into());
            }
            Err(source) => return Err(TemplateError::Io { path, source }.into()),
        };

        let decoded = image::load_from_memory(&bytes)
            .map_err(|source| TemplateError::Decode {
                path: path.clone(),
                source,
            })?
            .into_luma8();
        tracing::debug!(
            path = %path.display(),
            width = decoded.width(),
            height = decoded.height(),
            "template loaded"
        );

        let template = Arc::new(decoded);
        self.lock().insert(name.to_string(), Arc::clone(&template));
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    fn write_gray(dir: &Path, file: &str, w: u32, h: u32) -> GrayImage {
        let img = GrayImage::from_fn(w, h, |x, y| {
            Luma([u8::try_from((x * 7 + y * 13) % 256).unwrap()])
        });
        img.save(dir.join(file)).unwrap();
        img
    }

    // ── loading ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_load_grayscale_png_when_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let expected = write_gray(dir.path(), "claim-click.png", 6, 4);
        let store = FsTemplateStore::new(dir.path());

        let loaded = store.load("claim-click.png").await.unwrap();

        assert_eq!(*loaded, expected);
    }

    #[tokio::test]
    async fn should_append_default_extension_when_name_has_none() {
        let dir = tempfile::tempdir().unwrap();
        write_gray(dir.path(), "lobby.png", 3, 3);
        let store = FsTemplateStore::new(dir.path());

        let loaded = store.load("lobby").await.unwrap();

        assert_eq!(loaded.dimensions(), (3, 3));
    }

    #[tokio::test]
    async fn should_convert_color_images_to_luma() {
        let dir = tempfile::tempdir().unwrap();
        let color = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        color.save(dir.path().join("white.png")).unwrap();
        let store = FsTemplateStore::new(dir.path());

        let loaded = store.load("white.png").await.unwrap();

        assert!(loaded.pixels().all(|p| p.0[0] == 255));
    }

    #[tokio::test]
    async fn should_load_from_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("outpost")).unwrap();
        write_gray(&dir.path().join("outpost"), "collect-screen.png", 2, 2);
        let store = FsTemplateStore::new(dir.path());

        assert!(store.load("outpost/collect-screen.png").await.is_ok());
    }

    // ── errors ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_return_not_found_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTemplateStore::new(dir.path());

        let result = store.load("nowhere.png").await;

        assert!(matches!(result, Err(FramebotError::NotFound(ref e)) if e.id == "nowhere.png"));
    }

    #[tokio::test]
    async fn should_reject_names_escaping_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsTemplateStore::new(dir.path().join("templates"));

        assert!(matches!(
            store.resolve("../secret.png"),
            Err(TemplateError::InvalidName(_))
        ));
        assert!(matches!(
            store.load("../secret.png").await,
            Err(FramebotError::Platform(_))
        ));
    }

    #[tokio::test]
    async fn should_report_platform_error_when_file_is_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();
        let store = FsTemplateStore::new(dir.path());

        assert!(matches!(
            store.load("broken.png").await,
            Err(FramebotError::Platform(_))
        ));
    }

    // ── caching ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn should_serve_cached_template_after_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        write_gray(dir.path(), "tab.png", 2, 2);
        let store = FsTemplateStore::new(dir.path());

        let first = store.load("tab.png").await.unwrap();
        std::fs::remove_file(dir.path().join("tab.png")).unwrap();
        let second = store.load("tab.png").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.cached(), 1);
    }

    #[tokio::test]
    async fn should_reload_after_clear() {
        let dir = tempfile::tempdir().unwrap();
        write_gray(dir.path(), "tab.png", 2, 2);
        let store = FsTemplateStore::new(dir.path());
        store.load("tab.png").await.unwrap();

        store.clear();
        std::fs::remove_file(dir.path().join("tab.png")).unwrap();

        assert_eq!(store.cached(), 0);
        assert!(matches!(
            store.load("tab.png").await,
            Err(FramebotError::NotFound(_))
        ));
    }

    #[test]
    fn should_use_custom_extension() {
        let store = FsTemplateStore::new("/t").with_extension("bmp");
        assert_eq!(store.resolve("x").unwrap(), PathBuf::from("/t/x.bmp"));
        assert_eq!(store.resolve("x.png").unwrap(), PathBuf::from("/t/x.png"));
    }
}
