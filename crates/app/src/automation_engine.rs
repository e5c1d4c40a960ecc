//! Automation engine: screen checks, clicks and waits against one window.
//!
//! The engine is bound to a window title. The window handle is resolved on
//! first use and reused for the engine's lifetime. Every check captures a
//! fresh frame of the window's current bounds, converts it to grayscale and
//! scores templates against it with [`TemplateMatcher`].
//!
//! The retrying variants swallow [`NoMatch`](AutomationError::NoMatch) and
//! [`NotYetReady`](AutomationError::NotYetReady) up to
//! [`EngineConfig::retry_limit`] attempts, then fail with
//! [`CannotProceed`](AutomationError::CannotProceed). Every other error
//! propagates on the first attempt.

use std::future::Future;
use std::time::Duration;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tokio::time::Instant;

use framebot_domain::error::{AutomationError, FramebotError};
use framebot_domain::geometry::{Point, Rect, Size};
use framebot_domain::template::{MatchMode, ScreenProbe};

use crate::coordinates::CoordinateMapper;
use crate::matcher::TemplateMatcher;
use crate::ports::{InputController, ScreenSampler, TemplateSource, WindowHandle, WindowLocator};

/// Minimum scores for each kind of check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Whole-frame check ([`MatchMode::Is`]).
    pub screen: f64,
    /// Sub-region check ([`MatchMode::In`]).
    pub region: f64,
    /// Locating a click target.
    pub click: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            screen: 0.8,
            region: 0.9,
            click: 0.8,
        }
    }
}

impl Thresholds {
    #[must_use]
    pub const fn for_mode(&self, mode: MatchMode) -> f64 {
        match mode {
            MatchMode::Is => self.screen,
            MatchMode::In => self.region,
        }
    }
}

/// Engine tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Attempts made by the retrying variants, at least one.
    pub retry_limit: u32,
    /// Pause between retry attempts.
    pub retry_pause: Duration,
    /// Pause after each click of a multi-click.
    pub click_pause: Duration,
    /// Interval between checks of [`AutomationEngine::wait_until`].
    pub poll_interval: Duration,
    pub thresholds: Thresholds,
    /// Move the pointer for percentage clicks but never press.
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_limit: 5,
            retry_pause: Duration::from_secs(1),
            click_pause: Duration::from_millis(100),
            poll_interval: Duration::from_secs(5),
            thresholds: Thresholds::default(),
            dry_run: false,
        }
    }
}

/// The OS-facing ports the engine drives.
#[derive(Debug, Clone)]
pub struct Desktop<W, S, I, T> {
    pub windows: W,
    pub sampler: S,
    pub input: I,
    pub templates: T,
}

/// Captured frame size disagrees with the window bounds it was taken from.
#[derive(Debug, thiserror::Error)]
#[error("captured frame is {actual}, window is {expected}")]
pub struct FrameSizeMismatch {
    pub expected: String,
    pub actual: String,
}

/// Drives one target window.
pub struct AutomationEngine<W, S, I, T> {
    window_title: String,
    desktop: Desktop<W, S, I, T>,
    config: EngineConfig,
    handle: OnceCell<WindowHandle>,
}

impl<W, S, I, T> AutomationEngine<W, S, I, T>
where
    W: WindowLocator + Sync,
    S: ScreenSampler + Sync,
    I: InputController + Sync,
    T: TemplateSource + Sync,
{
    /// Create an engine for the window titled `window_title`.
    pub fn new(
        window_title: impl Into<String>,
        desktop: Desktop<W, S, I, T>,
        config: EngineConfig,
    ) -> Self {
        Self {
            window_title: window_title.into(),
            desktop,
            config,
            handle: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn window_title(&self) -> &str {
        &self.window_title
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── window ─────────────────────────────────────────────────

    /// Resolve (once) the handle of the target window.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::WindowNotFound`] when no window carries the
    /// title, or a platform error from the locator.
    pub async fn window(&self) -> Result<WindowHandle, FramebotError> {
        self.handle
            .get_or_try_init(|| async {
                let handle = self
                    .desktop
                    .windows
                    .find_by_title(&self.window_title)
                    .await?
                    .ok_or_else(|| AutomationError::WindowNotFound {
                        title: self.window_title.clone(),
                    })?;
                tracing::debug!(title = %self.window_title, %handle, "resolved target window");
                Ok::<_, FramebotError>(handle)
            })
            .await
            .copied()
    }

    /// Fail unless this process may deliver input to the target window.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::PermissionDenied`] when the window runs at a
    /// higher privilege level, or any error from [`Self::window`].
    pub async fn ensure_privileges(&self) -> Result<(), FramebotError> {
        let handle = self.window().await?;
        if self.desktop.windows.can_drive(handle).await? {
            Ok(())
        } else {
            Err(AutomationError::PermissionDenied {
                window: self.window_title.clone(),
            }
            .into())
        }
    }

    /// Raise the target window and give it focus.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::window`] or the locator.
    pub async fn bring_to_foreground(&self) -> Result<(), FramebotError> {
        let handle = self.window().await?;
        self.desktop.windows.bring_to_foreground(handle).await
    }

    /// Current bounds of the target window.
    ///
    /// # Errors
    ///
    /// Returns any error from [`Self::window`] or the locator.
    pub async fn window_bounds(&self) -> Result<Rect, FramebotError> {
        let handle = self.window().await?;
        self.desktop.windows.bounds(handle).await
    }

    /// Capture the window as a grayscale frame, with the bounds it covers.
    ///
    /// # Errors
    ///
    /// Returns a platform error when capture fails or the frame does not
    /// have the window's size.
    pub async fn capture(&self) -> Result<(Rect, GrayImage), FramebotError> {
        let bounds = self.window_bounds().await?;
        let frame = self.desktop.sampler.capture(bounds).await?;
        if (frame.width(), frame.height()) != (bounds.width, bounds.height) {
            return Err(FramebotError::Platform(Box::new(FrameSizeMismatch {
                expected: bounds.size().to_string(),
                actual: Size::new(frame.width(), frame.height()).to_string(),
            })));
        }
        Ok((bounds, frame.into_luma8()))
    }

    // ── checks ─────────────────────────────────────────────────

    /// Best correlation of `template` anywhere in a fresh frame, or `None`
    /// when the template does not fit inside the frame.
    ///
    /// # Errors
    ///
    /// Returns [`FramebotError::NotFound`] for an unknown template, or any
    /// capture error.
    pub async fn best_score(&self, template: &str) -> Result<Option<f64>, FramebotError> {
        let reference = self.desktop.templates.load(template).await?;
        let (_, frame) = self.capture().await?;
        let found = score_off_thread(move || TemplateMatcher::match_best(&frame, &reference)).await?;
        Ok(found.map(|m| m.score))
    }

    /// Whether the template's best score reaches the threshold for `mode`.
    ///
    /// # Errors
    ///
    /// See [`Self::best_score`].
    pub async fn check_screen(&self, template: &str, mode: MatchMode) -> Result<bool, FramebotError> {
        let threshold = self.config.thresholds.for_mode(mode);
        let score = self.best_score(template).await?;
        tracing::trace!(template, %mode, ?score, threshold, "screen check");
        Ok(score.is_some_and(|s| s >= threshold))
    }

    /// Whether the window is currently showing the `template` screen.
    ///
    /// # Errors
    ///
    /// See [`Self::best_score`].
    pub async fn is_screen(&self, template: &str) -> Result<bool, FramebotError> {
        self.check_screen(template, MatchMode::Is).await
    }

    /// Whether `template` appears as a sub-region of the current frame.
    ///
    /// # Errors
    ///
    /// See [`Self::best_score`].
    pub async fn is_image_in_screen(&self, template: &str) -> Result<bool, FramebotError> {
        self.check_screen(template, MatchMode::In).await
    }

    /// Name of the first probe whose template the window currently shows.
    ///
    /// # Errors
    ///
    /// See [`Self::best_score`].
    pub async fn identify_screen(
        &self,
        probes: &[ScreenProbe],
    ) -> Result<Option<String>, FramebotError> {
        for probe in probes {
            if self.check_screen(&probe.template, probe.mode).await? {
                tracing::debug!(screen = %probe.name, "identified screen");
                return Ok(Some(probe.name.clone()));
            }
        }
        Ok(None)
    }

    async fn gate(&self, template: &str, mode: MatchMode) -> Result<(), FramebotError> {
        if self.check_screen(template, mode).await? {
            Ok(())
        } else {
            Err(AutomationError::NotYetReady {
                template: template.to_string(),
            }
            .into())
        }
    }

    // ── actions ────────────────────────────────────────────────

    /// Click the first occurrence of `click_template` once the window shows
    /// `screen_template`.
    ///
    /// Returns the absolute point clicked.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::NotYetReady`] when the screen gate fails,
    /// [`AutomationError::NoMatch`] when the click target is absent, or any
    /// port error.
    pub async fn click_image(
        &self,
        click_template: &str,
        screen_template: &str,
        mode: MatchMode,
        click_count: u32,
    ) -> Result<Point, FramebotError> {
        self.gate(screen_template, mode).await?;

        let reference = self.desktop.templates.load(click_template).await?;
        let size = Size::new(reference.width(), reference.height());
        let (bounds, frame) = self.capture().await?;
        let threshold = self.config.thresholds.click;
        let found = score_off_thread(move || {
            TemplateMatcher::match_all(&frame, &reference, threshold)
                .into_iter()
                .next()
        })
        .await?
        .ok_or_else(|| AutomationError::NoMatch {
            template: click_template.to_string(),
        })?;

        let target = CoordinateMapper::new(bounds).match_center(found.location, size);
        tracing::debug!(template = click_template, score = found.score, %target, "clicking image");

        self.desktop.input.move_to(target).await?;
        self.press(click_count).await?;
        Ok(target)
    }

    /// Click at a fraction of the window size, optionally gated on
    /// `gate_template` being shown.
    ///
    /// Returns the absolute point targeted. With
    /// [`EngineConfig::dry_run`] the pointer moves but no click is sent.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::NotYetReady`] when the gate fails, or any
    /// port error.
    pub async fn click_percent(
        &self,
        x_fraction: f64,
        y_fraction: f64,
        gate_template: Option<&str>,
        mode: MatchMode,
        click_count: u32,
    ) -> Result<Point, FramebotError> {
        if let Some(template) = gate_template {
            self.gate(template, mode).await?;
        }

        let bounds = self.window_bounds().await?;
        let target = CoordinateMapper::new(bounds).fraction(x_fraction, y_fraction);
        self.desktop.input.move_to(target).await?;

        if self.config.dry_run {
            tracing::info!(%target, "dry run: skipping click");
            return Ok(target);
        }
        tracing::debug!(%target, x_fraction, y_fraction, "clicking at fraction");
        self.press(click_count).await?;
        Ok(target)
    }

    async fn press(&self, click_count: u32) -> Result<(), FramebotError> {
        for _ in 0..click_count {
            self.desktop.input.press_left().await?;
            self.desktop.input.release_left().await?;
            tokio::time::sleep(self.config.click_pause).await;
        }
        Ok(())
    }

    /// Poll until the window shows `template`, for at most
    /// `timeout_seconds`.
    ///
    /// The first check is immediate; later checks follow every
    /// [`EngineConfig::poll_interval`]. The wait fails once a failed check
    /// finds the elapsed time past the timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::Timeout`] when the screen never shows, or
    /// any error from [`Self::is_screen`].
    pub async fn wait_until(&self, template: &str, timeout_seconds: u64) -> Result<(), FramebotError> {
        let started = Instant::now();
        let timeout = Duration::from_secs(timeout_seconds);
        loop {
            if self.is_screen(template).await? {
                tracing::debug!(template, waited = ?started.elapsed(), "screen reached");
                return Ok(());
            }
            tokio::time::sleep(self.config.poll_interval).await;
            if started.elapsed() > timeout {
                return Err(AutomationError::Timeout {
                    template: template.to_string(),
                    seconds: timeout_seconds,
                }
                .into());
            }
        }
    }

    // ── retrying variants ──────────────────────────────────────

    /// [`Self::click_image`] with retries.
    ///
    /// # Errors
    ///
    /// Returns [`AutomationError::CannotProceed`] naming `operation` once
    /// every attempt failed with a retryable error; other errors propagate
    /// immediately.
    pub async fn click_image_with_retry(
        &self,
        operation: &str,
        click_template: &str,
        screen_template: &str,
        mode: MatchMode,
        click_count: u32,
    ) -> Result<Point, FramebotError> {
        self.retry(operation, || {
            self.click_image(click_template, screen_template, mode, click_count)
        })
        .await
    }

    /// [`Self::click_percent`] with retries.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::click_image_with_retry`].
    pub async fn click_percent_with_retry(
        &self,
        operation: &str,
        x_fraction: f64,
        y_fraction: f64,
        gate_template: Option<&str>,
        mode: MatchMode,
        click_count: u32,
    ) -> Result<Point, FramebotError> {
        self.retry(operation, || {
            self.click_percent(x_fraction, y_fraction, gate_template, mode, click_count)
        })
        .await
    }

    async fn retry<F, Fut>(&self, operation: &str, mut attempt: F) -> Result<Point, FramebotError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Point, FramebotError>>,
    {
        let limit = self.config.retry_limit.max(1);
        for n in 1..=limit {
            match attempt().await {
                Ok(point) => return Ok(point),
                Err(err) if err.is_retryable() => {
                    tracing::debug!(operation, attempt = n, limit, error = %err_chain(&err), "attempt failed");
                    if n < limit {
                        tokio::time::sleep(self.config.retry_pause).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
        tracing::warn!(operation, attempts = limit, "giving up");
        Err(AutomationError::CannotProceed {
            operation: operation.to_string(),
        }
        .into())
    }
}

/// Run a template scan on tokio's blocking pool.
async fn score_off_thread<R, F>(scan: F) -> Result<R, FramebotError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(scan)
        .await
        .map_err(|err| FramebotError::Platform(Box::new(err)))
}

/// `outer: inner: ...` rendering of an error and its sources.
#[must_use]
pub fn err_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

impl<W, S, I, T> std::fmt::Debug for AutomationEngine<W, S, I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationEngine")
            .field("window_title", &self.window_title)
            .field("config", &self.config)
            .field("handle", &self.handle.get())
            .finish_non_exhaustive()
    }
}
