//! # framebot-adapter-virtual
//!
//! A simulated target window that implements the desktop ports
//! ([`WindowLocator`], [`ScreenSampler`], [`InputController`]) in process.
//!
//! The window shows one [`Screen`] at a time. A click (press then release)
//! inside a [`Hotspot`] switches to the hotspot's target screen; otherwise,
//! with advance-on-click enabled, it moves to the next screen in the list.
//! Every pointer action is recorded in an input log.
//!
//! ## Dependency rule
//!
//! Depends on `framebot-app` (port traits) and `framebot-domain` only.

mod error;
mod replay;
mod screen;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::DynamicImage;

use framebot_app::ports::{InputController, ScreenSampler, WindowHandle, WindowLocator};
use framebot_domain::error::FramebotError;
use framebot_domain::geometry::{Point, Rect};

pub use error::VirtualDesktopError;
pub use screen::{Hotspot, Screen};

const HANDLE: WindowHandle = WindowHandle(0x1);

/// A pointer action received by the virtual window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Move(Point),
    Press,
    Release,
}

#[derive(Debug)]
struct State {
    title: String,
    bounds: Rect,
    elevated: bool,
    screens: Vec<Screen>,
    current: usize,
    advance_on_click: bool,
    pointer: Point,
    pressed: bool,
    foreground: bool,
    log: Vec<InputEvent>,
    captures: usize,
}

impl State {
    fn check(&self, handle: WindowHandle) -> Result<(), VirtualDesktopError> {
        if handle == HANDLE {
            Ok(())
        } else {
            Err(VirtualDesktopError::UnknownWindow(handle))
        }
    }

    fn index_of(&self, name: &str) -> Result<usize, VirtualDesktopError> {
        self.screens
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| VirtualDesktopError::UnknownScreen(name.to_string()))
    }

    fn click(&mut self) {
        let Some(screen) = self.screens.get(self.current) else {
            return;
        };
        let relative = Point::new(
            self.pointer.x - self.bounds.left,
            self.pointer.y - self.bounds.top,
        );

        let next = match screen.hotspot_at(relative) {
            Some(hotspot) => self.screens.iter().position(|s| s.name == hotspot.target),
            None if self.advance_on_click && self.current + 1 < self.screens.len() => {
                Some(self.current + 1)
            }
            None => None,
        };
        if let Some(next) = next {
            tracing::debug!(
                from = %screen.name,
                to = %self.screens[next].name,
                x = relative.x,
                y = relative.y,
                "virtual screen changed"
            );
            self.current = next;
        }
    }
}

/// In-process stand-in for a real game window.
///
/// Clones share state, so a test can keep one clone for inspection while the
/// engine drives another.
#[derive(Debug, Clone)]
pub struct VirtualDesktop {
    state: Arc<Mutex<State>>,
}

impl VirtualDesktop {
    /// A window titled `title` at `bounds`, with no screens yet.
    pub fn new(title: impl Into<String>, bounds: Rect) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                title: title.into(),
                bounds,
                elevated: false,
                screens: Vec::new(),
                current: 0,
                advance_on_click: false,
                pointer: Point::new(0, 0),
                pressed: false,
                foreground: false,
                log: Vec::new(),
                captures: 0,
            })),
        }
    }

    /// Append a screen. The first screen added is shown initially.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualDesktopError::ScreenSize`] when the frame is not
    /// exactly the window size.
    pub fn with_screen(self, screen: Screen) -> Result<Self, VirtualDesktopError> {
        {
            let mut state = self.lock();
            let expected = state.bounds.size();
            let actual = screen.size();
            if actual != expected {
                return Err(VirtualDesktopError::ScreenSize {
                    name: screen.name,
                    expected,
                    actual,
                });
            }
            state.screens.push(screen);
        }
        Ok(self)
    }

    /// Make clicks inside `area` of screen `from` switch to screen `to`.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualDesktopError::UnknownScreen`] if either screen is
    /// missing.
    pub fn with_hotspot(self, from: &str, area: Rect, to: &str) -> Result<Self, VirtualDesktopError> {
        {
            let mut state = self.lock();
            state.index_of(to)?;
            let index = state.index_of(from)?;
            state.screens[index].hotspots.push(Hotspot {
                area,
                target: to.to_string(),
            });
        }
        Ok(self)
    }

    /// Move to the next screen on any click that misses every hotspot.
    #[must_use]
    pub fn advance_on_click(self) -> Self {
        self.lock().advance_on_click = true;
        self
    }

    /// Run the window at a higher privilege level than the caller.
    #[must_use]
    pub fn elevated(self) -> Self {
        self.lock().elevated = true;
        self
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    #[must_use]
    pub fn window_bounds(&self) -> Rect {
        self.lock().bounds
    }

    /// Name of the screen currently shown.
    #[must_use]
    pub fn current_screen(&self) -> Option<String> {
        let state = self.lock();
        state.screens.get(state.current).map(|s| s.name.clone())
    }

    /// Jump directly to a named screen.
    ///
    /// # Errors
    ///
    /// Returns [`VirtualDesktopError::UnknownScreen`] when no screen has that
    /// name.
    pub fn show(&self, name: &str) -> Result<(), VirtualDesktopError> {
        let mut state = self.lock();
        state.current = state.index_of(name)?;
        Ok(())
    }

    #[must_use]
    pub fn input_log(&self) -> Vec<InputEvent> {
        self.lock().log.clone()
    }

    /// Pointer positions at which a full click (press then release) landed.
    #[must_use]
    pub fn clicks(&self) -> Vec<Point> {
        let state = self.lock();
        let mut pointer = Point::new(0, 0);
        let mut clicks = Vec::new();
        for event in &state.log {
            match event {
                InputEvent::Move(p) => pointer = *p,
                InputEvent::Release => clicks.push(pointer),
                InputEvent::Press => {}
            }
        }
        clicks
    }

    #[must_use]
    pub fn captures(&self) -> usize {
        self.lock().captures
    }

    #[must_use]
    pub fn is_foreground(&self) -> bool {
        self.lock().foreground
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WindowLocator for VirtualDesktop {
    async fn find_by_title(&self, title: &str) -> Result<Option<WindowHandle>, FramebotError> {
        Ok((self.lock().title == title).then_some(HANDLE))
    }

    async fn bring_to_foreground(&self, handle: WindowHandle) -> Result<(), FramebotError> {
        let mut state = self.lock();
        state.check(handle)?;
        state.foreground = true;
        Ok(())
    }

    async fn bounds(&self, handle: WindowHandle) -> Result<Rect, FramebotError> {
        let state = self.lock();
        state.check(handle)?;
        Ok(state.bounds)
    }

    async fn can_drive(&self, handle: WindowHandle) -> Result<bool, FramebotError> {
        let state = self.lock();
        state.check(handle)?;
        Ok(!state.elevated)
    }
}

impl ScreenSampler for VirtualDesktop {
    async fn capture(&self, region: Rect) -> Result<DynamicImage, FramebotError> {
        let mut state = self.lock();
        let window = state.bounds;
        let inside = region.left >= window.left
            && region.top >= window.top
            && region.right() <= window.right()
            && region.bottom() <= window.bottom();
        if !inside {
            return Err(VirtualDesktopError::RegionOutsideWindow { region, window }.into());
        }

        let screen = state
            .screens
            .get(state.current)
            .ok_or(VirtualDesktopError::NoScreens)?;
        let x = region.left.abs_diff(window.left);
        let y = region.top.abs_diff(window.top);
        let frame = screen.frame.crop_imm(x, y, region.width, region.height);

        state.captures += 1;
        Ok(frame)
    }
}

impl InputController for VirtualDesktop {
    async fn move_to(&self, point: Point) -> Result<(), FramebotError> {
        let mut state = self.lock();
        state.pointer = point;
        state.log.push(InputEvent::Move(point));
        Ok(())
    }

    async fn press_left(&self) -> Result<(), FramebotError> {
        let mut state = self.lock();
        state.pressed = true;
        state.log.push(InputEvent::Press);
        Ok(())
    }

    async fn release_left(&self) -> Result<(), FramebotError> {
        let mut state = self.lock();
        state.log.push(InputEvent::Release);
        if std::mem::take(&mut state.pressed) {
            state.click();
        }
        Ok(())
    }
}
