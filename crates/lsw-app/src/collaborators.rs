//! Interfaces to the platform the overlay core runs against
//!
//! Everything the delegates need from the outside world goes through these
//! traits: widget hosting, window placement, power state, the removal
//! confirmation UI, unlocking and time. Implementations must not call back
//! into the event bus synchronously; anything they produce is delivered
//! through the owner loop.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use lsw_core::{Gravity, WidgetItem};
use serde::Serialize;

#[cfg(test)]
use mockall::automock;

/// Outcome of a widget-host call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostResult {
    Done,
    /// Host not connected yet; the call had no effect
    NotReady,
}

/// Outcome of a window add/update/remove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachResult {
    /// The window was added, updated or removed as asked
    Applied,
    /// Already in the requested state (added twice, removed while detached)
    Unchanged,
    /// Window manager not available
    NotReady,
}

/// Overlay windows managed by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Drawer,
    Handle,
    Frame,
}

/// Placement of an overlay window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowParams {
    /// Horizontal offset in px; negative slides the window off-screen
    pub x: i32,
    pub gravity: Gravity,
    pub width: u32,
}

#[cfg_attr(test, automock)]
pub trait WidgetHost {
    /// Release a widget id allocated by the host
    fn delete_widget_id(&self, id: i32);
    fn start_listening(&self) -> HostResult;
    fn stop_listening(&self) -> HostResult;
}

#[cfg_attr(test, automock)]
pub trait ShortcutIdManager {
    fn remove_shortcut_id(&self, id: i32);
}

#[cfg_attr(test, automock)]
pub trait OverlayWindow {
    fn add(&self, window: WindowKind, params: &WindowParams) -> AttachResult;
    fn update(&self, window: WindowKind, params: &WindowParams) -> AttachResult;
    fn remove(&self, window: WindowKind) -> AttachResult;
}

#[cfg_attr(test, automock)]
pub trait PowerState {
    fn is_interactive(&self) -> bool;
    fn is_keyguard_locked(&self) -> bool;
}

#[cfg_attr(test, automock)]
pub trait RemovalConfirmation {
    /// Ask the user whether `item` should be removed. The answer arrives
    /// later as `Event::RemoveWidgetConfirmed`.
    fn show(&self, item: &WidgetItem);
}

#[cfg_attr(test, automock)]
pub trait Unlocker {
    fn dismiss_or_unlock(&self);
}

pub trait Clock {
    fn now(&self) -> Instant;
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            now: Cell::new(Instant::now()),
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) -> Instant {
        let next = self.now.get() + by;
        self.now.set(next);
        next
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Screen geometry used for window placement and dp conversion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub density: f32,
    pub status_bar_height_px: u32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            width_px: 1080,
            density: 2.625,
            status_bar_height_px: 63,
        }
    }
}

impl DisplayMetrics {
    pub fn dp_to_px(&self, dp: f32) -> i32 {
        (dp * self.density).round() as i32
    }
}

/// Bundle of collaborator handles passed to every delegate
#[derive(Clone)]
pub struct Collaborators {
    pub widget_host: Rc<dyn WidgetHost>,
    pub shortcuts: Rc<dyn ShortcutIdManager>,
    pub window: Rc<dyn OverlayWindow>,
    pub power: Rc<dyn PowerState>,
    pub confirmation: Rc<dyn RemovalConfirmation>,
    pub unlocker: Rc<dyn Unlocker>,
    pub clock: Rc<dyn Clock>,
    pub display: DisplayMetrics,
}

impl Collaborators {
    /// Use one platform object for every role
    pub fn from_platform<P>(platform: Rc<P>, clock: Rc<dyn Clock>, display: DisplayMetrics) -> Self
    where
        P: WidgetHost
            + ShortcutIdManager
            + OverlayWindow
            + PowerState
            + RemovalConfirmation
            + Unlocker
            + 'static,
    {
        Self {
            widget_host: platform.clone(),
            shortcuts: platform.clone(),
            window: platform.clone(),
            power: platform.clone(),
            confirmation: platform.clone(),
            unlocker: platform,
            clock,
            display,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}
