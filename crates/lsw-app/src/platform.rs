//! In-process stand-in for the platform services
//!
//! Records every call and keeps just enough state (attached windows, power
//! state, pending confirmation) for the overlay logic to behave as it would
//! on a device. Used by the headless runner and by tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use lsw_core::WidgetItem;
use serde::Serialize;
use tracing::trace;

use crate::collaborators::{
    AttachResult, HostResult, OverlayWindow, PowerState, RemovalConfirmation, ShortcutIdManager,
    Unlocker, WidgetHost, WindowKind, WindowParams,
};

/// One recorded platform call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum PlatformCall {
    DeleteWidgetId { id: i32 },
    RemoveShortcutId { id: i32 },
    StartListening,
    StopListening,
    AddWindow { window: WindowKind, x: i32 },
    UpdateWindow { window: WindowKind, x: i32 },
    RemoveWindow { window: WindowKind },
    ShowConfirmation { id: i32 },
    Unlock,
}

#[derive(Debug)]
pub struct SimulatedPlatform {
    interactive: Cell<bool>,
    keyguard_locked: Cell<bool>,
    window_manager_ready: Cell<bool>,
    host_ready: Cell<bool>,
    listening: Cell<bool>,
    windows: RefCell<HashSet<WindowKind>>,
    pending_confirmation: RefCell<Option<WidgetItem>>,
    calls: RefCell<Vec<PlatformCall>>,
}

impl Default for SimulatedPlatform {
    fn default() -> Self {
        Self {
            interactive: Cell::new(true),
            keyguard_locked: Cell::new(true),
            window_manager_ready: Cell::new(true),
            host_ready: Cell::new(true),
            listening: Cell::new(false),
            windows: RefCell::new(HashSet::new()),
            pending_confirmation: RefCell::new(None),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl SimulatedPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_interactive(&self, interactive: bool) {
        self.interactive.set(interactive);
    }

    pub fn set_keyguard_locked(&self, locked: bool) {
        self.keyguard_locked.set(locked);
    }

    pub fn set_window_manager_ready(&self, ready: bool) {
        self.window_manager_ready.set(ready);
    }

    pub fn set_host_ready(&self, ready: bool) {
        self.host_ready.set(ready);
    }

    pub fn is_attached(&self, window: WindowKind) -> bool {
        self.windows.borrow().contains(&window)
    }

    pub fn is_listening(&self) -> bool {
        self.listening.get()
    }

    /// Item awaiting a yes/no answer, if any. Taking it clears it.
    pub fn take_pending_confirmation(&self) -> Option<WidgetItem> {
        self.pending_confirmation.borrow_mut().take()
    }

    pub fn pending_confirmation(&self) -> Option<WidgetItem> {
        self.pending_confirmation.borrow().clone()
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.borrow().clone()
    }

    /// Drain the call log
    pub fn take_calls(&self) -> Vec<PlatformCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    fn record(&self, call: PlatformCall) {
        trace!("Platform call: {:?}", call);
        self.calls.borrow_mut().push(call);
    }
}

impl WidgetHost for SimulatedPlatform {
    fn delete_widget_id(&self, id: i32) {
        self.record(PlatformCall::DeleteWidgetId { id });
    }

    fn start_listening(&self) -> HostResult {
        if !self.host_ready.get() {
            return HostResult::NotReady;
        }
        self.listening.set(true);
        self.record(PlatformCall::StartListening);
        HostResult::Done
    }

    fn stop_listening(&self) -> HostResult {
        if !self.host_ready.get() {
            return HostResult::NotReady;
        }
        self.listening.set(false);
        self.record(PlatformCall::StopListening);
        HostResult::Done
    }
}

impl ShortcutIdManager for SimulatedPlatform {
    fn remove_shortcut_id(&self, id: i32) {
        self.record(PlatformCall::RemoveShortcutId { id });
    }
}

impl OverlayWindow for SimulatedPlatform {
    fn add(&self, window: WindowKind, params: &WindowParams) -> AttachResult {
        if !self.window_manager_ready.get() {
            return AttachResult::NotReady;
        }
        if !self.windows.borrow_mut().insert(window) {
            return AttachResult::Unchanged;
        }
        self.record(PlatformCall::AddWindow {
            window,
            x: params.x,
        });
        AttachResult::Applied
    }

    fn update(&self, window: WindowKind, params: &WindowParams) -> AttachResult {
        if !self.window_manager_ready.get() {
            return AttachResult::NotReady;
        }
        if !self.is_attached(window) {
            return AttachResult::Unchanged;
        }
        self.record(PlatformCall::UpdateWindow {
            window,
            x: params.x,
        });
        AttachResult::Applied
    }

    fn remove(&self, window: WindowKind) -> AttachResult {
        if !self.window_manager_ready.get() {
            return AttachResult::NotReady;
        }
        if !self.windows.borrow_mut().remove(&window) {
            return AttachResult::Unchanged;
        }
        self.record(PlatformCall::RemoveWindow { window });
        AttachResult::Applied
    }
}

impl PowerState for SimulatedPlatform {
    fn is_interactive(&self) -> bool {
        self.interactive.get()
    }

    fn is_keyguard_locked(&self) -> bool {
        self.keyguard_locked.get()
    }
}

impl RemovalConfirmation for SimulatedPlatform {
    fn show(&self, item: &WidgetItem) {
        self.record(PlatformCall::ShowConfirmation { id: item.id });
        *self.pending_confirmation.borrow_mut() = Some(item.clone());
    }
}

impl Unlocker for SimulatedPlatform {
    fn dismiss_or_unlock(&self) {
        self.record(PlatformCall::Unlock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsw_core::Gravity;

    fn params() -> WindowParams {
        WindowParams {
            x: -10,
            gravity: Gravity::Left,
            width: 100,
        }
    }

    #[test]
    fn test_window_add_is_idempotent() {
        let platform = SimulatedPlatform::new();
        assert_eq!(platform.add(WindowKind::Drawer, &params()), AttachResult::Applied);
        assert_eq!(platform.add(WindowKind::Drawer, &params()), AttachResult::Unchanged);
        assert_eq!(platform.remove(WindowKind::Drawer), AttachResult::Applied);
        assert_eq!(platform.remove(WindowKind::Drawer), AttachResult::Unchanged);
        assert_eq!(
            platform.update(WindowKind::Drawer, &params()),
            AttachResult::Unchanged
        );
    }

    #[test]
    fn test_not_ready_window_manager() {
        let platform = SimulatedPlatform::new();
        platform.set_window_manager_ready(false);
        assert_eq!(platform.add(WindowKind::Frame, &params()), AttachResult::NotReady);
        assert!(!platform.is_attached(WindowKind::Frame));
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_confirmation_is_pending_until_taken() {
        let platform = SimulatedPlatform::new();
        platform.show(&WidgetItem::widget(5, "p"));

        assert_eq!(platform.pending_confirmation().map(|i| i.id), Some(5));
        assert_eq!(platform.take_pending_confirmation().map(|i| i.id), Some(5));
        assert!(platform.pending_confirmation().is_none());
    }

    #[test]
    fn test_host_not_ready() {
        let platform = SimulatedPlatform::new();
        platform.set_host_ready(false);
        assert_eq!(platform.start_listening(), HostResult::NotReady);
        assert!(!platform.is_listening());
    }
}
