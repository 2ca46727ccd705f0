//! Edge handle the user drags to pull the drawer in

use lsw_core::Gravity;
use serde::Serialize;
use tracing::debug;

use crate::collaborators::{AttachResult, OverlayWindow, WindowKind, WindowParams};

/// Handle width in dp
pub const HANDLE_WIDTH_DP: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Handle {
    shown: bool,
    /// A drag from the handle is in progress
    pub scrolling_open: bool,
    params: WindowParams,
}

impl Handle {
    pub fn new(width_px: u32, gravity: Gravity) -> Self {
        Self {
            shown: false,
            scrolling_open: false,
            params: WindowParams {
                x: 0,
                gravity,
                width: width_px,
            },
        }
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn show(&mut self, window: &dyn OverlayWindow) {
        match window.add(WindowKind::Handle, &self.params) {
            AttachResult::Applied => {
                debug!("Handle shown");
                self.shown = true;
            }
            AttachResult::Unchanged => self.shown = true,
            AttachResult::NotReady => debug!("Window manager not ready, handle not shown"),
        }
    }

    pub fn hide(&mut self, window: &dyn OverlayWindow) {
        match window.remove(WindowKind::Handle) {
            AttachResult::Applied => {
                debug!("Handle hidden");
                self.shown = false;
            }
            AttachResult::Unchanged => self.shown = false,
            AttachResult::NotReady => debug!("Window manager not ready, handle not hidden"),
        }
    }
}
