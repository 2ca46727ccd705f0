//! Events the engine reports to its frontend
//!
//! Collected while a message is processed and drained by the runner
//! afterwards, in the order they happened within each kind.

use lsw_core::Event;
use serde::Serialize;

use crate::drawer::DrawerSnapshot;
use crate::frame::FrameSnapshot;
use crate::platform::PlatformCall;
use crate::state::OverlayState;

/// Everything observable about the running overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateReport {
    pub running: bool,
    pub drawer: Option<SurfaceReport<DrawerSnapshot>>,
    pub frame: Option<SurfaceReport<FrameSnapshot>>,
    pub pending_confirmation: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceReport<T> {
    pub state: OverlayState,
    /// Widget ids in on-screen order
    pub widgets: Vec<i32>,
    #[serde(flatten)]
    pub surface: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// An event went through the bus
    Bus(Event),

    /// The overlay called the platform
    Platform(PlatformCall),

    /// Answer to a `state` command
    State(Box<StateReport>),

    /// The preference file was reloaded and these keys changed
    PreferencesReloaded { keys: Vec<String> },

    ServiceConnected,
    ServiceDestroyed,

    /// A command or background task failed
    Error {
        line: Option<usize>,
        message: String,
        fatal: bool,
    },

    Shutdown,
}

impl EngineEvent {
    /// Short label for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Bus(_) => "bus",
            Self::Platform(_) => "platform",
            Self::State(_) => "state",
            Self::PreferencesReloaded { .. } => "preferences_reloaded",
            Self::ServiceConnected => "service_connected",
            Self::ServiceDestroyed => "service_destroyed",
            Self::Error { .. } => "error",
            Self::Shutdown => "shutdown",
        }
    }
}
