//! Headless mode - NDJSON event stream for scripted runs
//!
//! The headless runner drives the overlay from a script (or stdin) and
//! reports everything that happened to stdout, one JSON object per line.
//! Each object has an "event" field naming its type plus event-specific
//! data and a millisecond timestamp.
//!
//! # Example Output
//!
//! ```json
//! {"event":"service_connected","timestamp":1704700001000}
//! {"event":"bus","payload":{"type":"show_drawer"},"timestamp":1704700002000}
//! {"event":"platform","payload":{"call":"add_window","window":"drawer","x":0},"timestamp":1704700002000}
//! {"event":"error","line":4,"message":"Invalid command on line 4: unknown command 'dance'","fatal":false,"timestamp":1704700003000}
//! ```

pub mod runner;

use std::io::{self, Write};

use chrono::Utc;
use lsw_app::{EngineEvent, PlatformCall, StateReport};
use lsw_core::Event;
use serde::Serialize;
use tracing::error;

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// The overlay service created its surfaces
    ServiceConnected { timestamp: i64 },

    /// The overlay service tore its surfaces down
    ServiceDestroyed { timestamp: i64 },

    /// An event went through the bus
    Bus { payload: Event, timestamp: i64 },

    /// The overlay called the platform
    Platform { payload: PlatformCall, timestamp: i64 },

    /// Answer to a `state` command
    State { report: StateReport, timestamp: i64 },

    /// The preference file changed on disk
    PreferencesReloaded { keys: Vec<String>, timestamp: i64 },

    /// A script line or background task failed
    Error {
        line: Option<usize>,
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    /// Last event of a run
    Shutdown { timestamp: i64 },
}

impl HeadlessEvent {
    /// Write this event as one NDJSON line
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        let json = serde_json::to_string(self)?;
        writeln!(out, "{}", json)?;
        out.flush()
    }

    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = self.write_to(&mut stdout) {
            error!("Failed to write headless event to stdout: {}", e);
        }
    }

    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    pub fn error(line: Option<usize>, message: String, fatal: bool) -> Self {
        Self::Error {
            line,
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}

impl From<EngineEvent> for HeadlessEvent {
    fn from(event: EngineEvent) -> Self {
        let timestamp = Self::now();
        match event {
            EngineEvent::Bus(payload) => Self::Bus { payload, timestamp },
            EngineEvent::Platform(payload) => Self::Platform { payload, timestamp },
            EngineEvent::State(report) => Self::State {
                report: *report,
                timestamp,
            },
            EngineEvent::PreferencesReloaded { keys } => {
                Self::PreferencesReloaded { keys, timestamp }
            }
            EngineEvent::ServiceConnected => Self::ServiceConnected { timestamp },
            EngineEvent::ServiceDestroyed => Self::ServiceDestroyed { timestamp },
            EngineEvent::Error {
                line,
                message,
                fatal,
            } => Self::Error {
                line,
                message,
                fatal,
                timestamp,
            },
            EngineEvent::Shutdown => Self::Shutdown { timestamp },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsw_app::collaborators::WindowKind;

    fn to_value(event: HeadlessEvent) -> serde_json::Value {
        let mut buf = Vec::new();
        event.write_to(&mut buf).expect("write failed");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.ends_with('\n'));
        serde_json::from_str(text.trim_end()).expect("invalid JSON")
    }

    #[test]
    fn test_bus_event_serialization() {
        let value = to_value(EngineEvent::Bus(Event::DrawerAttachmentState { attached: true }).into());

        assert_eq!(value["event"], "bus");
        assert_eq!(value["payload"]["type"], "drawer_attachment_state");
        assert_eq!(value["payload"]["attached"], true);
        assert!(value["timestamp"].is_number());
    }

    #[test]
    fn test_platform_call_serialization() {
        let value = to_value(
            EngineEvent::Platform(PlatformCall::RemoveWindow {
                window: WindowKind::Drawer,
            })
            .into(),
        );

        assert_eq!(value["event"], "platform");
        assert_eq!(value["payload"]["call"], "remove_window");
        assert_eq!(value["payload"]["window"], "drawer");
    }

    #[test]
    fn test_error_serialization() {
        let value = to_value(HeadlessEvent::error(Some(3), "bad line".to_string(), false));

        assert_eq!(value["event"], "error");
        assert_eq!(value["line"], 3);
        assert_eq!(value["message"], "bad line");
        assert_eq!(value["fatal"], false);
    }

    #[test]
    fn test_unit_events_serialization() {
        assert_eq!(to_value(EngineEvent::ServiceConnected.into())["event"], "service_connected");
        assert_eq!(to_value(EngineEvent::Shutdown.into())["event"], "shutdown");

        let value = to_value(
            EngineEvent::PreferencesReloaded {
                keys: vec!["drawer_widgets".to_string()],
            }
            .into(),
        );
        assert_eq!(value["event"], "preferences_reloaded");
        assert_eq!(value["keys"][0], "drawer_widgets");
    }
}
