//! lsw-app - Overlay core for Lockscreen Widgets
//!
//! This crate implements the event bus, the preference store with its
//! per-component handler tables, the overlay delegate state machine and its
//! two surfaces (drawer and lock-screen frame), the overlay service that owns
//! them, and the engine that drives everything from script commands.
//!
//! Everything on the overlay side is `Rc`/`RefCell` based and lives on one
//! thread. Background work (preference file watching, script reading) talks
//! to it only through the engine's message channel.

pub mod bus;
pub mod collaborators;
pub mod command;
pub mod config;
pub mod delegate;
pub mod drawer;
pub mod engine;
pub mod engine_event;
pub mod frame;
pub mod grid;
pub mod list_model;
pub mod message;
pub mod platform;
pub mod prefs;
pub mod service;
pub mod state;
pub mod store;
pub mod transition;

// Re-export primary types
pub use bus::{EventBus, EventObserver, ObserverId};
pub use command::{Command, Target};
pub use config::Settings;
pub use delegate::{Delegate, DelegateCore, Lifecycle, Surface};
pub use drawer::{DrawerDelegate, DrawerSnapshot};
pub use engine::Engine;
pub use engine_event::{EngineEvent, StateReport};
pub use frame::{FrameDelegate, FrameSnapshot};
pub use message::Message;
pub use platform::{PlatformCall, SimulatedPlatform};
pub use prefs::{HandlerRegistry, Preferences};
pub use service::OverlayService;
pub use state::OverlayState;
