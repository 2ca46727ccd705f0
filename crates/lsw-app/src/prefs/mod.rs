//! Preferences: persisted key-value settings, change notification and
//! per-component handler tables.

pub mod file;
pub mod keys;
pub mod registry;
pub mod store;
mod values;
pub mod watcher;

pub use file::{PreferenceMap, PREFERENCES_FILENAME};
pub use registry::{HandlerRegistry, ScopedHandlers};
pub use store::{ListenerId, PreferenceListener, Preferences};
pub use watcher::PreferenceWatcher;
