//! Messages delivered to the owner loop
//!
//! Background tasks (script reader, preference watcher) never touch the
//! overlay directly; they send one of these through the engine's channel.

use crate::command::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A parsed script line
    Command { line: usize, command: Command },

    /// A script line that could not be parsed
    InvalidCommand { line: usize, message: String },

    /// The preference file was changed on disk
    PreferencesChanged,

    /// The preference watcher failed
    WatcherError { message: String },

    /// The script or stdin reached its end
    InputClosed,

    /// Stop the loop
    Quit,
}
