//! Error type shared by every Lockscreen Widgets crate

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors grouped by the layer that raises them
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // I/O and Serialization
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Preference Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Preference store error: {message}")]
    Preferences { message: String },

    #[error("Preference '{key}' has an unexpected value: {message}")]
    PreferenceValue { key: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Overlay Lifecycle Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Overlay '{surface}' lifecycle error: {message}")]
    Lifecycle { surface: String, message: String },

    #[error("Overlay service is not running yet")]
    ServiceNotRunning,

    #[error("Event observer '{observer}' failed: {message}")]
    Observer { observer: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Headless Script Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid command on line {line}: {message}")]
    Command { line: usize, message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn preferences(message: impl Into<String>) -> Self {
        Self::Preferences {
            message: message.into(),
        }
    }

    pub fn preference_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PreferenceValue {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn lifecycle(surface: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lifecycle {
            surface: surface.into(),
            message: message.into(),
        }
    }

    pub fn observer(observer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Observer {
            observer: observer.into(),
            message: message.into(),
        }
    }

    pub fn command(line: usize, message: impl Into<String>) -> Self {
        Self::Command {
            line,
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Preferences { .. }
                | Error::PreferenceValue { .. }
                | Error::ServiceNotRunning
                | Error::Observer { .. }
                | Error::Command { .. }
        )
    }

    /// Check if this error should trigger application exit
    ///
    /// Lifecycle misuse is a programming error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Lifecycle { .. } | Error::ConfigInvalid { .. })
    }
}

// ─────────────────────────────────────────────────────────────────
// Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::preferences("disk full");
        assert_eq!(err.to_string(), "Preference store error: disk full");

        let err = Error::ServiceNotRunning;
        assert!(err.to_string().contains("not running"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let err = Error::config_invalid("density must be positive");
        assert!(err.is_fatal());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_service_not_running_is_recoverable() {
        assert!(Error::ServiceNotRunning.is_recoverable());
        assert!(!Error::ServiceNotRunning.is_fatal());
    }

    #[test]
    fn test_lifecycle_error_names_surface() {
        let err = Error::lifecycle("frame", "created twice");
        assert_eq!(
            err.to_string(),
            "Overlay 'frame' lifecycle error: created twice"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_command_error_carries_line() {
        let err = Error::command(7, "unknown command 'jump'");
        assert!(err.to_string().contains("line 7"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_context_preserves_error_variant() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = result.context("writing preferences").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
