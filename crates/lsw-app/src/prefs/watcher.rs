//! Watches the preferences file for edits made outside the service
//!
//! Runs the debounced watcher on a blocking task and reports through the
//! owner loop's message channel; the loop then reloads the file on its own
//! thread.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::message::Message;

/// Default debounce duration in milliseconds
pub const DEFAULT_DEBOUNCE_MS: u64 = 250;

pub struct PreferenceWatcher {
    path: PathBuf,
    debounce: Duration,
    stop_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl PreferenceWatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            stop_tx: None,
        }
    }

    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce = Duration::from_millis(ms);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start watching. Sends `Message::PreferencesChanged` on every debounced
    /// batch touching the file.
    pub fn start(&mut self, message_tx: mpsc::Sender<Message>) -> Result<(), String> {
        if self.is_running() {
            return Err("Preference watcher is already running".to_string());
        }

        let path = self.path.clone();
        let debounce = self.debounce;
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
        self.stop_tx = Some(stop_tx);

        tokio::task::spawn_blocking(move || {
            Self::run_watcher(path, debounce, message_tx, stop_rx);
        });

        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop_tx.is_some()
    }

    fn run_watcher(
        path: PathBuf,
        debounce: Duration,
        message_tx: mpsc::Sender<Message>,
        mut stop_rx: tokio::sync::oneshot::Receiver<()>,
    ) {
        let tx_clone = message_tx.clone();
        let file_name = path.file_name().map(|n| n.to_os_string());

        let debouncer_result = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let touched = events.iter().any(|event| {
                        event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name)
                    });
                    if !touched {
                        return;
                    }
                    debug!("Preferences file changed on disk");
                    let _ = tx_clone.blocking_send(Message::PreferencesChanged);
                }
                Err(errors) => {
                    for error in errors {
                        warn!("Preference watcher error: {:?}", error);
                        let _ = tx_clone.blocking_send(Message::WatcherError {
                            message: error.to_string(),
                        });
                    }
                }
            }
        });

        let mut debouncer = match debouncer_result {
            Ok(d) => d,
            Err(e) => {
                error!("Failed to create preference watcher: {}", e);
                let _ = message_tx.blocking_send(Message::WatcherError {
                    message: format!("Failed to create watcher: {}", e),
                });
                return;
            }
        };

        // Watch the directory; editors often replace the file instead of
        // writing in place
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if let Err(e) = debouncer.watch(&dir, RecursiveMode::NonRecursive) {
            warn!("Failed to watch {}: {}", dir.display(), e);
            return;
        }
        info!("Watching preferences: {}", path.display());

        loop {
            match stop_rx.try_recv() {
                Ok(()) | Err(tokio::sync::oneshot::error::TryRecvError::Closed) => {
                    info!("Preference watcher stopping");
                    break;
                }
                Err(tokio::sync::oneshot::error::TryRecvError::Empty) => {
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    }
}

impl Drop for PreferenceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_watcher_is_idle() {
        let watcher = PreferenceWatcher::new("/tmp/lsw/preferences.json").with_debounce_ms(50);
        assert!(!watcher.is_running());
        assert_eq!(watcher.debounce, Duration::from_millis(50));
        assert_eq!(watcher.path(), Path::new("/tmp/lsw/preferences.json"));
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let mut watcher = PreferenceWatcher::new(temp.path().join("preferences.json"));
        let (tx, _rx) = mpsc::channel(8);

        assert!(watcher.start(tx.clone()).is_ok());
        let second = watcher.start(tx);
        assert!(second.unwrap_err().contains("already running"));

        watcher.stop();
        assert!(!watcher.is_running());
    }
}
