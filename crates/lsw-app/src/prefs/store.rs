//! Shared preference store with change notification
//!
//! Writes commit immediately. Their change notifications are queued and
//! delivered by [`Preferences::dispatch_pending`], which the owner loop calls
//! once the current operation has returned. A handler that writes a
//! preference therefore never re-enters itself, and a component can update
//! its own state before the notification for its write arrives.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use lsw_core::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::file::{changed_keys, load_preferences, save_preferences, PreferenceMap};

/// Receiver of preference change notifications
pub trait PreferenceListener {
    fn on_preference_changed(&self, key: &str) -> Result<()>;
}

/// Handle for one listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    listener: Weak<dyn PreferenceListener>,
}

#[derive(Default)]
struct PrefsInner {
    values: RefCell<PreferenceMap>,
    listeners: RefCell<Vec<ListenerEntry>>,
    pending: RefCell<VecDeque<String>>,
    next_id: Cell<u64>,
    path: Option<PathBuf>,
}

/// Key-value preference source. Cloning yields another handle to the same
/// store.
#[derive(Clone, Default)]
pub struct Preferences {
    inner: Rc<PrefsInner>,
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("path", &self.inner.path)
            .field("values", &self.inner.values.borrow().len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Preferences {
    /// In-memory store (nothing is persisted)
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// In-memory store seeded with values
    pub fn with_values(values: PreferenceMap) -> Self {
        Self {
            inner: Rc::new(PrefsInner {
                values: RefCell::new(values),
                ..Default::default()
            }),
        }
    }

    /// Store backed by a JSON file. An unreadable file yields defaults; the
    /// next write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match load_preferences(&path) {
            Ok(values) => values,
            Err(e) => {
                warn!("{}; using default preferences", e);
                PreferenceMap::new()
            }
        };

        Self {
            inner: Rc::new(PrefsInner {
                values: RefCell::new(values),
                path: Some(path),
                ..Default::default()
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    // ─────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────

    pub fn contains(&self, key: &str) -> bool {
        self.inner.values.borrow().contains_key(key)
    }

    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.inner.values.borrow().get(key).cloned()
    }

    /// Typed read. A missing key is `None`; a value of the wrong shape is
    /// logged and also `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Preference '{}' has an unexpected value: {}", key, e);
                None
            }
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get_or(key, default)
    }

    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        self.get_or(key, default)
    }

    pub fn get_f32(&self, key: &str, default: f32) -> f32 {
        self.get_or(key, default)
    }

    // ─────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────

    /// Commit a value and queue a change notification for `key`.
    ///
    /// The in-memory value is always updated. An error means only that the
    /// file could not be written.
    pub fn set_value(&self, key: &str, value: Value) -> Result<()> {
        self.inner
            .values
            .borrow_mut()
            .insert(key.to_string(), value);
        self.queue(key);
        self.persist()
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::preference_value(key, e.to_string()))?;
        self.set_value(key, value)
    }

    /// Remove a key, queueing a notification if it was present.
    pub fn remove(&self, key: &str) -> Result<()> {
        let removed = self.inner.values.borrow_mut().remove(key).is_some();
        if removed {
            self.queue(key);
            self.persist()?;
        }
        Ok(())
    }

    /// Replace every value without writing the file (used after the file
    /// changed on disk). Queues a notification for each changed key and
    /// returns those keys.
    pub fn replace_all(&self, values: PreferenceMap) -> Vec<String> {
        let changed = changed_keys(&self.inner.values.borrow(), &values);
        *self.inner.values.borrow_mut() = values;
        for key in &changed {
            self.queue(key);
        }
        changed
    }

    /// Re-read the backing file and queue notifications for changed keys.
    pub fn reload(&self) -> Result<Vec<String>> {
        let Some(path) = self.inner.path.as_deref() else {
            return Ok(Vec::new());
        };
        let values = load_preferences(path)?;
        Ok(self.replace_all(values))
    }

    fn queue(&self, key: &str) {
        self.inner.pending.borrow_mut().push_back(key.to_string());
    }

    fn persist(&self) -> Result<()> {
        match self.inner.path.as_deref() {
            Some(path) => save_preferences(path, &self.inner.values.borrow()),
            None => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Listeners
    // ─────────────────────────────────────────────────────────

    pub fn register(&self, listener: Weak<dyn PreferenceListener>) -> ListenerId {
        let id = ListenerId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push(ListenerEntry { id, listener });
        id
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.pending.borrow().is_empty()
    }

    /// Deliver a change notification for `key` right away, to every
    /// registered listener in registration order.
    pub fn notify_changed(&self, key: &str) -> Result<()> {
        let snapshot: Vec<(ListenerId, Weak<dyn PreferenceListener>)> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|entry| (entry.id, entry.listener.clone()))
            .collect();

        trace!("Preference '{}' changed, {} listener(s)", key, snapshot.len());

        for (id, listener) in snapshot {
            if !self.is_registered(id) {
                continue;
            }
            match listener.upgrade() {
                Some(listener) => listener.on_preference_changed(key)?,
                None => {
                    self.unregister(id);
                }
            }
        }
        Ok(())
    }

    /// Deliver the notifications queued so far. Writes made by the
    /// listeners while this runs are queued for the next call. Returns the
    /// number delivered.
    pub fn dispatch_pending(&self) -> Result<usize> {
        let mut batch = std::mem::take(&mut *self.inner.pending.borrow_mut());
        let mut delivered = 0;
        while let Some(key) = batch.pop_front() {
            if let Err(e) = self.notify_changed(&key) {
                // Keep the undelivered rest ahead of anything queued since
                let mut pending = self.inner.pending.borrow_mut();
                batch.append(&mut pending);
                *pending = batch;
                return Err(e);
            }
            delivered += 1;
        }
        Ok(delivered)
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.inner
            .listeners
            .borrow()
            .iter()
            .any(|entry| entry.id == id)
    }
}
