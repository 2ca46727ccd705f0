//! Preference persistence in `.lsw/preferences.json`
//!
//! The file is a flat JSON object mapping preference keys to values. Writes
//! take an exclusive lock on a sidecar lock file so concurrent writers (the
//! service and an external settings editor) never interleave, and go through
//! a temp file + rename so readers never observe a partial document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use lsw_core::prelude::*;
use serde_json::Value;

/// Default preferences file name inside the config directory
pub const PREFERENCES_FILENAME: &str = "preferences.json";

pub type PreferenceMap = BTreeMap<String, Value>;

/// Read the preferences file.
///
/// A missing file is an empty map. A file that is not a JSON object is an
/// error; callers decide whether to fall back to defaults.
pub fn load_preferences(path: &Path) -> Result<PreferenceMap> {
    if !path.exists() {
        debug!("No preferences file at {:?}, starting empty", path);
        return Ok(PreferenceMap::new());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::preferences(format!("Failed to read {:?}: {}", path, e)))?;

    if content.trim().is_empty() {
        return Ok(PreferenceMap::new());
    }

    let map: PreferenceMap = serde_json::from_str(&content)
        .map_err(|e| Error::preferences(format!("Failed to parse {:?}: {}", path, e)))?;

    debug!("Loaded {} preference(s) from {:?}", map.len(), path);
    Ok(map)
}

/// Write the whole preference map atomically under an exclusive lock.
pub fn save_preferences(path: &Path, values: &PreferenceMap) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::preferences(format!("Invalid preferences path {:?}", path)))?;

    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::preferences(format!("Failed to create {:?}: {}", dir, e)))?;
    }

    let lock = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(path))
        .map_err(|e| Error::preferences(format!("Failed to open preferences lock: {}", e)))?;

    // Blocks while another writer holds the lock
    lock.lock_exclusive()
        .map_err(|e| Error::preferences(format!("Failed to lock preferences: {}", e)))?;

    let content = serde_json::to_string_pretty(values)?;
    let temp_path = temp_path(path);

    std::fs::write(&temp_path, content)
        .map_err(|e| Error::preferences(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| Error::preferences(format!("Failed to rename temp file: {}", e)))?;

    // Lock is released when `lock` is dropped
    trace!("Saved {} preference(s) to {:?}", values.len(), path);
    Ok(())
}

/// Keys whose values differ between two maps (added, removed or changed),
/// in key order.
pub fn changed_keys(old: &PreferenceMap, new: &PreferenceMap) -> Vec<String> {
    let mut keys: Vec<String> = new
        .iter()
        .filter(|(key, value)| old.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();

    keys.extend(
        old.keys()
            .filter(|key| !new.contains_key(*key))
            .cloned(),
    );
    keys.sort();
    keys
}

fn lock_path(path: &Path) -> PathBuf {
    sibling(path, ".lock")
}

fn temp_path(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PREFERENCES_FILENAME.to_string());
    path.with_file_name(format!(".{}{}", name, suffix))
}
