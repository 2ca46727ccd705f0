//! Typed accessors for the overlay preferences

use lsw_core::prelude::*;
use lsw_core::{dedup_by_id, WidgetItem};
use serde_json::Value;

use super::keys;
use super::store::Preferences;

impl Preferences {
    // ─────────────────────────────────────────────────────────
    // Drawer
    // ─────────────────────────────────────────────────────────

    pub fn drawer_enabled(&self) -> bool {
        self.get_bool(keys::DRAWER_ENABLED, keys::DEFAULT_DRAWER_ENABLED)
    }

    pub fn show_drawer_handle(&self) -> bool {
        self.get_bool(keys::SHOW_DRAWER_HANDLE, keys::DEFAULT_SHOW_DRAWER_HANDLE)
    }

    pub fn drawer_col_count(&self) -> u32 {
        self.get_u32(keys::DRAWER_COL_COUNT, keys::DEFAULT_DRAWER_COL_COUNT)
    }

    pub fn drawer_corner_radius_dp(&self) -> f32 {
        self.get_f32(
            keys::DRAWER_WIDGET_CORNER_RADIUS,
            keys::DEFAULT_DRAWER_CORNER_RADIUS_DP,
        )
    }

    pub fn drawer_side_padding_dp(&self) -> f32 {
        self.get_f32(keys::DRAWER_SIDE_PADDING, keys::DEFAULT_DRAWER_SIDE_PADDING_DP)
    }

    pub fn lock_widget_drawer(&self) -> bool {
        self.get_bool(keys::LOCK_WIDGET_DRAWER, false)
    }

    pub fn request_unlock_drawer(&self) -> bool {
        self.get_bool(keys::REQUEST_UNLOCK_DRAWER, false)
    }

    /// ARGB background color. Accepts an integer or a `#RRGGBB` /
    /// `#AARRGGBB` string; anything else yields the default.
    pub fn drawer_background_color(&self) -> u32 {
        let Some(value) = self.get_value(keys::DRAWER_BACKGROUND_COLOR) else {
            return keys::DEFAULT_DRAWER_BACKGROUND_COLOR;
        };

        match parse_color(&value) {
            Some(color) => color,
            None => {
                warn!(
                    "Invalid {} value {}, using default",
                    keys::DRAWER_BACKGROUND_COLOR,
                    value
                );
                keys::DEFAULT_DRAWER_BACKGROUND_COLOR
            }
        }
    }

    // ─────────────────────────────────────────────────────────
    // Frame
    // ─────────────────────────────────────────────────────────

    pub fn frame_enabled(&self) -> bool {
        self.get_bool(keys::FRAME_ENABLED, keys::DEFAULT_FRAME_ENABLED)
    }

    pub fn frame_row_count(&self) -> u32 {
        self.get_u32(keys::FRAME_ROW_COUNT, keys::DEFAULT_FRAME_ROW_COUNT)
    }

    pub fn frame_col_count(&self) -> u32 {
        self.get_u32(keys::FRAME_COL_COUNT, keys::DEFAULT_FRAME_COL_COUNT)
    }

    pub fn lock_widget_frame(&self) -> bool {
        self.get_bool(keys::LOCK_WIDGET_FRAME, false)
    }

    pub fn request_unlock_frame(&self) -> bool {
        self.get_bool(keys::REQUEST_UNLOCK_FRAME, false)
    }

    // ─────────────────────────────────────────────────────────
    // Widget lists
    // ─────────────────────────────────────────────────────────

    /// Persisted widget list under `key`, with duplicate ids dropped.
    pub fn widget_list(&self, key: &str) -> Vec<WidgetItem> {
        let mut widgets: Vec<WidgetItem> = self.get(key).unwrap_or_default();
        let dropped = dedup_by_id(&mut widgets);
        if dropped > 0 {
            warn!("Dropped {} duplicate widget id(s) from '{}'", dropped, key);
        }
        widgets
    }

    pub fn set_widget_list(&self, key: &str, widgets: &[WidgetItem]) -> Result<()> {
        self.set(key, &widgets)
    }
}

fn parse_color(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => {
            let hex = s.strip_prefix('#')?;
            let parsed = u32::from_str_radix(hex, 16).ok()?;
            match hex.len() {
                6 => Some(0xFF00_0000 | parsed),
                8 => Some(parsed),
                _ => None,
            }
        }
        _ => None,
    }
}
