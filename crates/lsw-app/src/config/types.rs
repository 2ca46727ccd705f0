//! Configuration types

use lsw_core::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collaborators::DisplayMetrics;
use crate::prefs::PREFERENCES_FILENAME;

/// Application settings (.lsw/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub display: DisplaySettings,

    #[serde(default)]
    pub preferences: PreferenceSettings,

    #[serde(default)]
    pub behavior: BehaviorSettings,
}

impl Settings {
    /// Reject values the overlay cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.display.width_px == 0 {
            return Err(Error::config_invalid("display.width_px must be positive"));
        }
        if self.display.density.is_nan() || self.display.density <= 0.0 {
            return Err(Error::config_invalid(format!(
                "display.density must be positive, got {}",
                self.display.density
            )));
        }
        if self.preferences.file.trim().is_empty() {
            return Err(Error::config_invalid("preferences.file is empty"));
        }
        Ok(())
    }
}

/// Simulated screen
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DisplaySettings {
    #[serde(default = "default_width_px")]
    pub width_px: u32,

    /// Pixels per dp
    #[serde(default = "default_density")]
    pub density: f32,

    /// Top padding applied to the drawer content
    #[serde(default = "default_status_bar_height_px")]
    pub status_bar_height_px: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width_px: default_width_px(),
            density: default_density(),
            status_bar_height_px: default_status_bar_height_px(),
        }
    }
}

impl DisplaySettings {
    pub fn metrics(&self) -> DisplayMetrics {
        DisplayMetrics {
            width_px: self.width_px,
            density: self.density,
            status_bar_height_px: self.status_bar_height_px,
        }
    }
}

/// Preference file settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PreferenceSettings {
    /// File name, relative to the `.lsw` directory
    #[serde(default = "default_preferences_file")]
    pub file: String,

    /// Reload when the file is edited externally
    #[serde(default = "default_true")]
    pub watch: bool,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        Self {
            file: default_preferences_file(),
            watch: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// Runner behavior
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BehaviorSettings {
    /// Connect the overlay service as soon as the runner starts
    #[serde(default = "default_true")]
    pub connect_on_start: bool,

    /// Report every simulated platform call
    #[serde(default = "default_true")]
    pub report_platform_calls: bool,

    /// Stop at the first invalid script line instead of reporting it
    #[serde(default)]
    pub strict: bool,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            connect_on_start: true,
            report_platform_calls: true,
            strict: false,
        }
    }
}

fn default_width_px() -> u32 {
    1080
}

fn default_density() -> f32 {
    2.625
}

fn default_status_bar_height_px() -> u32 {
    63
}

fn default_preferences_file() -> String {
    PREFERENCES_FILENAME.to_string()
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_display_metrics() {
        let settings = Settings::default();
        assert_eq!(settings.display.metrics(), DisplayMetrics::default());
        assert_eq!(settings.preferences.file, "preferences.json");
        assert!(settings.behavior.connect_on_start);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[display]
density = 3.0

[behavior]
strict = true
"#,
        )
        .unwrap();

        assert_eq!(settings.display.density, 3.0);
        assert_eq!(settings.display.width_px, 1080);
        assert!(settings.preferences.watch);
        assert!(settings.behavior.strict);
        assert!(settings.behavior.report_platform_calls);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut settings = Settings::default();
        settings.display.density = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(Error::ConfigInvalid { .. })
        ));

        let mut settings = Settings::default();
        settings.display.width_px = 0;
        assert!(settings.validate().is_err());
    }
}
