//! Settings parser for .lsw/config.toml

use std::path::{Path, PathBuf};

use lsw_core::prelude::*;

use super::types::Settings;

pub const CONFIG_FILENAME: &str = "config.toml";
pub const LSW_DIR: &str = ".lsw";

/// Load settings from .lsw/config.toml
///
/// Returns default settings if the file doesn't exist, can't be parsed or
/// holds values the overlay cannot use.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = project_path.join(LSW_DIR).join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    let settings: Settings = match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                return Settings::default();
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            return Settings::default();
        }
    };

    if let Err(e) = settings.validate() {
        warn!("Ignoring {:?}: {}", config_path, e);
        return Settings::default();
    }

    debug!("Loaded settings from {:?}", config_path);
    settings
}

/// Where the preference file for `settings` lives
pub fn preferences_path(project_path: &Path, settings: &Settings) -> PathBuf {
    project_path.join(LSW_DIR).join(&settings.preferences.file)
}

/// Create .lsw/ with a commented default config.toml
pub fn init_config_dir(project_path: &Path) -> Result<()> {
    let lsw_dir = project_path.join(LSW_DIR);

    if !lsw_dir.exists() {
        std::fs::create_dir_all(&lsw_dir)
            .map_err(|e| Error::config(format!("Failed to create .lsw dir: {}", e)))?;
        info!("Created .lsw directory");
    }

    let config_path = lsw_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# Lockscreen Widgets Configuration

[display]
width_px = 1080
density = 2.625             # px per dp
status_bar_height_px = 63

[preferences]
file = "preferences.json"   # relative to .lsw/
watch = true                # reload on external edits
debounce_ms = 200

[behavior]
connect_on_start = true
report_platform_calls = true
strict = false              # stop at the first invalid command
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
    }

    Ok(())
}

/// Save settings to .lsw/config.toml
///
/// Uses atomic write (temp file + rename).
pub fn save_settings(project_path: &Path, settings: &Settings) -> Result<()> {
    settings.validate()?;

    let lsw_dir = project_path.join(LSW_DIR);
    if !lsw_dir.exists() {
        std::fs::create_dir_all(&lsw_dir)
            .map_err(|e| Error::config(format!("Failed to create .lsw dir: {}", e)))?;
    }

    let config_path = lsw_dir.join(CONFIG_FILENAME);
    let temp_path = lsw_dir.join(".config.toml.tmp");

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("# Lockscreen Widgets Configuration\n\n{}", content);

    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_defaults() {
        let temp = tempdir().unwrap();
        let settings = load_settings(temp.path());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_custom() {
        let temp = tempdir().unwrap();
        let lsw_dir = temp.path().join(".lsw");
        std::fs::create_dir_all(&lsw_dir).unwrap();

        let config = r#"
[display]
width_px = 720
density = 2.0

[preferences]
file = "prefs.json"
watch = false
"#;
        std::fs::write(lsw_dir.join("config.toml"), config).unwrap();

        let settings = load_settings(temp.path());

        assert_eq!(settings.display.width_px, 720);
        assert_eq!(settings.display.status_bar_height_px, 63);
        assert!(!settings.preferences.watch);
        assert_eq!(
            preferences_path(temp.path(), &settings),
            temp.path().join(".lsw/prefs.json")
        );
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let temp = tempdir().unwrap();
        let lsw_dir = temp.path().join(".lsw");
        std::fs::create_dir_all(&lsw_dir).unwrap();
        std::fs::write(lsw_dir.join("config.toml"), "not valid toml {{{{").unwrap();

        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_load_settings_invalid_values() {
        let temp = tempdir().unwrap();
        let lsw_dir = temp.path().join(".lsw");
        std::fs::create_dir_all(&lsw_dir).unwrap();
        std::fs::write(lsw_dir.join("config.toml"), "[display]\ndensity = -1.0\n").unwrap();

        assert_eq!(load_settings(temp.path()).display.density, 2.625);
    }

    #[test]
    fn test_init_config_dir() {
        let temp = tempdir().unwrap();

        init_config_dir(temp.path()).unwrap();

        let config_path = temp.path().join(".lsw/config.toml");
        assert!(config_path.exists());
        // The generated file parses to the defaults
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_init_config_dir_keeps_existing() {
        let temp = tempdir().unwrap();
        let lsw_dir = temp.path().join(".lsw");
        std::fs::create_dir_all(&lsw_dir).unwrap();
        std::fs::write(lsw_dir.join("config.toml"), "[display]\nwidth_px = 500\n").unwrap();

        init_config_dir(temp.path()).unwrap();

        assert_eq!(load_settings(temp.path()).display.width_px, 500);
    }

    #[test]
    fn test_save_settings_round_trip() {
        let temp = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.display.density = 3.5;
        settings.behavior.strict = true;

        save_settings(temp.path(), &settings).unwrap();

        assert_eq!(load_settings(temp.path()), settings);
        assert!(!temp.path().join(".lsw/.config.toml.tmp").exists());
    }

    #[test]
    fn test_save_settings_rejects_invalid() {
        let temp = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.display.width_px = 0;

        assert!(save_settings(temp.path(), &settings).is_err());
        assert!(!temp.path().join(".lsw/config.toml").exists());
    }
}
