//! Configuration file parsing for Lockscreen Widgets
//!
//! Supports:
//! - `.lsw/config.toml` - Display geometry, preference file and runner behavior

pub mod settings;
pub mod types;

pub use settings::{
    init_config_dir, load_settings, preferences_path, save_settings, CONFIG_FILENAME, LSW_DIR,
};
pub use types::*;
