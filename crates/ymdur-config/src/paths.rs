//! Config directory and settings file locations.
//!
//! - **User config**: `~/.config/ymdur/` (Linux), `~/Library/Application Support/ymdur/` (macOS), `%APPDATA%\ymdur\` (Windows)
//! - **Measurement settings**: `measure.toml` inside the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use ymdur_config::paths;
//!
//! if let Some(path) = paths::find_settings() {
//!     println!("Using settings from {:?}", path);
//! }
//! ```

use std::path::PathBuf;

use crate::error::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "ymdur";

/// File name of the measurement settings.
pub const SETTINGS_FILE: &str = "measure.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default location of the measurement settings file.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// The default settings file, if one exists.
pub fn find_settings() -> Option<PathBuf> {
    let path = settings_path();
    path.is_file().then_some(path)
}

/// Ensure the user config directory exists.
///
/// Creates the directory and any parent directories if they don't exist.
pub fn ensure_user_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}
