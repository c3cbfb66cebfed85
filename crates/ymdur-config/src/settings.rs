//! Measurement settings file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use ymdur_core::MeasureConfig;

use crate::error::ConfigError;
use crate::paths;
use crate::validation::{ValidationResult, validate_settings};

/// User-editable measurement settings.
///
/// Mirrors [`MeasureConfig`] plus the batch worker count. Every field is
/// optional in the file; missing fields take the reference defaults.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 44100
/// slices_per_second = 150
/// max_key_on_secs = 40.0
/// min_key_on_secs = 6.0
/// max_key_off_secs = 60.0
/// decay_threshold = 0.005
/// silence_floor = 0.5
/// channel = 0
/// workers = 4
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeasureSettings {
    /// Chip output sample rate in Hz.
    pub sample_rate: u32,
    /// Amplitude slices per second.
    pub slices_per_second: u32,
    /// Upper bound of the key-on capture, in seconds.
    pub max_key_on_secs: f64,
    /// Minimum key-on capture, in seconds.
    pub min_key_on_secs: f64,
    /// Upper bound of the key-off capture, in seconds.
    pub max_key_off_secs: f64,
    /// Fraction of the peak amplitude treated as decayed.
    pub decay_threshold: f64,
    /// Absolute peak amplitude below which a patch is silent.
    pub silence_floor: f64,
    /// Chip channel (0-5).
    pub channel: u8,
    /// Batch worker threads; all cores when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Default for MeasureSettings {
    fn default() -> Self {
        Self::from(&MeasureConfig::default())
    }
}

impl From<&MeasureConfig> for MeasureSettings {
    fn from(config: &MeasureConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            slices_per_second: config.slices_per_second,
            max_key_on_secs: config.max_key_on_secs,
            min_key_on_secs: config.min_key_on_secs,
            max_key_off_secs: config.max_key_off_secs,
            decay_threshold: config.decay_threshold,
            silence_floor: config.silence_floor,
            channel: config.channel,
            workers: None,
        }
    }
}

impl MeasureSettings {
    /// Check every field.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_settings(self)
    }

    /// Engine configuration for these settings, without validation.
    pub fn to_measure_config(&self) -> MeasureConfig {
        MeasureConfig {
            sample_rate: self.sample_rate,
            slices_per_second: self.slices_per_second,
            max_key_on_secs: self.max_key_on_secs,
            min_key_on_secs: self.min_key_on_secs,
            max_key_off_secs: self.max_key_off_secs,
            decay_threshold: self.decay_threshold,
            silence_floor: self.silence_floor,
            channel: self.channel,
        }
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: MeasureSettings = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load and validate settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load from `explicit` if given, else from the user settings file if it
    /// exists, else use defaults.
    ///
    /// Returns the settings together with the file they came from.
    pub fn load_or_default(
        explicit: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => paths::find_settings(),
        };
        match path {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }
}
