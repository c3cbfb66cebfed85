//! Settings and bank files for ymdur.
//!
//! # Features
//!
//! - **Measurement settings**: [`MeasureSettings`] loaded from TOML, validated
//!   and turned into a [`ymdur_core::MeasureConfig`]
//! - **Banks**: [`Bank`] files holding melodic and percussion instruments as
//!   raw register bytes plus their measured durations
//! - **Validation**: [`validate_settings`] collects every invalid setting
//! - **Paths**: platform-specific config directory via [`paths`]
//!
//! # Example
//!
//! ```rust,no_run
//! use ymdur_config::{Bank, MeasureSettings};
//!
//! let (settings, _source) = MeasureSettings::load_or_default(None).unwrap();
//! let config = settings.to_measure_config();
//!
//! let mut bank = Bank::load("bank.toml").unwrap();
//! for entry in bank.iter_mut() {
//!     let instrument = entry.to_instrument();
//!     // ... measure with `config`, then:
//!     entry.record_measurement(&instrument);
//! }
//! bank.save("bank.toml").unwrap();
//! # let _ = config;
//! ```

mod bank;
mod error;
mod settings;

/// Platform-specific configuration paths.
pub mod paths;

/// Measurement settings validation.
pub mod validation;

pub use bank::{Bank, InstrumentConfig, InstrumentKind};
pub use error::ConfigError;
pub use paths::{ensure_user_config_dir, find_settings, settings_path, user_config_dir};
pub use settings::MeasureSettings;
pub use validation::{ValidationError, ValidationResult, validate_settings};
