//! Checks applied to user-supplied measurement settings.
//!
//! Settings come from user-edited TOML, so every field is checked before a
//! [`MeasureConfig`](ymdur_core::MeasureConfig) is built from them. All
//! problems are collected rather than stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use ymdur_config::{MeasureSettings, validate_settings};
//!
//! let mut settings = MeasureSettings::default();
//! assert!(validate_settings(&settings).is_ok());
//!
//! settings.channel = 7;
//! assert!(validate_settings(&settings).is_err());
//! ```

use thiserror::Error;
use ymdur_core::program::CHANNEL_COUNT;

use crate::settings::MeasureSettings;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Numeric setting outside its inclusive range.
    #[error("setting '{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the setting.
        field: String,
        /// The value that was out of range.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Setting that violates a constraint other than a plain range.
    #[error("setting '{field}' is invalid: {reason}")]
    Invalid {
        /// Name of the setting.
        field: String,
        /// Description of the problem.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn non_negative_secs(field: &str, value: f64, errors: &mut Vec<ValidationError>) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(invalid(
            field,
            format!("{value} is not a non-negative number of seconds"),
        ));
    }
}

/// Check every measurement setting.
///
/// Returns the single error when only one check fails, or
/// [`ValidationError::Multiple`] otherwise.
pub fn validate_settings(settings: &MeasureSettings) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if settings.sample_rate == 0 {
        errors.push(invalid("sample_rate", "must be positive"));
    }
    if settings.slices_per_second == 0 {
        errors.push(invalid("slices_per_second", "must be positive"));
    } else if settings.sample_rate != 0 && settings.sample_rate < settings.slices_per_second {
        errors.push(invalid(
            "slices_per_second",
            format!(
                "{} slices per second leaves no frames per slice at {} Hz",
                settings.slices_per_second, settings.sample_rate
            ),
        ));
    }

    non_negative_secs("max_key_on_secs", settings.max_key_on_secs, &mut errors);
    non_negative_secs("min_key_on_secs", settings.min_key_on_secs, &mut errors);
    non_negative_secs("max_key_off_secs", settings.max_key_off_secs, &mut errors);
    if settings.min_key_on_secs > settings.max_key_on_secs {
        errors.push(invalid(
            "min_key_on_secs",
            format!(
                "{} exceeds max_key_on_secs ({})",
                settings.min_key_on_secs, settings.max_key_on_secs
            ),
        ));
    }

    let threshold = settings.decay_threshold;
    if !(threshold > 0.0 && threshold < 1.0) {
        errors.push(invalid(
            "decay_threshold",
            format!("{threshold} must lie strictly between 0 and 1"),
        ));
    }
    if !(settings.silence_floor.is_finite() && settings.silence_floor >= 0.0) {
        errors.push(invalid(
            "silence_floor",
            format!("{} must be a non-negative amplitude", settings.silence_floor),
        ));
    }

    if settings.channel >= CHANNEL_COUNT {
        errors.push(ValidationError::OutOfRange {
            field: "channel".to_string(),
            value: f64::from(settings.channel),
            min: 0.0,
            max: f64::from(CHANNEL_COUNT - 1),
        });
    }
    if settings.workers == Some(0) {
        errors.push(invalid("workers", "must be at least 1 when set"));
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_settings(&MeasureSettings::default()), Ok(()));
    }

    #[test]
    fn channel_out_of_range() {
        let settings = MeasureSettings {
            channel: 6,
            ..Default::default()
        };
        let err = validate_settings(&settings).unwrap_err();
        assert_eq!(
            err.to_string(),
            "setting 'channel' value 6 out of range [0, 5]"
        );
    }

    #[test]
    fn threshold_bounds_are_exclusive() {
        for threshold in [0.0, 1.0, -0.1, f64::NAN] {
            let settings = MeasureSettings {
                decay_threshold: threshold,
                ..Default::default()
            };
            assert!(
                matches!(
                    validate_settings(&settings),
                    Err(ValidationError::Invalid { ref field, .. }) if field == "decay_threshold"
                ),
                "threshold {threshold} accepted"
            );
        }
    }

    #[test]
    fn slices_must_fit_in_sample_rate() {
        let settings = MeasureSettings {
            sample_rate: 100,
            slices_per_second: 150,
            ..Default::default()
        };
        assert!(validate_settings(&settings).is_err());

        let settings = MeasureSettings {
            sample_rate: 150,
            slices_per_second: 150,
            ..Default::default()
        };
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn min_window_above_max_rejected() {
        let settings = MeasureSettings {
            min_key_on_secs: 50.0,
            ..Default::default()
        };
        let err = validate_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("min_key_on_secs"), "got: {err}");
    }

    #[test]
    fn several_problems_are_collected() {
        let settings = MeasureSettings {
            sample_rate: 0,
            max_key_off_secs: -1.0,
            channel: 9,
            workers: Some(0),
            ..Default::default()
        };
        match validate_settings(&settings) {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 4),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }
}
