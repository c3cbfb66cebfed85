//! Shared CLI helpers used across multiple commands.

use std::path::Path;
use ymdur_config::{InstrumentKind, MeasureSettings};

/// Load measurement settings from `--config`, the user settings file, or defaults.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<MeasureSettings> {
    let (settings, source) = MeasureSettings::load_or_default(explicit)?;
    match source {
        Some(path) => tracing::info!(path = %path.display(), "loaded measurement settings"),
        None => tracing::info!("no settings file, using defaults"),
    }
    Ok(settings)
}

/// Instrument list selected by a `--percussion` flag.
pub fn instrument_kind(percussion: bool) -> InstrumentKind {
    if percussion {
        InstrumentKind::Percussion
    } else {
        InstrumentKind::Melodic
    }
}
