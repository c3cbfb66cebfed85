//! Envelope analysis.
//!
//! Turns the key-on and key-off amplitude curves into two sounding durations:
//!
//! - **quarter-life**: first slice at or after the peak where the held note
//!   has fallen to `threshold × peak` (or the curve length if it never did)
//! - **decay-out**: first release slice at or below the same level
//!
//! Both levels are anchored to the key-on peak. The analysis is total: every
//! input, including empty curves, yields well-defined indices.

use crate::config::MeasureConfig;

/// Thresholds used by [`analyze`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    /// Fraction of the peak treated as "decayed".
    pub threshold: f64,
    /// Absolute peak below which the patch counts as silent.
    pub silence_floor: f64,
    /// Slices per second, for millisecond conversion.
    pub slices_per_second: u32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self::from(&MeasureConfig::default())
    }
}

impl From<&MeasureConfig> for AnalysisParams {
    fn from(config: &MeasureConfig) -> Self {
        Self {
            threshold: config.decay_threshold,
            silence_floor: config.silence_floor,
            slices_per_second: config.slices_per_second,
        }
    }
}

/// Outcome of one envelope analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationAnalysis {
    /// Amplitude of the first key-on slice.
    pub begin_amplitude: f64,
    /// Largest key-on amplitude.
    pub peak_value: f64,
    /// First slice holding `peak_value`.
    pub peak_index: usize,
    /// Slice where the held note decayed below threshold.
    pub quarter_life_index: usize,
    /// Release slice where the tail decayed below threshold.
    pub keyoff_out_index: usize,
    /// `quarter_life_index` in milliseconds.
    pub key_on_ms: u64,
    /// `keyoff_out_index` in milliseconds.
    pub key_off_ms: u64,
    /// Peak stayed under the absolute audibility floor.
    pub silent: bool,
}

impl DurationAnalysis {
    /// Key-on duration as stored in an instrument record.
    pub fn key_on_ms_u16(&self) -> u16 {
        saturate_u16(self.key_on_ms)
    }

    /// Key-off duration as stored in an instrument record.
    pub fn key_off_ms_u16(&self) -> u16 {
        saturate_u16(self.key_off_ms)
    }
}

fn saturate_u16(ms: u64) -> u16 {
    u16::try_from(ms).unwrap_or(u16::MAX)
}

/// Index and value of the maximum, first occurrence wins.
///
/// Returns `(0, 0.0)` for an empty curve.
pub fn peak(curve: &[f64]) -> (usize, f64) {
    let Some((&first, rest)) = curve.split_first() else {
        return (0, 0.0);
    };

    let mut best = (0, first);
    for (i, &value) in rest.iter().enumerate() {
        if value > best.1 {
            best = (i + 1, value);
        }
    }
    best
}

/// Derive sounding durations from captured amplitude curves.
pub fn analyze(on: &[f64], off: &[f64], params: &AnalysisParams) -> DurationAnalysis {
    let begin_amplitude = on.first().copied().unwrap_or(0.0);
    let (peak_index, peak_value) = peak(on);
    let floor = peak_value * params.threshold;

    let quarter_life_index = on
        .iter()
        .enumerate()
        .skip(peak_index)
        .find(|&(_, &v)| v <= floor)
        .map_or(on.len(), |(i, _)| i);

    let mut keyoff_out_index = off.iter().position(|&v| v <= floor).unwrap_or(0);

    // A note that died before key-off has no real release; fall back to the
    // held-note decay point.
    if keyoff_out_index == 0 && on.last().is_some_and(|&last| last < floor) {
        keyoff_out_index = quarter_life_index;
    }

    let slices_per_second = f64::from(params.slices_per_second.max(1));
    let to_ms = |index: usize| (index as f64 * 1000.0 / slices_per_second) as u64;

    DurationAnalysis {
        begin_amplitude,
        peak_value,
        peak_index,
        quarter_life_index,
        keyoff_out_index,
        key_on_ms: to_ms(quarter_life_index),
        key_off_ms: to_ms(keyoff_out_index),
        silent: peak_value < params.silence_floor,
    }
}
