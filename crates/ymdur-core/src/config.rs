//! Measurement tuning.

/// Tuning constants for one measurement.
///
/// The defaults reproduce the reference configuration: 44.1 kHz rendering,
/// 150 amplitude slices per second, a 0.5% decay threshold, 40 s of key-on
/// capture with a 6 s minimum window and 60 s of key-off capture.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureConfig {
    /// Chip output sample rate in Hz.
    pub sample_rate: u32,
    /// Amplitude slices per second.
    pub slices_per_second: u32,
    /// Upper bound of the key-on capture, in seconds.
    pub max_key_on_secs: f64,
    /// Key-on capture never stops before this many seconds.
    pub min_key_on_secs: f64,
    /// Upper bound of the key-off capture, in seconds.
    pub max_key_off_secs: f64,
    /// Fraction of the peak amplitude treated as "decayed".
    pub decay_threshold: f64,
    /// Peak amplitudes below this absolute value mark the patch as silent.
    pub silence_floor: f64,
    /// Chip channel (0-5) the instrument is played on.
    pub channel: u8,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            slices_per_second: 150,
            max_key_on_secs: 40.0,
            min_key_on_secs: 6.0,
            max_key_off_secs: 60.0,
            decay_threshold: 0.005,
            silence_floor: 0.5,
            channel: 0,
        }
    }
}

impl MeasureConfig {
    /// Stereo frames rendered per amplitude slice.
    pub fn frames_per_slice(&self) -> usize {
        (self.sample_rate / self.slices_per_second.max(1)) as usize
    }

    /// Maximum number of key-on slices.
    pub fn max_key_on_slices(&self) -> usize {
        self.secs_to_slices(self.max_key_on_secs)
    }

    /// Slice count the key-on capture must pass before it may stop early.
    pub fn min_key_on_slices(&self) -> usize {
        self.secs_to_slices(self.min_key_on_secs)
    }

    /// Maximum number of key-off slices.
    pub fn max_key_off_slices(&self) -> usize {
        self.secs_to_slices(self.max_key_off_secs)
    }

    /// Convert a slice index into whole milliseconds (truncating).
    pub fn slices_to_ms(&self, slices: usize) -> u64 {
        (slices as f64 * 1000.0 / f64::from(self.slices_per_second.max(1))) as u64
    }

    fn secs_to_slices(&self, secs: f64) -> usize {
        (secs.max(0.0) * f64::from(self.slices_per_second)).round() as usize
    }
}
