//! Amplitude-envelope capture.
//!
//! Renders the chip one slice at a time and reduces each slice to a single
//! RMS value, building the key-on and key-off amplitude curves that the
//! [`analyzer`](crate::analyzer) works on.
//!
//! Both loops always render: the chip's envelope generators keep evolving
//! while the output is silent, so no slice can be skipped.

use crate::chip::FmChip;
use crate::config::MeasureConfig;

/// Per-slice amplitude values in capture order.
///
/// Filled while capturing, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmplitudeCurve {
    values: Vec<f64>,
}

impl AmplitudeCurve {
    /// Create an empty curve with room for `capacity` slices.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Slice amplitudes.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Number of slices captured.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Amplitude of the final slice.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    fn push(&mut self, value: f64) {
        self.values.push(value);
    }
}

impl From<Vec<f64>> for AmplitudeCurve {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

impl FromIterator<f64> for AmplitudeCurve {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl AsRef<[f64]> for AmplitudeCurve {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// RMS of one channel of an interleaved stereo buffer, taken about the mean.
///
/// This is the standard deviation of the channel's samples, so a constant DC
/// offset reads as silence. `channel` is 0 for left, 1 for right.
pub fn channel_rms(interleaved: &[i16], channel: usize) -> f64 {
    let frames = interleaved.len() / 2;
    if frames == 0 {
        return 0.0;
    }

    let samples = || interleaved.iter().skip(channel).step_by(2).take(frames);

    let mean = samples().map(|&s| f64::from(s)).sum::<f64>() / frames as f64;
    let sum_sq: f64 = samples()
        .map(|&s| {
            let diff = f64::from(s) - mean;
            diff * diff
        })
        .sum();

    (sum_sq / frames as f64).sqrt()
}

/// Result of the key-on capture.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyOnCapture {
    /// Amplitude per slice while the key was held.
    pub curve: AmplitudeCurve,
    /// Highest slice amplitude seen.
    pub peak: f64,
}

/// Slice-by-slice capture loop bound to one configuration.
///
/// Owns the render buffer so repeated slices do not allocate.
#[derive(Debug)]
pub struct EnvelopeCapture {
    buffer: Vec<i16>,
    threshold: f64,
    min_key_on_slices: usize,
    max_key_on_slices: usize,
    max_key_off_slices: usize,
}

impl EnvelopeCapture {
    /// Prepare a capture for `config`.
    pub fn new(config: &MeasureConfig) -> Self {
        Self {
            buffer: vec![0; config.frames_per_slice() * 2],
            threshold: config.decay_threshold,
            min_key_on_slices: config.min_key_on_slices(),
            max_key_on_slices: config.max_key_on_slices(),
            max_key_off_slices: config.max_key_off_slices(),
        }
    }

    /// Render one slice and return its left-channel RMS.
    fn next_slice<C: FmChip + ?Sized>(&mut self, chip: &mut C) -> f64 {
        self.buffer.fill(0);
        chip.render(&mut self.buffer);
        channel_rms(&self.buffer, 0)
    }

    /// Capture while the note is held.
    ///
    /// Stops at the key-on limit, or earlier once the minimum window has
    /// passed and a slice falls below the threshold of the running maximum.
    pub fn key_on<C: FmChip + ?Sized>(&mut self, chip: &mut C) -> KeyOnCapture {
        let mut curve = AmplitudeCurve::with_capacity(self.max_key_on_slices);
        let mut peak = 0.0_f64;

        for slice in 0..self.max_key_on_slices {
            let amplitude = self.next_slice(chip);
            curve.push(amplitude);
            if amplitude > peak {
                peak = amplitude;
            }

            if slice > self.min_key_on_slices && amplitude < peak * self.threshold {
                break;
            }
        }

        tracing::debug!(slices = curve.len(), peak, "key-on capture finished");
        KeyOnCapture { curve, peak }
    }

    /// Capture the release tail after key-off.
    ///
    /// `on_peak` is the key-on maximum: the tail is judged against the held
    /// note's peak, never against its own.
    pub fn key_off<C: FmChip + ?Sized>(&mut self, chip: &mut C, on_peak: f64) -> AmplitudeCurve {
        let mut curve = AmplitudeCurve::with_capacity(self.max_key_off_slices);
        let floor = on_peak * self.threshold;

        for _ in 0..self.max_key_off_slices {
            let amplitude = self.next_slice(chip);
            curve.push(amplitude);
            if amplitude < floor {
                break;
            }
        }

        tracing::debug!(slices = curve.len(), "key-off capture finished");
        curve
    }
}
