//! Single-instrument measurement.
//!
//! A measurement walks a fixed sequence of stages, each consuming the previous
//! one so the order cannot be violated:
//!
//! ```text
//! Programmed --key_on()--> Sustained --key_off()--> Released --analyze()--> DurationAnalysis
//! ```
//!
//! [`Measurer`] runs the whole sequence with a fresh chip per call.
//!
//! # Example
//!
//! ```rust
//! use ymdur_core::{Instrument, MeasureConfig, Measurer, RegisterLog};
//!
//! let config = MeasureConfig {
//!     max_key_on_secs: 0.1,
//!     min_key_on_secs: 0.0,
//!     max_key_off_secs: 0.1,
//!     ..Default::default()
//! };
//! let measurer = Measurer::new(RegisterLog::new, config);
//!
//! let mut instrument = Instrument::default();
//! let analysis = measurer.measure(&mut instrument);
//! assert!(analysis.silent);
//! ```

use crate::analyzer::{AnalysisParams, DurationAnalysis, analyze};
use crate::capture::{AmplitudeCurve, EnvelopeCapture};
use crate::chip::{ChipFactory, FmChip};
use crate::config::MeasureConfig;
use crate::patch::Instrument;
use crate::program::{self, FrequencyEncoding};

/// A chip loaded with an instrument, pitch latched, key still up.
#[derive(Debug)]
pub struct Programmed<C> {
    chip: C,
    channel: u8,
    capture: EnvelopeCapture,
    params: AnalysisParams,
    frequency: FrequencyEncoding,
}

impl<C: FmChip> Programmed<C> {
    /// Configure `chip` and load `instrument` into the configured channel.
    pub fn new(mut chip: C, instrument: &Instrument, config: &MeasureConfig) -> Self {
        chip.set_sample_rate(config.sample_rate);
        program::program_channel(&mut chip, instrument, config.channel);

        let note = program::measurement_note(instrument.percussion_note);
        let frequency = FrequencyEncoding::for_note(note, instrument.fine_tune);
        program::set_frequency(&mut chip, config.channel, &frequency);

        tracing::debug!(
            channel = config.channel,
            note,
            block = frequency.block(),
            fnum = frequency.fnum(),
            "instrument programmed"
        );

        Self {
            chip,
            channel: config.channel,
            capture: EnvelopeCapture::new(config),
            params: AnalysisParams::from(config),
            frequency,
        }
    }

    /// Frequency latched for the note.
    pub fn frequency(&self) -> &FrequencyEncoding {
        &self.frequency
    }

    /// Key the note on and capture the held envelope.
    pub fn key_on(mut self) -> Sustained<C> {
        program::key_on(&mut self.chip, self.channel);
        let on = self.capture.key_on(&mut self.chip);
        Sustained {
            chip: self.chip,
            channel: self.channel,
            capture: self.capture,
            params: self.params,
            on: on.curve,
            on_peak: on.peak,
        }
    }
}

/// Key-on envelope captured, note still held.
#[derive(Debug)]
pub struct Sustained<C> {
    chip: C,
    channel: u8,
    capture: EnvelopeCapture,
    params: AnalysisParams,
    on: AmplitudeCurve,
    on_peak: f64,
}

impl<C: FmChip> Sustained<C> {
    /// Held-note amplitude curve.
    pub fn on_curve(&self) -> &AmplitudeCurve {
        &self.on
    }

    /// Release the key and capture the tail.
    pub fn key_off(mut self) -> Released {
        program::key_off(&mut self.chip, self.channel);
        let off = self.capture.key_off(&mut self.chip, self.on_peak);
        Released {
            params: self.params,
            on: self.on,
            off,
        }
    }
}

/// Both envelopes captured; the chip has been dropped.
#[derive(Debug, Clone)]
pub struct Released {
    params: AnalysisParams,
    on: AmplitudeCurve,
    off: AmplitudeCurve,
}

impl Released {
    /// Held-note amplitude curve.
    pub fn on_curve(&self) -> &AmplitudeCurve {
        &self.on
    }

    /// Release-tail amplitude curve.
    pub fn off_curve(&self) -> &AmplitudeCurve {
        &self.off
    }

    /// Derive the sounding durations.
    pub fn analyze(&self) -> DurationAnalysis {
        let result = analyze(self.on.as_slice(), self.off.as_slice(), &self.params);
        tracing::debug!(
            peak = result.peak_value,
            peak_index = result.peak_index,
            key_on_ms = result.key_on_ms,
            key_off_ms = result.key_off_ms,
            silent = result.silent,
            "envelope analyzed"
        );
        result
    }
}

impl DurationAnalysis {
    /// Store the durations in `instrument`, saturating to its `u16` fields.
    pub fn apply_to(&self, instrument: &mut Instrument) {
        instrument.key_on_ms = self.key_on_ms_u16();
        instrument.key_off_ms = self.key_off_ms_u16();
    }
}

/// Run every stage on `chip` and return the analysis without touching the instrument.
pub fn measure_with_chip<C: FmChip>(
    chip: C,
    instrument: &Instrument,
    config: &MeasureConfig,
) -> DurationAnalysis {
    Programmed::new(chip, instrument, config)
        .key_on()
        .key_off()
        .analyze()
}

/// Measures instruments, one fresh chip each.
#[derive(Debug, Clone)]
pub struct Measurer<F> {
    factory: F,
    config: MeasureConfig,
}

impl<F: ChipFactory> Measurer<F> {
    /// Create a measurer drawing chips from `factory`.
    pub fn new(factory: F, config: MeasureConfig) -> Self {
        Self { factory, config }
    }

    /// Tuning in use.
    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    /// Measure without writing back.
    pub fn analyze(&self, instrument: &Instrument) -> DurationAnalysis {
        measure_with_chip(self.factory.create(), instrument, &self.config)
    }

    /// Measure and write both durations into `instrument`.
    pub fn measure(&self, instrument: &mut Instrument) -> DurationAnalysis {
        let result = self.analyze(instrument);
        result.apply_to(instrument);
        result
    }

    /// Run the stages up to the release capture and keep both curves.
    pub fn capture(&self, instrument: &Instrument) -> Released {
        Programmed::new(self.factory.create(), instrument, &self.config)
            .key_on()
            .key_off()
    }
}
