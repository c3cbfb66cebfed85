//! ymdur Core - sounding-duration measurement for 4-operator FM patches
//!
//! Drives an OPN2-family chip emulator with an instrument's register program,
//! captures the resulting amplitude envelope and derives two durations:
//!
//! - **key-on**: how long a held note takes to decay to near-silence
//! - **key-off**: how long the release tail takes to decay after key-off
//!
//! # Components
//!
//! - [`chip`] - the [`FmChip`] capability trait and a [`RegisterLog`] test double
//! - [`patch`] - [`Instrument`] and [`Operator`] register data
//! - [`program`] - register write sequence and block/F-number encoding
//! - [`capture`] - slice-by-slice RMS envelope capture
//! - [`analyzer`] - pure curve analysis producing a [`DurationAnalysis`]
//! - [`engine`] - staged single-instrument measurement ([`Measurer`])
//! - [`batch`] - parallel batch runner with cooperative cancellation
//!
//! # Example
//!
//! ```rust,ignore
//! use ymdur_core::{BatchRunner, MeasureConfig, Measurer};
//! use ymdur_chip::ModelChip;
//!
//! let runner = BatchRunner::new(Measurer::new(ModelChip::new, MeasureConfig::default()));
//! let all_done = runner.measure_batch(bank.iter_mut());
//! ```

pub mod analyzer;
pub mod batch;
pub mod capture;
pub mod chip;
pub mod config;
pub mod engine;
pub mod patch;
pub mod program;

pub use analyzer::{AnalysisParams, DurationAnalysis, analyze, peak};
pub use batch::{BatchProgress, BatchReport, BatchRunner, CancelToken, default_workers};
pub use capture::{AmplitudeCurve, EnvelopeCapture, KeyOnCapture, channel_rms};
pub use chip::{ChipFactory, FmChip, Port, RegisterLog, RegisterWrite};
pub use config::MeasureConfig;
pub use engine::{Measurer, Programmed, Released, Sustained, measure_with_chip};
pub use patch::{Instrument, OPERATOR_COUNT, OPERATOR_REGISTER_COUNT, Operator};
pub use program::{ChannelAddress, FrequencyEncoding, measurement_note};
