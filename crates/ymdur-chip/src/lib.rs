//! ymdur Chip - behavioral OPN2-style FM chip model
//!
//! [`ModelChip`] implements [`ymdur_core::FmChip`] so measurements can run
//! end to end without a vendor emulator:
//!
//! - [`envelope`] - four-stage envelope generator on a 10-bit attenuation scale
//! - [`channel`] - operator routing for algorithms 0-7 with slot-1 feedback
//! - [`model`] - register decoding, key-on handling and stereo mixing
//!
//! ```rust
//! use ymdur_chip::ModelChip;
//! use ymdur_core::{FmChip, Instrument, program};
//!
//! let mut chip = ModelChip::new();
//! chip.set_sample_rate(48_000);
//! program::start_note(&mut chip, &Instrument::default(), 0);
//!
//! let mut frames = [0i16; 512];
//! chip.render(&mut frames);
//! ```

pub mod channel;
pub mod envelope;
pub mod model;

pub use channel::{Channel, FmOperator};
pub use envelope::{EgRates, EgStage, EnvelopeGenerator};
pub use model::{DEFAULT_CLOCK, ModelChip, pitch_hz};
