//! Instrument bank files.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use ymdur_core::{Instrument, OPERATOR_COUNT, OPERATOR_REGISTER_COUNT, Operator};

use crate::error::ConfigError;

/// Which list of a bank an instrument belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// Pitched instruments.
    Melodic,
    /// Drum instruments, each played at its own note.
    Percussion,
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InstrumentKind::Melodic => "melodic",
            InstrumentKind::Percussion => "percussion",
        })
    }
}

/// One instrument as stored in a bank file.
///
/// Operators are listed as their seven raw register bytes in write order
/// (`0x30` through `0x90`). Durations are absent until measured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct InstrumentConfig {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Feedback (bits 3-5) and algorithm (bits 0-2).
    #[serde(default)]
    pub fb_alg: u8,
    /// LFO sensitivity byte.
    #[serde(default)]
    pub lfo_sens: u8,
    /// Semitone offset added to the played note.
    #[serde(default)]
    pub fine_tune: i8,
    /// Note for percussion; folded into range before playing.
    #[serde(default)]
    pub percussion_note: u8,
    /// Measured key-on duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_on_ms: Option<u16>,
    /// Measured key-off duration in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_off_ms: Option<u16>,
    /// Register bytes of op0..op3.
    #[serde(default)]
    pub operators: [[u8; OPERATOR_REGISTER_COUNT]; OPERATOR_COUNT],
}

impl InstrumentConfig {
    /// Build a bank entry from an engine instrument.
    ///
    /// The instrument's durations are recorded when `measured` is set, even
    /// when they are 0 ms; otherwise the entry is left unmeasured.
    pub fn from_instrument(
        name: impl Into<String>,
        instrument: &Instrument,
        measured: bool,
    ) -> Self {
        Self {
            name: name.into(),
            fb_alg: instrument.fb_alg,
            lfo_sens: instrument.lfo_sens,
            fine_tune: instrument.fine_tune,
            percussion_note: instrument.percussion_note,
            key_on_ms: measured.then_some(instrument.key_on_ms),
            key_off_ms: measured.then_some(instrument.key_off_ms),
            operators: instrument.operators.map(|op| op.registers()),
        }
    }

    /// Engine instrument for this entry. Missing durations become 0.
    pub fn to_instrument(&self) -> Instrument {
        Instrument {
            operators: self.operators.map(Operator::from_registers),
            fb_alg: self.fb_alg,
            lfo_sens: self.lfo_sens,
            fine_tune: self.fine_tune,
            percussion_note: self.percussion_note,
            key_on_ms: self.key_on_ms.unwrap_or(0),
            key_off_ms: self.key_off_ms.unwrap_or(0),
        }
    }

    /// Store the durations of a measured instrument.
    pub fn record_measurement(&mut self, instrument: &Instrument) {
        self.key_on_ms = Some(instrument.key_on_ms);
        self.key_off_ms = Some(instrument.key_off_ms);
    }

    /// Whether durations have been recorded.
    pub fn is_measured(&self) -> bool {
        self.key_on_ms.is_some()
    }
}

/// A bank of melodic and percussion instruments.
///
/// # TOML Format
///
/// ```toml
/// name = "General MIDI"
///
/// [[melodic]]
/// name = "Piano"
/// fb_alg = 0x32
/// key_on_ms = 1780
/// key_off_ms = 120
/// operators = [
///     [0x71, 0x23, 0x1F, 0x05, 0x02, 0x24, 0x00],
///     [0x0D, 0x2D, 0x19, 0x05, 0x02, 0x24, 0x00],
///     [0x33, 0x26, 0x1F, 0x05, 0x02, 0x24, 0x00],
///     [0x01, 0x00, 0x1F, 0x07, 0x02, 0x27, 0x00],
/// ]
///
/// [[percussion]]
/// name = "Kick"
/// percussion_note = 36
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Bank {
    /// Optional bank name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Melodic instruments.
    #[serde(default)]
    pub melodic: Vec<InstrumentConfig>,
    /// Percussion instruments.
    #[serde(default)]
    pub percussion: Vec<InstrumentConfig>,
}

impl Bank {
    /// Load a bank from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a bank from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Convert the bank to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the bank to a TOML file, creating parent directories.
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

    /// Total number of instruments.
    pub fn len(&self) -> usize {
        self.melodic.len() + self.percussion.len()
    }

    /// Check if the bank has no instruments.
    pub fn is_empty(&self) -> bool {
        self.melodic.is_empty() && self.percussion.is_empty()
    }

    /// One of the two instrument lists.
    pub fn list(&self, kind: InstrumentKind) -> &[InstrumentConfig] {
        match kind {
            InstrumentKind::Melodic => &self.melodic,
            InstrumentKind::Percussion => &self.percussion,
        }
    }

    /// Mutable access to one of the two instrument lists.
    pub fn list_mut(&mut self, kind: InstrumentKind) -> &mut Vec<InstrumentConfig> {
        match kind {
            InstrumentKind::Melodic => &mut self.melodic,
            InstrumentKind::Percussion => &mut self.percussion,
        }
    }

    /// Instrument at `index` in the `kind` list.
    pub fn get(&self, kind: InstrumentKind, index: usize) -> Result<&InstrumentConfig, ConfigError> {
        let list = self.list(kind);
        list.get(index).ok_or(ConfigError::InstrumentNotFound {
            kind,
            index,
            len: list.len(),
        })
    }

    /// Every instrument, melodic first, with its list and position.
    pub fn iter(&self) -> impl Iterator<Item = (InstrumentKind, usize, &InstrumentConfig)> {
        let melodic = self
            .melodic
            .iter()
            .enumerate()
            .map(|(i, c)| (InstrumentKind::Melodic, i, c));
        let percussion = self
            .percussion
            .iter()
            .enumerate()
            .map(|(i, c)| (InstrumentKind::Percussion, i, c));
        melodic.chain(percussion)
    }

    /// Every instrument mutably, melodic first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InstrumentConfig> {
        self.melodic.iter_mut().chain(self.percussion.iter_mut())
    }

    /// Number of instruments without recorded durations.
    pub fn unmeasured_count(&self) -> usize {
        self.iter().filter(|(_, _, c)| !c.is_measured()).count()
    }
}
