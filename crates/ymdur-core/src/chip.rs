//! Chip adapter interface.
//!
//! The measurement engine never embeds a concrete emulator. It drives anything
//! implementing [`FmChip`]: a cycle-accurate core, the behavioral model in
//! `ymdur-chip`, or a test double such as [`RegisterLog`].

use core::fmt;

/// Register port of an OPN-family chip.
///
/// Channels 0-2 live on the primary port, channels 3-5 on the secondary one.
/// Global registers (`0x22`-`0x2B`) are always written through the primary port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// Port 0: global registers and channels 0-2.
    Primary,
    /// Port 1: channels 3-5.
    Secondary,
}

impl Port {
    /// Numeric port index (0 or 1).
    pub const fn index(self) -> usize {
        match self {
            Port::Primary => 0,
            Port::Secondary => 1,
        }
    }
}

/// Capability set of an FM synthesis chip emulator.
///
/// Implementations must be deterministic: the same sequence of writes and
/// render calls produces the same samples.
pub trait FmChip {
    /// Set the output sample rate in Hz.
    fn set_sample_rate(&mut self, hz: u32);

    /// Write one register byte.
    fn write_register(&mut self, port: Port, address: u8, value: u8);

    /// Render `out.len() / 2` stereo frames into `out` as interleaved L/R samples.
    ///
    /// Rendering must advance the chip's internal state even when the output
    /// is silent.
    fn render(&mut self, out: &mut [i16]);
}

impl<C: FmChip + ?Sized> FmChip for &mut C {
    fn set_sample_rate(&mut self, hz: u32) {
        (**self).set_sample_rate(hz);
    }

    fn write_register(&mut self, port: Port, address: u8, value: u8) {
        (**self).write_register(port, address, value);
    }

    fn render(&mut self, out: &mut [i16]) {
        (**self).render(out);
    }
}

impl<C: FmChip + ?Sized> FmChip for Box<C> {
    fn set_sample_rate(&mut self, hz: u32) {
        (**self).set_sample_rate(hz);
    }

    fn write_register(&mut self, port: Port, address: u8, value: u8) {
        (**self).write_register(port, address, value);
    }

    fn render(&mut self, out: &mut [i16]) {
        (**self).render(out);
    }
}

/// Creates a fresh chip for every measurement.
///
/// Batch measurement calls this once per instrument, from worker threads,
/// so factories must be `Sync`. Any `Fn() -> C + Sync` closure is a factory.
pub trait ChipFactory: Sync {
    /// Chip type produced by this factory.
    type Chip: FmChip;

    /// Build a chip in its power-on state.
    fn create(&self) -> Self::Chip;
}

impl<F, C> ChipFactory for F
where
    F: Fn() -> C + Sync,
    C: FmChip,
{
    type Chip = C;

    fn create(&self) -> C {
        self()
    }
}

/// A single recorded register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterWrite {
    /// Target port.
    pub port: Port,
    /// Register address.
    pub address: u8,
    /// Value written.
    pub value: u8,
}

impl fmt::Display for RegisterWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "port {} reg 0x{:02X} <- 0x{:02X}",
            self.port.index(),
            self.address,
            self.value
        )
    }
}

/// A chip that records every write and renders silence.
///
/// Used to inspect register programs and as a test double.
#[derive(Debug, Clone, Default)]
pub struct RegisterLog {
    writes: Vec<RegisterWrite>,
    sample_rate: Option<u32>,
    frames_rendered: u64,
}

impl RegisterLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes in the order they were issued.
    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    /// Sample rate passed to [`FmChip::set_sample_rate`], if any.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Total stereo frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl FmChip for RegisterLog {
    fn set_sample_rate(&mut self, hz: u32) {
        self.sample_rate = Some(hz);
    }

    fn write_register(&mut self, port: Port, address: u8, value: u8) {
        self.writes.push(RegisterWrite {
            port,
            address,
            value,
        });
    }

    fn render(&mut self, out: &mut [i16]) {
        out.fill(0);
        self.frames_rendered += (out.len() / 2) as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_log_records_in_order() {
        let mut log = RegisterLog::new();
        log.set_sample_rate(44100);
        log.write_register(Port::Primary, 0x22, 0x00);
        log.write_register(Port::Secondary, 0xB4, 0xC0);

        assert_eq!(log.sample_rate(), Some(44100));
        assert_eq!(log.writes().len(), 2);
        assert_eq!(log.writes()[1].port, Port::Secondary);
        assert_eq!(log.writes()[1].to_string(), "port 1 reg 0xB4 <- 0xC0");
    }

    #[test]
    fn register_log_renders_silence_and_counts_frames() {
        let mut log = RegisterLog::new();
        let mut buf = [7i16; 20];
        log.render(&mut buf);
        assert!(buf.iter().all(|&s| s == 0));
        assert_eq!(log.frames_rendered(), 10);
    }

    #[test]
    fn closures_are_factories() {
        let factory = RegisterLog::new;
        let mut chip = ChipFactory::create(&factory);
        chip.write_register(Port::Primary, 0x28, 0xF0);
        assert_eq!(chip.writes().len(), 1);
    }

    #[test]
    fn mutable_reference_forwards() {
        fn drive<C: FmChip>(mut chip: C) {
            chip.write_register(Port::Primary, 0x2B, 0x00);
        }

        let mut log = RegisterLog::new();
        drive(&mut log);
        assert_eq!(log.writes().len(), 1);
    }
}
