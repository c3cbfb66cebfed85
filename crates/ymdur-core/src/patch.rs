//! Instrument patch data model.
//!
//! A patch is stored the way the chip consumes it: seven raw register bytes per
//! operator plus the channel-wide feedback/algorithm and LFO-sensitivity bytes.
//! Nothing here validates ranges; out-of-range bit patterns are simply written
//! to the chip as-is.

/// Number of operators in a channel.
pub const OPERATOR_COUNT: usize = 4;

/// Number of register bytes describing one operator.
pub const OPERATOR_REGISTER_COUNT: usize = 7;

/// One FM operator, as its seven register bytes.
///
/// Field order matches the register write order used by the programmer
/// (`0x30`, `0x40`, ..., `0x90` bases).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Operator {
    /// Detune (bits 4-6) and frequency multiplier (bits 0-3).
    pub detune_multiple: u8,
    /// Total level (attenuation), bits 0-6.
    pub total_level: u8,
    /// Rate scaling (bits 6-7) and attack rate (bits 0-4).
    pub rate_scale_attack: u8,
    /// Amplitude-modulation enable (bit 7) and decay-1 rate (bits 0-4).
    pub am_decay1: u8,
    /// Decay-2 (sustain) rate, bits 0-4.
    pub decay2: u8,
    /// Sustain level (bits 4-7) and release rate (bits 0-3).
    pub sustain_release: u8,
    /// SSG-EG mode, bits 0-3.
    pub ssg_eg: u8,
}

impl Operator {
    /// Build an operator from its seven register bytes in write order.
    pub const fn from_registers(regs: [u8; OPERATOR_REGISTER_COUNT]) -> Self {
        Self {
            detune_multiple: regs[0],
            total_level: regs[1],
            rate_scale_attack: regs[2],
            am_decay1: regs[3],
            decay2: regs[4],
            sustain_release: regs[5],
            ssg_eg: regs[6],
        }
    }

    /// The seven register bytes in write order.
    pub const fn registers(&self) -> [u8; OPERATOR_REGISTER_COUNT] {
        [
            self.detune_multiple,
            self.total_level,
            self.rate_scale_attack,
            self.am_decay1,
            self.decay2,
            self.sustain_release,
            self.ssg_eg,
        ]
    }
}

/// A 4-operator FM instrument and its measured sounding durations.
///
/// `key_on_ms` and `key_off_ms` are outputs: the measurement engine overwrites
/// them and leaves every other field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Instrument {
    /// Operators op0..op3, always programmed in this order.
    pub operators: [Operator; OPERATOR_COUNT],
    /// Feedback (bits 3-5) and algorithm (bits 0-2).
    pub fb_alg: u8,
    /// Stereo/AMS/FMS byte as stored in the bank.
    ///
    /// The measurer always programs a fixed `0xC0` instead, so that LFO
    /// sensitivity cannot colour the measurement.
    pub lfo_sens: u8,
    /// Signed semitone offset added to the measured note.
    pub fine_tune: i8,
    /// Note number used for measurement, remapped at the range ends.
    pub percussion_note: u8,
    /// Time for a held note to decay to near-silence, in milliseconds.
    pub key_on_ms: u16,
    /// Time for the release tail to decay to near-silence, in milliseconds.
    pub key_off_ms: u16,
}

impl Instrument {
    /// Algorithm number (0-7).
    pub fn algorithm(&self) -> u8 {
        self.fb_alg & 0x07
    }

    /// Operator-0 self-feedback amount (0-7).
    pub fn feedback(&self) -> u8 {
        (self.fb_alg >> 3) & 0x07
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_register_order_roundtrip() {
        let regs = [0x71, 0x23, 0x5F, 0x85, 0x02, 0xA7, 0x08];
        let op = Operator::from_registers(regs);
        assert_eq!(op.detune_multiple, 0x71);
        assert_eq!(op.ssg_eg, 0x08);
        assert_eq!(op.registers(), regs);
    }

    #[test]
    fn fb_alg_split() {
        let ins = Instrument {
            fb_alg: 0b0011_0101,
            ..Default::default()
        };
        assert_eq!(ins.algorithm(), 5);
        assert_eq!(ins.feedback(), 6);
    }
}
