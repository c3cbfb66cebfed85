//! Register programming for one FM channel.
//!
//! Translates an [`Instrument`] into the exact write sequence an OPN2-family
//! chip needs to play it, and encodes note pitch as the chip's block/F-number
//! pair.
//!
//! # Write order
//!
//! 1. LFO off, channel-3 mode normal
//! 2. key-off on all six channels
//! 3. DAC off
//! 4. 28 operator writes (op0..op3, seven registers each)
//! 5. feedback/algorithm, then a fixed pan/AMS/FMS byte
//!
//! Frequency and key-on are separate steps so the caller decides when the
//! note starts.

use crate::chip::{FmChip, Port};
use crate::patch::Instrument;

/// Global register: LFO enable/frequency.
pub const REG_LFO: u8 = 0x22;
/// Global register: channel-3 mode and timer control.
pub const REG_CH3_MODE: u8 = 0x27;
/// Global register: key on/off.
pub const REG_KEY_ON: u8 = 0x28;
/// Global register: DAC enable.
pub const REG_DAC_ENABLE: u8 = 0x2B;

/// Per-operator register bases in write order.
pub const OPERATOR_REGISTER_BASES: [u8; 7] = [0x30, 0x40, 0x50, 0x60, 0x70, 0x80, 0x90];

/// Channel register base: F-number low byte.
pub const REG_FNUM_LOW: u8 = 0xA0;
/// Channel register base: block and F-number high bits.
pub const REG_FNUM_HIGH: u8 = 0xA4;
/// Channel register base: feedback/algorithm.
pub const REG_FB_ALG: u8 = 0xB0;
/// Channel register base: stereo output, AMS and FMS.
pub const REG_PAN_AMS_FMS: u8 = 0xB4;

/// Both outputs enabled, no LFO sensitivity.
pub const PAN_BOTH_NO_LFO: u8 = 0xC0;

/// Key-on value for all four operators; OR'd with the channel slot.
pub const KEY_ON_ALL_OPERATORS: u8 = 0xF0;

/// Frequency ceiling before block encoding.
pub const MAX_ENCODED_HZ: f64 = 262143.0;

/// Key-off slots for the six channels (slot 3 is unused by the chip).
const ALL_CHANNEL_SLOTS: [u8; 6] = [0x00, 0x01, 0x02, 0x04, 0x05, 0x06];

/// Number of addressable FM channels.
pub const CHANNEL_COUNT: u8 = 6;

/// Where a channel's registers live on the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAddress {
    /// Port holding the channel's registers.
    pub port: Port,
    /// Offset added to per-channel register bases (0-2).
    pub offset: u8,
    /// Channel code used in the key-on register.
    pub slot: u8,
}

impl ChannelAddress {
    /// Resolve a channel index. Indices past 5 wrap around.
    pub fn new(channel: u8) -> Self {
        let channel = channel % CHANNEL_COUNT;
        let (port, slot) = if channel <= 2 {
            (Port::Primary, channel)
        } else {
            (Port::Secondary, channel + 1)
        };
        Self {
            port,
            offset: channel % 3,
            slot,
        }
    }
}

/// Note number actually played for a percussion note value.
///
/// Values below 20 and at or above 128 are folded back into the audible range.
pub fn measurement_note(percussion_note: u8) -> i32 {
    let n = i32::from(percussion_note);
    if n < 20 {
        44 + n
    } else if n >= 128 {
        44 + 128 - n
    } else {
        n
    }
}

/// Block/F-number encoding of a note frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyEncoding {
    /// Frequency in chip units before clamping and block reduction.
    pub hz: f64,
    /// Packed register value: block in bits 11-13, F-number in bits 0-10.
    pub value: u16,
    /// True when `hz` was out of range and got clamped.
    pub clamped: bool,
}

impl FrequencyEncoding {
    /// Encode a note (plus semitone fine-tune) as block/F-number.
    ///
    /// Out-of-range frequencies are clamped to [`MAX_ENCODED_HZ`] and reported
    /// with a warning; the note is still playable.
    pub fn for_note(note: i32, fine_tune: i8) -> Self {
        let hz = 321.88557 * (0.057762265 * f64::from(note + i32::from(fine_tune))).exp();
        let mut scaled = hz;
        let mut clamped = false;
        if !(0.0..=MAX_ENCODED_HZ).contains(&scaled) {
            tracing::warn!(
                note,
                fine_tune,
                hz,
                "note and fine-tune produce an out-of-range frequency, clamping"
            );
            scaled = MAX_ENCODED_HZ;
            clamped = true;
        }

        let mut value: u16 = 0;
        while scaled >= 2047.5 {
            scaled /= 2.0;
            value = value.wrapping_add(0x800);
        }
        value = value.wrapping_add((scaled + 0.5) as u16);

        Self { hz, value, clamped }
    }

    /// Octave block (0-7).
    pub fn block(&self) -> u8 {
        ((self.value >> 11) & 0x07) as u8
    }

    /// 11-bit F-number.
    pub fn fnum(&self) -> u16 {
        self.value & 0x07FF
    }

    /// Byte written to the `0xA4` register.
    pub fn high_byte(&self) -> u8 {
        (self.value >> 8) as u8
    }

    /// Byte written to the `0xA0` register.
    pub fn low_byte(&self) -> u8 {
        (self.value & 0xFF) as u8
    }
}

/// Silence the chip and load `instrument` into `channel`.
///
/// Does not set pitch or key the note on.
pub fn program_channel<C: FmChip + ?Sized>(chip: &mut C, instrument: &Instrument, channel: u8) {
    chip.write_register(Port::Primary, REG_LFO, 0x00);
    chip.write_register(Port::Primary, REG_CH3_MODE, 0x00);

    for slot in ALL_CHANNEL_SLOTS {
        chip.write_register(Port::Primary, REG_KEY_ON, slot);
    }

    chip.write_register(Port::Primary, REG_DAC_ENABLE, 0x00);

    let addr = ChannelAddress::new(channel);
    for (op, operator) in (0u8..).zip(instrument.operators.iter()) {
        for (base, value) in OPERATOR_REGISTER_BASES.iter().zip(operator.registers()) {
            chip.write_register(addr.port, base + op * 4 + addr.offset, value);
        }
    }

    chip.write_register(addr.port, REG_FB_ALG + addr.offset, instrument.fb_alg);
    chip.write_register(addr.port, REG_PAN_AMS_FMS + addr.offset, PAN_BOTH_NO_LFO);
}

/// Latch a frequency into `channel` (high byte first, as the chip requires).
pub fn set_frequency<C: FmChip + ?Sized>(chip: &mut C, channel: u8, freq: &FrequencyEncoding) {
    let addr = ChannelAddress::new(channel);
    chip.write_register(addr.port, REG_FNUM_HIGH + addr.offset, freq.high_byte());
    chip.write_register(addr.port, REG_FNUM_LOW + addr.offset, freq.low_byte());
}

/// Key on all four operators of `channel`.
pub fn key_on<C: FmChip + ?Sized>(chip: &mut C, channel: u8) {
    let addr = ChannelAddress::new(channel);
    chip.write_register(Port::Primary, REG_KEY_ON, KEY_ON_ALL_OPERATORS | addr.slot);
}

/// Key off all four operators of `channel`.
pub fn key_off<C: FmChip + ?Sized>(chip: &mut C, channel: u8) {
    let addr = ChannelAddress::new(channel);
    chip.write_register(Port::Primary, REG_KEY_ON, addr.slot);
}

/// Program the channel, latch the instrument's measurement note and key it on.
///
/// Returns the frequency encoding that was written.
pub fn start_note<C: FmChip + ?Sized>(
    chip: &mut C,
    instrument: &Instrument,
    channel: u8,
) -> FrequencyEncoding {
    program_channel(chip, instrument, channel);
    let note = measurement_note(instrument.percussion_note);
    let freq = FrequencyEncoding::for_note(note, instrument.fine_tune);
    set_frequency(chip, channel, &freq);
    key_on(chip, channel);
    freq
}
