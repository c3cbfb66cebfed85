//! Behavioral register model of an OPN2-style chip.

use ymdur_core::{FmChip, Port};

use crate::channel::Channel;

/// Master clock of an NTSC Mega Drive OPN2, in Hz.
pub const DEFAULT_CLOCK: f64 = 7_670_454.0;

/// Master clock cycles per FM sample.
const CLOCK_DIVIDER: f64 = 144.0;

/// FM samples per envelope tick.
const EG_DIVIDER: f64 = 3.0;

/// Gain from 14-bit channel output to the 16-bit sample range.
const OUTPUT_GAIN: f64 = 4.0;

const KEY_ON_REGISTER: u8 = 0x28;

const CHANNEL_COUNT: usize = 6;

/// Pitch in Hz of a block/F-number pair for a chip clocked at `clock`.
pub fn pitch_hz(clock: f64, block: u8, fnum: u16) -> f64 {
    f64::from(fnum & 0x07FF) * f64::from(1u32 << (block & 0x07)) * clock
        / CLOCK_DIVIDER
        / f64::from(1u32 << 21)
}

/// Behavioral six-channel FM chip.
///
/// Decodes the register map [`ymdur_core::program`] writes and renders
/// interleaved stereo at any sample rate. Pitch, operator routing, total
/// level and the four-stage envelope are modelled; detune, SSG-EG, LFO, DAC
/// and the chip's fixed-point quirks are not.
///
/// # Example
///
/// ```
/// use ymdur_chip::ModelChip;
/// use ymdur_core::{Instrument, MeasureConfig, measure_with_chip};
///
/// let config = MeasureConfig {
///     max_key_on_secs: 0.2,
///     min_key_on_secs: 0.1,
///     max_key_off_secs: 0.2,
///     ..Default::default()
/// };
/// // All-zero patch: attack rate 0 never leaves full attenuation.
/// let result = measure_with_chip(ModelChip::new(), &Instrument::default(), &config);
/// assert!(result.silent);
/// ```
#[derive(Clone, Debug)]
pub struct ModelChip {
    clock: f64,
    sample_rate: u32,
    channels: [Channel; CHANNEL_COUNT],
    fnum_latch: [[u8; 3]; 2],
}

impl Default for ModelChip {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelChip {
    /// Create a chip clocked at [`DEFAULT_CLOCK`], rendering at 44.1 kHz.
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_CLOCK)
    }

    /// Create a chip with a custom master clock.
    pub fn with_clock(clock: f64) -> Self {
        Self {
            clock,
            sample_rate: 44_100,
            channels: [Channel::default(); CHANNEL_COUNT],
            fnum_latch: [[0; 3]; 2],
        }
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel state. Indices past 5 wrap around.
    pub fn channel(&self, index: usize) -> &Channel {
        &self.channels[index % CHANNEL_COUNT]
    }

    /// Pitch of a channel in Hz at multiplier 1. Indices past 5 wrap around.
    pub fn channel_hz(&self, index: usize) -> f64 {
        let (block, fnum) = self.channel(index).frequency();
        pitch_hz(self.clock, block, fnum)
    }

    fn write_key_on(&mut self, value: u8) {
        let index = match value & 0x07 {
            code @ 0..=2 => usize::from(code),
            code @ 4..=6 => usize::from(code) - 1,
            _ => {
                tracing::trace!(value, "key-on write for a nonexistent channel ignored");
                return;
            }
        };
        self.channels[index].set_keys(value >> 4);
    }

    fn write_channel(&mut self, port: usize, address: u8, value: u8) {
        let offset = usize::from(address & 0x03);
        if offset == 3 {
            return;
        }
        let channel = &mut self.channels[port * 3 + offset];

        match address {
            0x30..=0x9F => {
                let index = usize::from((address >> 2) & 0x03);
                channel.write_operator(index, address & 0xF0, value);
            }
            0xA0..=0xA2 => {
                let latch = self.fnum_latch[port][offset];
                let fnum = (u16::from(latch & 0x07) << 8) | u16::from(value);
                channel.set_frequency((latch >> 3) & 0x07, fnum);
            }
            0xA4..=0xA6 => self.fnum_latch[port][offset] = value,
            0xB0..=0xB2 => channel.set_fb_alg(value),
            0xB4..=0xB6 => channel.set_pan(value),
            _ => {}
        }
    }
}

impl FmChip for ModelChip {
    fn set_sample_rate(&mut self, hz: u32) {
        self.sample_rate = hz.max(1);
    }

    fn write_register(&mut self, port: Port, address: u8, value: u8) {
        match (port, address) {
            (Port::Primary, KEY_ON_REGISTER) => self.write_key_on(value),
            // LFO, timers, channel 3 mode, DAC
            (_, 0x00..=0x2F) => {}
            (port, address) => self.write_channel(port.index(), address, value),
        }
    }

    fn render(&mut self, out: &mut [i16]) {
        let rate = f64::from(self.sample_rate);
        let eg_ticks = self.clock / CLOCK_DIVIDER / EG_DIVIDER / rate;
        let increments: [f64; CHANNEL_COUNT] = core::array::from_fn(|i| self.channel_hz(i) / rate);

        for frame in out.chunks_exact_mut(2) {
            let (mut left, mut right) = (0.0, 0.0);
            for (channel, increment) in self.channels.iter_mut().zip(increments) {
                if channel.is_idle() {
                    continue;
                }
                let sample = channel.tick(increment, eg_ticks);
                let (l, r) = channel.pan();
                if l {
                    left += sample;
                }
                if r {
                    right += sample;
                }
            }
            frame[0] = to_sample(left);
            frame[1] = to_sample(right);
        }
    }
}

fn to_sample(mix: f64) -> i16 {
    (mix * OUTPUT_GAIN).clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}
