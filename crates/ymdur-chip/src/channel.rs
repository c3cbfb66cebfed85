//! Four-operator FM channel.
//!
//! Operators are stored in register order (S1, S3, S2, S4), which is also
//! the order [`ymdur_core::Instrument::operators`] uses. Routing below is
//! written in slot terms and mapped through [`S1`]..[`S4`].

use core::f64::consts::TAU;

use crate::envelope::{
    EgRates, EgStage, EnvelopeGenerator, MAX_ATTENUATION, effective_rate, sustain_attenuation,
};

/// Register index of slot 1.
pub const S1: usize = 0;
/// Register index of slot 2.
pub const S2: usize = 2;
/// Register index of slot 3.
pub const S3: usize = 1;
/// Register index of slot 4.
pub const S4: usize = 3;

/// Full-scale operator output (14-bit signed).
pub const OPERATOR_FULL_SCALE: f64 = 8191.0;

/// Phase offset, in sine cycles, produced by a full-scale modulator.
const MODULATION_CYCLES: f64 = 4.0;

/// Attenuation units per total-level step (0.75 dB).
const TL_UNITS: f64 = 8.0;

/// One operator: raw registers plus phase and envelope state.
#[derive(Clone, Copy, Debug, Default)]
pub struct FmOperator {
    dt_mul: u8,
    tl: u8,
    ks_ar: u8,
    am_d1r: u8,
    d2r: u8,
    sl_rr: u8,
    phase: f64,
    eg: EnvelopeGenerator,
    rates: EgRates,
}

impl FmOperator {
    /// Store a per-operator register. `base` is the register group (0x30-0x90).
    pub fn write(&mut self, base: u8, value: u8) {
        match base {
            0x30 => self.dt_mul = value,
            0x40 => self.tl = value & 0x7F,
            0x50 => self.ks_ar = value,
            0x60 => self.am_d1r = value,
            0x70 => self.d2r = value,
            0x80 => self.sl_rr = value,
            // 0x90: SSG-EG, not modelled
            _ => {}
        }
    }

    /// Frequency multiplier; 0 means one half.
    pub fn multiplier(&self) -> f64 {
        match self.dt_mul & 0x0F {
            0 => 0.5,
            m => f64::from(m),
        }
    }

    /// Envelope state.
    pub fn envelope(&self) -> &EnvelopeGenerator {
        &self.eg
    }

    /// Recompute key-scaled rates for a channel key code.
    fn update_rates(&mut self, key_code: u8) {
        let ks = key_code >> (3 - (self.ks_ar >> 6));
        self.rates = EgRates {
            attack: effective_rate(self.ks_ar & 0x1F, ks),
            decay1: effective_rate(self.am_d1r & 0x1F, ks),
            decay2: effective_rate(self.d2r & 0x1F, ks),
            release: effective_rate((self.sl_rr & 0x0F) * 2 + 1, ks),
            sustain_level: sustain_attenuation(self.sl_rr >> 4),
        };
    }

    fn key_on(&mut self, key_code: u8) {
        self.update_rates(key_code);
        self.phase = 0.0;
        self.eg.key_on(&self.rates);
    }

    fn key_off(&mut self) {
        self.eg.key_off();
    }

    /// Output for a phase modulation given in cycles, truncated to 14 bits.
    fn output(&self, modulation: f64) -> f64 {
        let units = self.eg.attenuation() + f64::from(self.tl) * TL_UNITS;
        if units >= MAX_ATTENUATION {
            return 0.0;
        }
        let gain = libm::exp2(-units / 64.0);
        (libm::sin(TAU * (self.phase + modulation)) * gain * OPERATOR_FULL_SCALE).trunc()
    }

    fn advance(&mut self, increment: f64, eg_ticks: f64) {
        self.phase = (self.phase + increment * self.multiplier()).fract();
        self.eg.advance(&self.rates, eg_ticks);
    }
}

/// One FM channel.
#[derive(Clone, Copy, Debug)]
pub struct Channel {
    operators: [FmOperator; 4],
    fnum: u16,
    block: u8,
    fb_alg: u8,
    left: bool,
    right: bool,
    feedback: [f64; 2],
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            operators: [FmOperator::default(); 4],
            fnum: 0,
            block: 0,
            fb_alg: 0,
            left: true,
            right: true,
            feedback: [0.0; 2],
        }
    }
}

impl Channel {
    /// Operator at register index `index` (0-3).
    pub fn operator(&self, index: usize) -> &FmOperator {
        &self.operators[index]
    }

    /// Write a per-operator register.
    pub fn write_operator(&mut self, index: usize, base: u8, value: u8) {
        self.operators[index].write(base, value);
    }

    /// Latch block and F-number.
    pub fn set_frequency(&mut self, block: u8, fnum: u16) {
        self.block = block & 0x07;
        self.fnum = fnum & 0x07FF;
    }

    /// Block and F-number currently latched.
    pub fn frequency(&self) -> (u8, u16) {
        (self.block, self.fnum)
    }

    /// Feedback/algorithm register.
    pub fn set_fb_alg(&mut self, value: u8) {
        self.fb_alg = value & 0x3F;
    }

    /// Pan/sensitivity register; only the pan bits are used.
    pub fn set_pan(&mut self, value: u8) {
        self.left = value & 0x80 != 0;
        self.right = value & 0x40 != 0;
    }

    /// Output enables as (left, right).
    pub fn pan(&self) -> (bool, bool) {
        (self.left, self.right)
    }

    /// Algorithm (0-7).
    pub fn algorithm(&self) -> u8 {
        self.fb_alg & 0x07
    }

    /// Key code used for rate scaling: block plus the top F-number bits.
    pub fn key_code(&self) -> u8 {
        let f11 = (self.fnum >> 10) & 1;
        let f10 = (self.fnum >> 9) & 1;
        let f9 = (self.fnum >> 8) & 1;
        let f8 = (self.fnum >> 7) & 1;
        let n3 = (f11 & (f10 | f9 | f8)) | ((f11 ^ 1) & f10 & f9 & f8);
        (self.block << 2) | ((f11 as u8) << 1) | n3 as u8
    }

    /// Apply a key-on mask in slot bits (bit 0 = S1 .. bit 3 = S4).
    ///
    /// Operators already in the requested state are left alone.
    pub fn set_keys(&mut self, mask: u8) {
        let key_code = self.key_code();
        for (bit, index) in [S1, S2, S3, S4].into_iter().enumerate() {
            let op = &mut self.operators[index];
            let keyed = !matches!(op.eg.stage(), EgStage::Release | EgStage::Off);
            match (mask & (1 << bit) != 0, keyed) {
                (true, false) => op.key_on(key_code),
                (false, true) => op.key_off(),
                _ => {}
            }
        }
    }

    /// True when every operator is idle.
    pub fn is_idle(&self) -> bool {
        self.operators.iter().all(|op| op.eg.is_off())
    }

    /// Produce one sample at 14-bit scale and advance state.
    ///
    /// `base_increment` is the phase increment per sample at multiplier 1.
    pub fn tick(&mut self, base_increment: f64, eg_ticks: f64) -> f64 {
        let fb_level = (self.fb_alg >> 3) & 0x07;
        let self_mod = if fb_level == 0 {
            0.0
        } else {
            (self.feedback[0] + self.feedback[1]) / OPERATOR_FULL_SCALE
                * libm::exp2(f64::from(fb_level) - 7.0)
        };

        let ops = &self.operators;
        let m = |v: f64| v / OPERATOR_FULL_SCALE * MODULATION_CYCLES;

        let s1 = ops[S1].output(self_mod);
        let out = match self.algorithm() {
            0 => {
                let s2 = ops[S2].output(m(s1));
                let s3 = ops[S3].output(m(s2));
                ops[S4].output(m(s3))
            }
            1 => {
                let s2 = ops[S2].output(0.0);
                let s3 = ops[S3].output(m(s1 + s2));
                ops[S4].output(m(s3))
            }
            2 => {
                let s2 = ops[S2].output(0.0);
                let s3 = ops[S3].output(m(s2));
                ops[S4].output(m(s1 + s3))
            }
            3 => {
                let s2 = ops[S2].output(m(s1));
                let s3 = ops[S3].output(0.0);
                ops[S4].output(m(s2 + s3))
            }
            4 => {
                let s2 = ops[S2].output(m(s1));
                let s3 = ops[S3].output(0.0);
                s2 + ops[S4].output(m(s3))
            }
            5 => {
                let s2 = ops[S2].output(m(s1));
                let s3 = ops[S3].output(m(s1));
                s2 + s3 + ops[S4].output(m(s1))
            }
            6 => {
                let s2 = ops[S2].output(m(s1));
                s2 + ops[S3].output(0.0) + ops[S4].output(0.0)
            }
            _ => s1 + ops[S2].output(0.0) + ops[S3].output(0.0) + ops[S4].output(0.0),
        };

        self.feedback = [self.feedback[1], s1];
        for op in &mut self.operators {
            op.advance(base_increment, eg_ticks);
        }

        out.clamp(-OPERATOR_FULL_SCALE, OPERATOR_FULL_SCALE)
    }
}
