//! Operator envelope generator.
//!
//! Works on the chip's 10-bit attenuation scale (0 = full level,
//! 1023 ≈ 96 dB down, 64 units ≈ 6 dB) with the OPN rate model: an effective
//! rate 0-63 selects the average attenuation step per envelope tick.
//! Steps are applied fractionally per output sample rather than on the
//! chip's tick grid.

/// Attenuation at which an operator is inaudible.
pub const MAX_ATTENUATION: f64 = 1023.0;

/// Envelope stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EgStage {
    /// Rising toward full level.
    Attack,
    /// Falling toward the sustain level.
    Decay1,
    /// Falling from the sustain level while the key is held.
    Decay2,
    /// Falling after key-off.
    Release,
    /// Silent and idle.
    #[default]
    Off,
}

/// Effective rates for each stage, already key-scaled (0-63).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EgRates {
    /// Attack rate.
    pub attack: u8,
    /// Decay-1 rate.
    pub decay1: u8,
    /// Decay-2 rate.
    pub decay2: u8,
    /// Release rate.
    pub release: u8,
    /// Sustain level in attenuation units.
    pub sustain_level: u16,
}

/// Scale a raw 5-bit rate by key scaling. Rate 0 stays 0.
pub fn effective_rate(raw: u8, key_scale: u8) -> u8 {
    if raw == 0 {
        0
    } else {
        (2 * raw + key_scale).min(63)
    }
}

/// Average attenuation change per envelope tick for an effective rate.
pub fn average_step(rate: u8) -> f64 {
    if rate == 0 {
        return 0.0;
    }
    if rate >= 60 {
        return 8.0;
    }
    let fraction = f64::from(4 + (rate & 3)) / 8.0;
    fraction * libm::exp2(f64::from(rate >> 2) - 11.0)
}

/// Sustain level register nibble to attenuation units (15 means 93 dB).
pub fn sustain_attenuation(sl: u8) -> u16 {
    let sl = u16::from(sl & 0x0F);
    if sl == 15 { 31 * 32 } else { sl * 32 }
}

/// One operator's envelope state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeGenerator {
    stage: EgStage,
    attenuation: f64,
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self {
            stage: EgStage::Off,
            attenuation: MAX_ATTENUATION,
        }
    }
}

impl EnvelopeGenerator {
    /// Current stage.
    pub fn stage(&self) -> EgStage {
        self.stage
    }

    /// Current attenuation (0-1023).
    pub fn attenuation(&self) -> f64 {
        self.attenuation
    }

    /// True when the operator produces no output.
    pub fn is_off(&self) -> bool {
        self.stage == EgStage::Off
    }

    /// Start the attack. Rates of 62 and above jump straight to full level.
    pub fn key_on(&mut self, rates: &EgRates) {
        if rates.attack >= 62 {
            self.attenuation = 0.0;
            self.stage = EgStage::Decay1;
        } else {
            self.stage = EgStage::Attack;
        }
    }

    /// Enter the release stage.
    pub fn key_off(&mut self) {
        if self.stage != EgStage::Off {
            self.stage = EgStage::Release;
        }
    }

    /// Advance by `ticks` envelope ticks (fractional).
    pub fn advance(&mut self, rates: &EgRates, ticks: f64) {
        match self.stage {
            EgStage::Off => {}

            EgStage::Attack => {
                // Exponential approach: each tick removes (att + 1) * step / 16.
                let step = (average_step(rates.attack) * ticks / 16.0).min(1.0);
                self.attenuation -= (self.attenuation + 1.0) * step;
                if self.attenuation <= 0.0 {
                    self.attenuation = 0.0;
                    self.stage = EgStage::Decay1;
                }
            }

            EgStage::Decay1 => {
                let sustain = f64::from(rates.sustain_level);
                if self.attenuation >= sustain {
                    self.stage = EgStage::Decay2;
                } else {
                    self.attenuation += average_step(rates.decay1) * ticks;
                }
            }

            EgStage::Decay2 => {
                self.attenuation =
                    (self.attenuation + average_step(rates.decay2) * ticks).min(MAX_ATTENUATION);
            }

            EgStage::Release => {
                self.attenuation += average_step(rates.release) * ticks;
                if self.attenuation >= MAX_ATTENUATION {
                    self.attenuation = MAX_ATTENUATION;
                    self.stage = EgStage::Off;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates(attack: u8, decay1: u8, decay2: u8, release: u8, sl: u8) -> EgRates {
        EgRates {
            attack,
            decay1,
            decay2,
            release,
            sustain_level: sustain_attenuation(sl),
        }
    }

    #[test]
    fn rate_table_endpoints() {
        assert_eq!(average_step(0), 0.0);
        assert_eq!(average_step(44), 0.5);
        assert_eq!(average_step(48), 1.0);
        assert_eq!(average_step(59), 7.0);
        assert_eq!(average_step(60), 8.0);
        assert_eq!(average_step(63), 8.0);
    }

    #[test]
    fn effective_rate_scaling() {
        assert_eq!(effective_rate(0, 7), 0);
        assert_eq!(effective_rate(31, 0), 62);
        assert_eq!(effective_rate(31, 3), 63);
        assert_eq!(effective_rate(10, 5), 25);
    }

    #[test]
    fn sustain_levels() {
        assert_eq!(sustain_attenuation(0), 0);
        assert_eq!(sustain_attenuation(1), 32);
        assert_eq!(sustain_attenuation(15), 992);
    }

    #[test]
    fn instant_attack_reaches_full_level() {
        let r = rates(62, 0, 0, 10, 0);
        let mut eg = EnvelopeGenerator::default();
        eg.key_on(&r);
        assert_eq!(eg.attenuation(), 0.0);
        assert_eq!(eg.stage(), EgStage::Decay1);
    }

    #[test]
    fn slow_attack_rises_gradually() {
        let r = rates(40, 0, 0, 10, 0);
        let mut eg = EnvelopeGenerator::default();
        eg.key_on(&r);
        eg.advance(&r, 10.0);
        assert_eq!(eg.stage(), EgStage::Attack);
        assert!(eg.attenuation() < MAX_ATTENUATION);
        assert!(eg.attenuation() > 0.0);
    }

    #[test]
    fn decay_moves_to_sustain_then_holds_without_decay2() {
        let r = rates(62, 48, 0, 10, 4);
        let mut eg = EnvelopeGenerator::default();
        eg.key_on(&r);
        for _ in 0..1000 {
            eg.advance(&r, 1.0);
        }
        assert_eq!(eg.stage(), EgStage::Decay2);
        let held = eg.attenuation();
        assert!(held >= 128.0 && held < 130.0, "held at {held}");
        eg.advance(&r, 1000.0);
        assert_eq!(eg.attenuation(), held);
    }

    #[test]
    fn release_ends_in_off() {
        let r = rates(62, 0, 0, 60, 0);
        let mut eg = EnvelopeGenerator::default();
        eg.key_on(&r);
        eg.key_off();
        assert_eq!(eg.stage(), EgStage::Release);
        for _ in 0..200 {
            eg.advance(&r, 1.0);
        }
        assert!(eg.is_off());
        assert_eq!(eg.attenuation(), MAX_ATTENUATION);
    }

    #[test]
    fn key_off_while_idle_stays_off() {
        let mut eg = EnvelopeGenerator::default();
        eg.key_off();
        assert!(eg.is_off());
    }
}
