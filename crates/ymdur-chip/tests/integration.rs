//! Integration tests for ymdur-chip.
//!
//! Real register programs are measured through the core engine with the
//! behavioral chip, so envelope rates show up as durations.

use ymdur_chip::ModelChip;
use ymdur_core::{BatchRunner, Instrument, MeasureConfig, Measurer, Operator, measure_with_chip};

fn fast_config() -> MeasureConfig {
    MeasureConfig {
        sample_rate: 22_050,
        slices_per_second: 100,
        max_key_on_secs: 2.0,
        min_key_on_secs: 0.2,
        max_key_off_secs: 2.0,
        ..Default::default()
    }
}

/// Single carrier on slot 1, algorithm 7, instant attack, held at full level.
fn organ(sl_rr: u8, am_d1r: u8) -> Instrument {
    let carrier = Operator::from_registers([0x01, 0x00, 0x1F, am_d1r, 0x00, sl_rr, 0x00]);
    let muted = Operator {
        total_level: 127,
        ..carrier
    };
    Instrument {
        operators: [carrier, muted, muted, muted],
        fb_alg: 0x07,
        percussion_note: 60,
        ..Default::default()
    }
}

#[test]
fn held_organ_sustains_for_the_whole_window() {
    let result = measure_with_chip(ModelChip::new(), &organ(0x0F, 0x00), &fast_config());

    assert!(!result.silent);
    assert_eq!(result.quarter_life_index, 200);
    assert_eq!(result.key_on_ms, 2000);
    assert!(result.key_off_ms <= 30, "key_off_ms {}", result.key_off_ms);
}

#[test]
fn release_rate_sets_key_off_duration() {
    let config = fast_config();
    let fast = measure_with_chip(ModelChip::new(), &organ(0x0F, 0x00), &config);
    let slow = measure_with_chip(ModelChip::new(), &organ(0x07, 0x00), &config);

    assert_eq!(fast.key_on_ms, slow.key_on_ms);
    assert!(
        (300..=800).contains(&slow.key_off_ms),
        "slow key_off_ms {}",
        slow.key_off_ms
    );
    assert!(slow.key_off_ms > 5 * fast.key_off_ms.max(1));
}

#[test]
fn decay_while_held_ends_key_on_early() {
    // Sustain level 15 (93 dB) with decay-1 rate 14: fades out while held.
    let result = measure_with_chip(ModelChip::new(), &organ(0xF7, 0x0E), &fast_config());

    assert!(!result.silent);
    assert!(
        (500..=900).contains(&result.key_on_ms),
        "key_on_ms {}",
        result.key_on_ms
    );
    // Already silent at key-off: release borrows the key-on point.
    assert_eq!(result.keyoff_out_index, result.quarter_life_index);
    assert_eq!(result.key_off_ms, result.key_on_ms);
}

#[test]
fn full_total_level_is_silent() {
    let mut ins = organ(0x0F, 0x00);
    for op in &mut ins.operators {
        op.total_level = 127;
    }
    let result = measure_with_chip(ModelChip::new(), &ins, &fast_config());
    assert!(result.silent);
}

#[test]
fn every_algorithm_reaches_the_output() {
    let config = MeasureConfig {
        max_key_on_secs: 0.3,
        min_key_on_secs: 0.1,
        max_key_off_secs: 0.1,
        ..fast_config()
    };
    for algorithm in 0..8 {
        let mut ins = organ(0x0F, 0x00);
        for op in &mut ins.operators {
            op.total_level = 0;
        }
        ins.fb_alg = 0x30 | algorithm;
        let result = measure_with_chip(ModelChip::new(), &ins, &config);
        assert!(!result.silent, "algorithm {algorithm} silent");
    }
}

#[test]
fn measurement_with_model_chip_is_idempotent() {
    let measurer = Measurer::new(ModelChip::new, fast_config());
    let mut a = organ(0x27, 0x0A);
    let mut b = a;

    let first = measurer.measure(&mut a);
    let second = measurer.measure(&mut b);
    assert_eq!(first, second);
    assert_eq!(a, b);
    assert_eq!(measurer.measure(&mut a), first);
}

#[test]
fn batch_matches_single_measurements() {
    let config = fast_config();
    let patches = [organ(0x0F, 0x00), organ(0x07, 0x00), organ(0xF7, 0x0E)];

    let expected: Vec<Instrument> = patches
        .iter()
        .map(|p| {
            let mut ins = *p;
            Measurer::new(ModelChip::new, config.clone()).measure(&mut ins);
            ins
        })
        .collect();

    let mut bank = patches.to_vec();
    let runner = BatchRunner::new(Measurer::new(ModelChip::new, config)).with_workers(3);
    assert!(runner.measure_batch(&mut bank));
    assert_eq!(bank, expected);
}
