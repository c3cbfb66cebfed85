//! Integration tests for ymdur-config.
//!
//! These tests cover file round-trips and the path from bank entries through
//! the measurement engine back into the bank.

use tempfile::TempDir;
use ymdur_config::{Bank, ConfigError, InstrumentConfig, InstrumentKind, MeasureSettings};
use ymdur_core::{BatchRunner, Instrument, Measurer, Operator, RegisterLog};

fn sample_bank() -> Bank {
    let carrier = Operator::from_registers([0x01, 0x00, 0x1F, 0x00, 0x00, 0x0F, 0x00]);
    let organ = Instrument {
        operators: [carrier; 4],
        fb_alg: 0x07,
        ..Default::default()
    };
    let kick = Instrument {
        percussion_note: 36,
        fine_tune: 2,
        ..organ
    };
    Bank {
        name: Some("round trip".to_string()),
        melodic: vec![
            InstrumentConfig::from_instrument("Organ", &organ, false),
            InstrumentConfig::from_instrument("Organ 2", &organ, false),
        ],
        percussion: vec![InstrumentConfig::from_instrument("Kick", &kick, false)],
    }
}

#[test]
fn bank_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("bank.toml");

    let bank = sample_bank();
    bank.save(&path).expect("save should create parent directories");
    let loaded = Bank::load(&path).unwrap();
    assert_eq!(loaded, bank);
    assert_eq!(
        loaded.get(InstrumentKind::Percussion, 0).unwrap().name,
        "Kick"
    );
}

#[test]
fn settings_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("measure.toml");

    let settings = MeasureSettings {
        sample_rate: 22050,
        max_key_on_secs: 2.0,
        min_key_on_secs: 0.5,
        workers: Some(3),
        ..Default::default()
    };
    settings.save(&path).unwrap();
    assert_eq!(MeasureSettings::load(&path).unwrap(), settings);
}

#[test]
fn invalid_settings_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("measure.toml");
    std::fs::write(&path, "decay_threshold = 2.0\nchannel = 6\n").unwrap();

    let err = MeasureSettings::load(&path).unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(msg.contains("decay_threshold"), "got: {msg}");
    assert!(msg.contains("channel"), "got: {msg}");
}

#[test]
fn missing_bank_is_a_read_error() {
    let err = Bank::load("/nonexistent/ymdur/bank.toml").unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn measurements_flow_back_into_the_bank() {
    let settings = MeasureSettings {
        sample_rate: 1000,
        slices_per_second: 100,
        max_key_on_secs: 0.1,
        min_key_on_secs: 0.0,
        max_key_off_secs: 0.1,
        ..Default::default()
    };
    let runner = BatchRunner::new(Measurer::new(
        RegisterLog::new as fn() -> RegisterLog,
        settings.to_measure_config(),
    ));

    let mut bank = sample_bank();
    assert_eq!(bank.unmeasured_count(), 3);

    let mut instruments: Vec<Instrument> =
        bank.iter().map(|(_, _, entry)| entry.to_instrument()).collect();
    assert!(runner.measure_batch(&mut instruments));

    for (entry, measured) in bank.iter_mut().zip(&instruments) {
        entry.record_measurement(measured);
    }
    assert_eq!(bank.unmeasured_count(), 0);
    // The recording chip is silent, so both durations are zero.
    assert!(bank.iter().all(|(_, _, e)| e.key_on_ms == Some(0) && e.key_off_ms == Some(0)));
}
