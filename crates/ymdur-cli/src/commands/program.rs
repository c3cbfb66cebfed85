//! Register program listing command.

use std::path::PathBuf;

use clap::Args;
use ymdur_chip::{DEFAULT_CLOCK, pitch_hz};
use ymdur_config::Bank;
use ymdur_core::{RegisterLog, program};

use super::common::instrument_kind;

#[derive(Args)]
pub struct ProgramArgs {
    /// Bank file (TOML)
    #[arg(value_name = "BANK")]
    bank: PathBuf,

    /// Instrument index within its list
    #[arg(short, long)]
    index: usize,

    /// Select from the percussion list instead of the melodic one
    #[arg(short, long)]
    percussion: bool,

    /// Chip channel (0-5)
    #[arg(short, long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=5))]
    channel: u8,
}

pub fn run(args: ProgramArgs) -> anyhow::Result<()> {
    let bank = Bank::load(&args.bank)?;
    let kind = instrument_kind(args.percussion);
    let entry = bank.get(kind, args.index)?;
    let instrument = entry.to_instrument();

    let mut log = RegisterLog::new();
    let freq = program::start_note(&mut log, &instrument, args.channel);

    println!("{} ({kind} #{}), channel {}", entry.name, args.index, args.channel);
    println!(
        "note {}: block {}, F-number {} ({:.1} Hz){}",
        program::measurement_note(instrument.percussion_note) + i32::from(instrument.fine_tune),
        freq.block(),
        freq.fnum(),
        pitch_hz(DEFAULT_CLOCK, freq.block(), freq.fnum()),
        if freq.clamped { ", clamped" } else { "" }
    );
    println!();
    for (i, write) in log.writes().iter().enumerate() {
        println!("{i:>3}  {write}");
    }

    Ok(())
}
