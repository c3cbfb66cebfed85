//! Note frequency encoding command.

use clap::Args;
use ymdur_chip::{DEFAULT_CLOCK, pitch_hz};
use ymdur_core::FrequencyEncoding;
use ymdur_core::program::{REG_FNUM_HIGH, REG_FNUM_LOW};

#[derive(Args)]
pub struct FreqArgs {
    /// Note number (69 = A4)
    #[arg(value_name = "NOTE", allow_negative_numbers = true)]
    note: i32,

    /// Semitones added to the note
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    fine_tune: i8,
}

pub fn run(args: FreqArgs) -> anyhow::Result<()> {
    let freq = FrequencyEncoding::for_note(args.note, args.fine_tune);

    println!("note {} (fine-tune {:+})", args.note, args.fine_tune);
    println!(
        "  pitch:     {:.2} Hz",
        pitch_hz(DEFAULT_CLOCK, freq.block(), freq.fnum())
    );
    println!("  block:     {}", freq.block());
    println!("  F-number:  {}", freq.fnum());
    println!("  0x{REG_FNUM_HIGH:02X} <- 0x{:02X}", freq.high_byte());
    println!("  0x{REG_FNUM_LOW:02X} <- 0x{:02X}", freq.low_byte());
    if freq.clamped {
        println!("  clamped: note is outside the encodable range");
    }

    Ok(())
}
