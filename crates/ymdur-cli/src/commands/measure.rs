//! Batch duration measurement command.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use ymdur_chip::ModelChip;
use ymdur_config::{Bank, InstrumentKind};
use ymdur_core::{BatchRunner, CancelToken, Instrument, Measurer, default_workers};

use super::common::load_settings;

#[derive(Args)]
pub struct MeasureArgs {
    /// Bank file (TOML)
    #[arg(value_name = "BANK")]
    bank: PathBuf,

    /// Write the measured bank here instead of updating BANK in place
    #[arg(short, long, value_name = "OUT")]
    output: Option<PathBuf>,

    /// Worker threads (defaults to the settings file, then all cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Measurement settings file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Skip instruments that already carry durations
    #[arg(long)]
    only_unmeasured: bool,
}

#[derive(Serialize)]
struct MeasuredInstrument {
    kind: String,
    index: usize,
    name: String,
    key_on_ms: u16,
    key_off_ms: u16,
}

#[derive(Serialize)]
struct MeasureSummary {
    bank: PathBuf,
    saved_to: PathBuf,
    measured: usize,
    selected: usize,
    cancelled: bool,
    instruments: Vec<MeasuredInstrument>,
}

pub fn run(args: MeasureArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let config = settings.to_measure_config();

    let mut bank = Bank::load(&args.bank)?;

    // Melodic first, then percussion.
    let selected: Vec<(InstrumentKind, usize)> = bank
        .iter()
        .filter(|(_, _, entry)| !(args.only_unmeasured && entry.is_measured()))
        .map(|(kind, index, _)| (kind, index))
        .collect();
    let mut instruments: Vec<Instrument> = selected
        .iter()
        .map(|&(kind, index)| bank.list(kind)[index].to_instrument())
        .collect();

    let workers = args
        .jobs
        .or(settings.workers)
        .unwrap_or_else(default_workers)
        .max(1);

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nCancelling after the instruments in progress...");
            cancel.cancel();
        })?;
    }

    let runner = BatchRunner::new(Measurer::new(ModelChip::new, config))
        .with_workers(workers)
        .with_cancel_token(cancel);

    if !args.json {
        println!(
            "Measuring {} of {} instruments from {} ({} workers)...",
            selected.len(),
            bank.len(),
            args.bank.display(),
            runner.workers()
        );
    }

    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let finished: Vec<AtomicBool> = selected.iter().map(|_| AtomicBool::new(false)).collect();
    let report = runner.run(&mut instruments, |progress| {
        finished[progress.index].store(true, Ordering::Relaxed);
        pb.set_position(progress.completed as u64);
    });
    pb.finish_and_clear();

    // Only instruments that actually finished are written back.
    let mut rows = Vec::with_capacity(report.completed);
    for ((&(kind, index), instrument), done) in selected.iter().zip(&instruments).zip(&finished) {
        if !done.load(Ordering::Relaxed) {
            continue;
        }
        let entry = &mut bank.list_mut(kind)[index];
        entry.record_measurement(instrument);
        rows.push(MeasuredInstrument {
            kind: kind.to_string(),
            index,
            name: entry.name.clone(),
            key_on_ms: instrument.key_on_ms,
            key_off_ms: instrument.key_off_ms,
        });
    }

    let saved_to = args.output.clone().unwrap_or_else(|| args.bank.clone());
    bank.save(&saved_to)?;

    let summary = MeasureSummary {
        bank: args.bank,
        saved_to,
        measured: report.completed,
        selected: report.total,
        cancelled: report.cancelled,
        instruments: rows,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_table(&summary);
    }

    Ok(())
}

fn print_table(summary: &MeasureSummary) {
    if !summary.instruments.is_empty() {
        println!(
            "\n{:<10} {:>5}  {:<24} {:>9} {:>9}",
            "list", "#", "name", "key-on", "key-off"
        );
        for row in &summary.instruments {
            println!(
                "{:<10} {:>5}  {:<24} {:>7}ms {:>7}ms",
                row.kind, row.index, row.name, row.key_on_ms, row.key_off_ms
            );
        }
    }

    println!();
    if summary.cancelled {
        println!(
            "Cancelled: {} of {} instruments measured.",
            summary.measured, summary.selected
        );
    } else {
        println!("Measured {} instruments.", summary.measured);
    }
    println!("Saved to {}", summary.saved_to.display());
}
