//! ymdur CLI - measure how long FM instrument patches keep sounding.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ymdur")]
#[command(author, version, about = "Sounding-duration measurement for 4-operator FM banks", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure key-on and key-off durations of every instrument in a bank
    Measure(commands::measure::MeasureArgs),

    /// Print the register program for one instrument
    Program(commands::program::ProgramArgs),

    /// Show the block/F-number encoding of a note
    Freq(commands::freq::FreqArgs),

    /// Show or create the measurement settings file
    Config(commands::config::ConfigArgs),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Measure(args) => commands::measure::run(args),
        Commands::Program(args) => commands::program::run(args),
        Commands::Freq(args) => commands::freq::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
