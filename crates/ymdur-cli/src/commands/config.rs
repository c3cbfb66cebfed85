//! Measurement settings command.

use std::path::PathBuf;

use clap::Args;
use ymdur_config::{MeasureSettings, paths};

use super::common::load_settings;

#[derive(Args)]
pub struct ConfigArgs {
    /// Print the effective settings (default)
    #[arg(long, conflicts_with = "init")]
    show: bool,

    /// Write a settings file with default values
    #[arg(long)]
    init: bool,

    /// Overwrite an existing file with --init
    #[arg(long, requires = "init")]
    force: bool,

    /// Settings file to read or create instead of the user default
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    if args.show || !args.init {
        show(args.config)
    } else {
        init(args.config, args.force)
    }
}

fn show(config: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = load_settings(config.as_deref())?;
    let source = match config.or_else(paths::find_settings) {
        Some(path) => path.display().to_string(),
        None => format!("defaults (no {})", paths::settings_path().display()),
    };
    println!("# source: {source}");
    print!("{}", settings.to_toml()?);
    Ok(())
}

fn init(config: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = match config {
        Some(path) => path,
        None => paths::ensure_user_config_dir()?.join(paths::SETTINGS_FILE),
    };
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }
    MeasureSettings::default().save(&path)?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}
