//! # tabula
//!
//! Command-line front end for tabula table stores: loads settings, installs
//! logging, then runs one command against a database file.

#![deny(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tabula_settings::{load_settings, load_settings_from_path};
use tabula_telemetry::{init_telemetry, TelemetryConfig};

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => load_settings_from_path(path),
        None => load_settings(),
    }
    .context("failed to load settings")?;

    let telemetry =
        TelemetryConfig::from_settings(&settings.logging).context("invalid logging settings")?;
    init_telemetry(&telemetry).context("failed to initialize logging")?;

    let stdout = std::io::stdout();
    cli::run(cli, &settings, &mut stdout.lock())
}
