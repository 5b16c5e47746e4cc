//! initplace: member initialization placement checker.
//!
//! # Usage
//!
//! ```bash
//! # Report findings as text
//! initplace check unit.json
//!
//! # JSON output with a config file
//! initplace check unit.json --config initplace.toml --format json
//!
//! # Debug logging
//! initplace -v check unit.json
//! ```

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use initplace::cli::{Cli, Commands, OutputFormat};
use initplace::config::Config;
use initplace::report::{self, TypeReport};
use initplace::{check, exit_code, SourceUnit};
use initplace_core::CancellationToken;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(exit_code::ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Check { input, config, format } => {
            let config = match config {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            };
            let unit = SourceUnit::from_file(&input)?;
            let reports = check(&unit, &config, &CancellationToken::new())?;

            let format = format.or(config.format).unwrap_or_default();
            match format {
                OutputFormat::Text => print!("{}", report::render_text(&reports, std::io::stdout().is_terminal())),
                OutputFormat::Json => println!("{}", report::render_json(&reports)?),
            }

            Ok(if TypeReport::finding_count(&reports) == 0 {
                exit_code::CLEAN
            } else {
                exit_code::FINDINGS
            })
        }
    }
}
