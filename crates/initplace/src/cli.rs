//! Command line definition
//!
//! Kept apart from `main.rs` so tests can drive [`Cli::try_parse_from`]
//! without spawning a process.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// initplace: member initialization placement checker.
///
/// Reads a JSON snapshot of type declarations and reports members whose
/// initial value is set in the wrong place: redundant defaults, missing
/// initializers, conflicting initializations, constructor assignments that
/// repeat the declaration, and constructor values that belong in the
/// declaration.
#[derive(Parser, Debug)]
#[command(name = "initplace")]
#[command(version)]
#[command(about = "Check where members get their initial values", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging on stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze every type declaration in a source unit
    Check {
        /// JSON source unit to analyze
        input: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (defaults to the config file's, then text)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "initplace", "check", "unit.json", "--config", "rules.toml", "--format", "json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Check { input, config, format } = cli.command;
        assert_eq!(input, PathBuf::from("unit.json"));
        assert_eq!(config, Some(PathBuf::from("rules.toml")));
        assert_eq!(format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let err = Cli::try_parse_from(["initplace", "check", "unit.json", "--format", "xml"]).unwrap_err();
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["initplace", "check"]).is_err());
    }
}
