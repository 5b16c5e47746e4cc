//! `initplace.toml` configuration
//!
//! Nothing here changes what the engine decides. Known types feed the
//! reference semantic model, and disabled kinds are dropped from the report
//! after analysis.

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use initplace_core::FindingKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Type names treated as static receivers, e.g. `Math` or `Guid`
    pub known_types: Vec<String>,
    /// Finding kinds removed from the report
    pub disabled: Vec<FindingKind>,
    pub format: Option<OutputFormat>,
    /// Allow-list for the side-effect classifier of sibling rules; not read by this engine
    pub safe_symbols: Vec<String>,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn is_enabled(&self, kind: FindingKind) -> bool {
        !self.disabled.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
known_types = ["Math", "Guid"]
disabled = ["redundant_default", "hoist"]
format = "json"
safe_symbols = ["System.Math.Max"]
"#,
        )
        .unwrap();
        assert_eq!(config.known_types, vec!["Math", "Guid"]);
        assert!(!config.is_enabled(FindingKind::Hoist));
        assert!(config.is_enabled(FindingKind::MissingInitializer));
        assert_eq!(config.format, Some(OutputFormat::Json));
        assert_eq!(config.safe_symbols.len(), 1);
    }

    #[test]
    fn test_empty_config_enables_everything() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert!(FindingKind::ALL.iter().all(|k| config.is_enabled(*k)));
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        assert!(Config::parse(r#"disabled = ["everything"]"#).is_err());
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("initplace.toml");
        std::fs::write(&path, "format = 3").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("initplace.toml"));
    }
}
