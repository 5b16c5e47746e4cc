//! # Initplace
//!
//! Host driver for the placement engine: loads a JSON source unit, analyzes
//! every type declaration in it with a fresh model, filters the findings
//! through the user configuration and renders them.

pub mod cli;
pub mod config;
pub mod report;

use anyhow::{Context, Result};
use config::Config;
use initplace_core::hir::TypeDecl;
use initplace_core::{CancellationToken, DeclarationModel, PlacementAnalyzer};
use report::TypeReport;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Process exit codes
pub mod exit_code {
    pub const CLEAN: u8 = 0;
    pub const FINDINGS: u8 = 1;
    pub const ERROR: u8 = 2;
}

/// Snapshot of the declarations handed over by the front end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub types: Vec<TypeDecl>,
    /// Type names resolvable as static receivers in this unit
    #[serde(default)]
    pub known_types: Vec<String>,
}

impl SourceUnit {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read input {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid source unit {}", path.display()))
    }
}

/// Analyze every type of `unit`, keeping only types with enabled findings
pub fn check(unit: &SourceUnit, config: &Config, cancel: &CancellationToken) -> Result<Vec<TypeReport>> {
    let known_types = unit.known_types.iter().chain(&config.known_types).cloned().collect::<Vec<_>>();
    let mut reports = Vec::new();

    for decl in &unit.types {
        let model = DeclarationModel::new(decl).with_known_types(known_types.iter().cloned());
        let findings = PlacementAnalyzer::new(&model)
            .with_cancellation(cancel.clone())
            .analyze()
            .with_context(|| format!("Failed to analyze type '{}'", decl.name))?;

        let total = findings.len();
        let findings = findings.into_iter().filter(|f| config.is_enabled(f.kind)).collect::<Vec<_>>();
        debug!(type_name = %decl.name, total, reported = findings.len(), "type analyzed");

        if !findings.is_empty() {
            reports.push(TypeReport {
                type_name: decl.name.clone(),
                findings,
            });
        }
    }

    info!(
        "Checked {} types, {} findings",
        unit.types.len(),
        TypeReport::finding_count(&reports)
    );
    Ok(reports)
}
