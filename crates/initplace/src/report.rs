//! Finding output in text and JSON form

use anyhow::Result;
use colored::Colorize;
use initplace_core::{Finding, FindingKind};
use serde::Serialize;
use std::fmt::Write as _;

/// Findings of one analyzed type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeReport {
    #[serde(rename = "type")]
    pub type_name: String,
    pub findings: Vec<Finding>,
}

impl TypeReport {
    pub fn finding_count(reports: &[TypeReport]) -> usize {
        reports.iter().map(|r| r.findings.len()).sum()
    }
}

/// One line per finding: `Type.member: kind at line:col[, line:col...]`
pub fn render_text(reports: &[TypeReport], color: bool) -> String {
    let mut out = String::new();
    for report in reports {
        for finding in &report.findings {
            let subject = format!("{}.{}", report.type_name, finding.member);
            let kind = finding.kind.as_str();
            let locations = finding
                .locations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            if color {
                let _ = writeln!(out, "{}: {} at {}", subject.bold(), paint(finding.kind, kind), locations);
            } else {
                let _ = writeln!(out, "{subject}: {kind} at {locations}");
            }
        }
    }
    out
}

fn paint(kind: FindingKind, text: &str) -> colored::ColoredString {
    match kind {
        FindingKind::ConflictingInitialization | FindingKind::MissingInitializer => text.red(),
        FindingKind::Hoist => text.cyan(),
        FindingKind::RedundantDefault | FindingKind::RedundantConstructorAssignment => text.yellow(),
    }
}

pub fn render_json(reports: &[TypeReport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}
