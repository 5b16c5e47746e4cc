use crate::hir::{Expr, Span};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of placement finding, one per outcome of the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// The declaration initializer sets the value the member already holds
    RedundantDefault,
    /// A non-nullable reference member is never initialized
    MissingInitializer,
    /// The declaration initializer disagrees with what constructors assign
    ConflictingInitialization,
    /// A constructor assignment repeats the declaration initializer
    RedundantConstructorAssignment,
    /// Every constructor assigns the same value; it belongs in the declaration
    Hoist,
}

impl FindingKind {
    pub const ALL: [FindingKind; 5] = [
        FindingKind::RedundantDefault,
        FindingKind::MissingInitializer,
        FindingKind::ConflictingInitialization,
        FindingKind::RedundantConstructorAssignment,
        FindingKind::Hoist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FindingKind::RedundantDefault => "redundant_default",
            FindingKind::MissingInitializer => "missing_initializer",
            FindingKind::ConflictingInitialization => "conflicting_initialization",
            FindingKind::RedundantConstructorAssignment => "redundant_constructor_assignment",
            FindingKind::Hoist => "hoist",
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One placement finding for one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub member: String,
    /// The declaration, or each offending constructor statement
    pub locations: Vec<Span>,
    /// Declaration value to use when applying a hoist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_value: Option<Expr>,
}

impl Finding {
    pub fn new(kind: FindingKind, member: impl Into<String>, locations: Vec<Span>) -> Self {
        Self {
            kind,
            member: member.into(),
            locations,
            suggested_value: None,
        }
    }

    pub fn with_suggested_value(mut self, value: Expr) -> Self {
        self.suggested_value = Some(value);
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at ", self.member, self.kind)?;
        for (i, span) in self.locations.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{span}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_location() {
        let finding = Finding::new(FindingKind::Hoist, "Buffer", vec![Span::new(4, 9), Span::new(9, 9)]);
        assert_eq!(finding.to_string(), "Buffer: hoist at 4:9, 9:9");
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in FindingKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
