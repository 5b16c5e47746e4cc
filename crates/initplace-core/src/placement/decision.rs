//! Placement decision table
//!
//! The engine reduces each member to a handful of facts about its ledger
//! record and its declaration initializer, then [`decide`] maps those facts to
//! exactly one outcome. The match is exhaustive, so adding a fact variant
//! without a row is a compile error rather than a silently dropped finding.

use super::finding::FindingKind;

/// What the analyzed constructors do to a member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    /// No analyzed constructor assigns the member
    Absent,
    Disqualified,
    /// Every recorded assignment is equivalent to the baseline
    Consistent {
        /// The baseline value is the member type's default
        baseline_is_default: bool,
        /// Every analyzed constructor assigns the member
        full_coverage: bool,
    },
}

/// The member's declaration initializer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationState {
    Absent,
    Present {
        is_default: bool,
        /// Equivalent to the ledger baseline; false when there is no baseline
        matches_baseline: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberFacts {
    pub ledger: LedgerState,
    pub declaration: DeclarationState,
    /// The member type cannot hold null or zero implicitly
    pub requires_initializer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoFinding,
    Report(FindingKind),
}

pub fn decide(facts: MemberFacts) -> Outcome {
    use DeclarationState as Decl;
    use LedgerState as Ledger;

    let kind = match (facts.ledger, facts.declaration) {
        (Ledger::Absent, Decl::Present { is_default: true, .. }) => FindingKind::RedundantDefault,
        (Ledger::Absent, Decl::Present { is_default: false, .. }) => return Outcome::NoFinding,
        (Ledger::Absent, Decl::Absent) if facts.requires_initializer => FindingKind::MissingInitializer,
        (Ledger::Absent, Decl::Absent) => return Outcome::NoFinding,

        (Ledger::Disqualified, Decl::Present { .. }) => FindingKind::ConflictingInitialization,
        (Ledger::Disqualified, Decl::Absent) => return Outcome::NoFinding,

        (Ledger::Consistent { .. }, Decl::Present { matches_baseline: true, .. }) => {
            FindingKind::RedundantConstructorAssignment
        }
        (Ledger::Consistent { .. }, Decl::Present { matches_baseline: false, .. }) => {
            FindingKind::ConflictingInitialization
        }
        // assigning the implicit default is not a missing declaration value
        (Ledger::Consistent { baseline_is_default: true, .. }, Decl::Absent) => return Outcome::NoFinding,
        (Ledger::Consistent { full_coverage: false, .. }, Decl::Absent) => return Outcome::NoFinding,
        (
            Ledger::Consistent {
                baseline_is_default: false,
                full_coverage: true,
            },
            Decl::Absent,
        ) => FindingKind::Hoist,
    };
    Outcome::Report(kind)
}
