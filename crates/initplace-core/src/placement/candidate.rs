//! Initialization candidates discovered in constructor bodies

use super::classifier::InitValue;
use crate::hir::Span;
use crate::semantic::{MemberId, MethodId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Whether an assignment runs on every path through its constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    StraightLine,
    Conditional,
}

/// Where a candidate assignment was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
    /// Directly in the body of the constructor at this index
    Constructor(usize),
    /// In a same-type method reached from the constructor at this index
    CalledMethod { constructor: usize, method: MethodId },
}

impl CandidateOrigin {
    pub fn constructor(&self) -> usize {
        match *self {
            CandidateOrigin::Constructor(index) | CandidateOrigin::CalledMethod { constructor: index, .. } => index,
        }
    }
}

/// Why a member must not be initialized at its declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disqualifier {
    /// The value derives from a constructor parameter
    ConstructorInput,
    /// The value reads `this` or instance members
    InstanceState,
    /// The value reads a local of the assigning body
    LocalValue,
    /// The value calls a non-static operation inside a constructor with parameters
    NonStaticCall,
    /// Assigned in a helper method reached from a constructor
    CalledMethod,
    /// Assigned only inside branches or loops of a constructor
    ConditionalOnly,
    /// Constructors assign values that are not equivalent
    Divergent,
    /// The value contains syntax the facade could not bind
    Unresolved,
}

impl fmt::Display for Disqualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Disqualifier::ConstructorInput => "depends on constructor input",
            Disqualifier::InstanceState => "reads instance state",
            Disqualifier::LocalValue => "reads a local variable",
            Disqualifier::NonStaticCall => "calls a non-static operation",
            Disqualifier::CalledMethod => "assigned in a called method",
            Disqualifier::ConditionalOnly => "assigned only conditionally",
            Disqualifier::Divergent => "constructors assign different values",
            Disqualifier::Unresolved => "contains unresolved syntax",
        };
        f.write_str(text)
    }
}

/// One assignment to a member found while walking a constructor
#[derive(Debug, Clone, PartialEq)]
pub struct InitializationCandidate {
    pub member: MemberId,
    pub value: InitValue,
    /// Span of the assigning statement
    pub span: Span,
    pub origin: CandidateOrigin,
    pub placement: Placement,
    pub disqualifiers: SmallVec<[Disqualifier; 2]>,
}

impl InitializationCandidate {
    pub fn is_clean(&self) -> bool {
        self.disqualifiers.is_empty()
    }

    pub(crate) fn flag(&mut self, reason: Disqualifier) {
        if !self.disqualifiers.contains(&reason) {
            self.disqualifiers.push(reason);
        }
    }
}

/// Candidates of one constructor, keyed by member, in discovery order
pub type CandidateMap = IndexMap<MemberId, Vec<InitializationCandidate>>;
