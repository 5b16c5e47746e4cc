//! Per-member initialization ledger
//!
//! One record per member, accumulated across every analyzed constructor of a
//! type. The `disqualified` verdict only ever moves from false to true: once a
//! member is unsafe to hoist, nothing recorded later can make it safe again.

use super::candidate::{CandidateMap, Disqualifier, InitializationCandidate};
use super::classifier::are_equivalent;
use crate::error::{AnalysisError, Result};
use crate::semantic::MemberId;
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;
use tracing::trace;

/// Everything the analyzed constructors do to one member
#[derive(Debug, Clone, Default)]
pub struct FieldInitializationRecord {
    candidates: Vec<InitializationCandidate>,
    disqualified: bool,
    reasons: IndexSet<Disqualifier>,
    constructors: BTreeSet<usize>,
}

impl FieldInitializationRecord {
    /// The first recorded candidate; every later one is compared against it
    pub fn baseline(&self) -> Option<&InitializationCandidate> {
        self.candidates.first()
    }

    pub fn candidates(&self) -> &[InitializationCandidate] {
        &self.candidates
    }

    pub fn is_disqualified(&self) -> bool {
        self.disqualified
    }

    pub fn reasons(&self) -> impl Iterator<Item = Disqualifier> + '_ {
        self.reasons.iter().copied()
    }

    /// Indices of the constructors that assign this member
    pub fn assigned_in_constructors(&self) -> &BTreeSet<usize> {
        &self.constructors
    }

    fn disqualify(&mut self, reason: Disqualifier) {
        self.disqualified = true;
        self.reasons.insert(reason);
    }

    /// Undisqualified records hold only candidates equivalent to the baseline
    fn is_consistent(&self) -> bool {
        self.disqualified
            || self
                .baseline()
                .is_none_or(|first| self.candidates.iter().all(|c| are_equivalent(&first.value, &c.value)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InitializationLedger {
    records: IndexMap<MemberId, FieldInitializationRecord>,
}

impl InitializationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one candidate to the record of its member
    ///
    /// A candidate that disagrees with the baseline is not stored; it marks
    /// the member [`Disqualifier::Divergent`] instead.
    pub fn record(&mut self, candidate: InitializationCandidate) {
        let member = candidate.member;
        let record = self.records.entry(member).or_default();
        record.constructors.insert(candidate.origin.constructor());
        for reason in &candidate.disqualifiers {
            record.disqualify(*reason);
        }

        match record.baseline() {
            Some(first) if !are_equivalent(&first.value, &candidate.value) => {
                trace!(%member, "candidate diverges from baseline");
                record.disqualify(Disqualifier::Divergent);
            }
            _ => record.candidates.push(candidate),
        }
    }

    /// Record every candidate one constructor produced, in discovery order
    pub fn absorb(&mut self, candidates: CandidateMap) {
        for candidate in candidates.into_values().flatten() {
            self.record(candidate);
        }
    }

    pub fn is_disqualified(&self, member: MemberId) -> bool {
        self.records.get(&member).is_some_and(FieldInitializationRecord::is_disqualified)
    }

    pub fn candidates_for(&self, member: MemberId) -> &[InitializationCandidate] {
        self.records.get(&member).map_or(&[], |r| r.candidates())
    }

    pub fn get(&self, member: MemberId) -> Option<&FieldInitializationRecord> {
        self.records.get(&member)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemberId, &FieldInitializationRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn check_invariant(&self) -> Result<()> {
        for (member, record) in &self.records {
            let consistent = record.is_consistent();
            debug_assert!(consistent, "undisqualified record for {member} holds divergent candidates");
            if !consistent {
                return Err(AnalysisError::Invariant(format!(
                    "undisqualified record for {member} holds divergent candidates"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{Expr, Span};
    use crate::placement::candidate::{CandidateOrigin, Placement};
    use crate::placement::classifier::InitValue;
    use crate::semantic::ConstValue;
    use smallvec::smallvec;

    const MODE: MemberId = MemberId {
        declaration: 0,
        declarator: 0,
    };

    fn candidate(value: i64, constructor: usize) -> InitializationCandidate {
        InitializationCandidate {
            member: MODE,
            value: InitValue {
                expr: Expr::int(value),
                constant: Some(ConstValue::Int(value)),
            },
            span: Span::line(constructor as u32 + 1),
            origin: CandidateOrigin::Constructor(constructor),
            placement: Placement::StraightLine,
            disqualifiers: smallvec![],
        }
    }

    #[test]
    fn test_first_candidate_becomes_baseline() {
        let mut ledger = InitializationLedger::new();
        ledger.record(candidate(1, 0));
        ledger.record(candidate(1, 1));

        let record = ledger.get(MODE).unwrap();
        assert_eq!(record.baseline().unwrap().span, Span::line(1));
        assert_eq!(ledger.candidates_for(MODE).len(), 2);
        assert!(!ledger.is_disqualified(MODE));
        assert_eq!(record.assigned_in_constructors().len(), 2);
    }

    #[test]
    fn test_divergent_candidate_disqualifies_without_being_stored() {
        let mut ledger = InitializationLedger::new();
        ledger.record(candidate(1, 0));
        ledger.record(candidate(2, 1));

        assert!(ledger.is_disqualified(MODE));
        assert_eq!(ledger.candidates_for(MODE).len(), 1);
        let record = ledger.get(MODE).unwrap();
        assert_eq!(record.reasons().collect::<Vec<_>>(), vec![Disqualifier::Divergent]);
        // the divergent constructor still counts as assigning the member
        assert!(record.assigned_in_constructors().contains(&1));
        assert!(ledger.check_invariant().is_ok());
    }

    #[test]
    fn test_candidate_reasons_carry_over() {
        let mut ledger = InitializationLedger::new();
        let mut flagged = candidate(1, 0);
        flagged.disqualifiers.push(Disqualifier::CalledMethod);
        ledger.record(flagged);
        assert!(ledger.is_disqualified(MODE));
        assert_eq!(ledger.candidates_for(MODE).len(), 1);
    }

    #[test]
    fn test_disqualification_is_sticky() {
        let mut ledger = InitializationLedger::new();
        let mut flagged = candidate(7, 0);
        flagged.disqualifiers.push(Disqualifier::ConditionalOnly);
        ledger.record(flagged);
        for i in 1..4 {
            ledger.record(candidate(7, i));
        }
        assert!(ledger.is_disqualified(MODE));
    }

    #[test]
    fn test_unknown_member_has_no_candidates() {
        let ledger = InitializationLedger::new();
        assert!(ledger.candidates_for(MODE).is_empty());
        assert!(!ledger.is_disqualified(MODE));
        assert!(ledger.is_empty());
    }
}
