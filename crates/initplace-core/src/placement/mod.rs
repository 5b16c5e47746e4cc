//! Member initialization placement
//!
//! Decides, per member of a declared type, whether its initial value belongs
//! in the member declaration or in the constructors.
//!
//! # Architecture
//!
//! The analysis runs in phases over one type declaration:
//! 1. **Candidate Collection**: walk every non-chaining constructor, following
//!    calls into same-type helpers, and classify each member assignment
//! 2. **Aggregation**: fold the candidates of all constructors into one ledger
//!    record per member
//! 3. **Decision**: combine each record with the member's declaration
//!    initializer and map the result through the decision table
//!
//! Every phase allocates fresh state per call, so one [`PlacementAnalyzer`]
//! per type can run concurrently against a shared [`SemanticModel`].
//!
//! # Example
//!
//! ```rust
//! use initplace_core::hir::{ConstructorDecl, Expr, MemberDecl, Stmt, TypeDecl, TypeRef};
//! use initplace_core::placement::{analyze_type, FindingKind};
//!
//! let decl = TypeDecl::new("Parser")
//!     .with_member(MemberDecl::field(TypeRef::int(), "Depth"))
//!     .with_constructor(ConstructorDecl::parameterless(vec![
//!         Stmt::assign(Expr::name("Depth"), Expr::int(8)),
//!     ]));
//!
//! let findings = analyze_type(&decl).unwrap();
//! assert_eq!(findings[0].kind, FindingKind::Hoist);
//! ```

pub mod candidate;
pub mod classifier;
pub mod decision;
pub mod finding;
pub mod ledger;
pub mod walker;

pub use candidate::{CandidateMap, CandidateOrigin, Disqualifier, InitializationCandidate, Placement};
pub use classifier::{are_equivalent, Classifier, InitValue};
pub use decision::{decide, DeclarationState, LedgerState, MemberFacts, Outcome};
pub use finding::{Finding, FindingKind};
pub use ledger::{FieldInitializationRecord, InitializationLedger};
pub use walker::ConstructorWalker;

use crate::error::{AnalysisError, Result};
use crate::hir::{Declarator, MemberDecl, TypeDecl};
use crate::semantic::{BodyScope, DeclarationModel, MemberId, SemanticModel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Runs the placement engine over the type a [`SemanticModel`] describes
pub struct PlacementAnalyzer<'a> {
    model: &'a dyn SemanticModel,
    cancel: CancellationToken,
}

impl<'a> PlacementAnalyzer<'a> {
    pub fn new(model: &'a dyn SemanticModel) -> Self {
        Self {
            model,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a host-owned token; cancelling it aborts the analysis with
    /// [`AnalysisError::Cancelled`]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Collect every constructor's candidates into one ledger
    ///
    /// Returns the ledger and the number of constructors that were analyzed.
    pub fn build_ledger(&self) -> Result<(InitializationLedger, usize)> {
        let decl = self.model.declaration();
        let walker = ConstructorWalker::new(self.model, &self.cancel);
        let mut ledger = InitializationLedger::new();
        let mut analyzed = 0;

        for (index, ctor) in decl.constructors.iter().enumerate() {
            if ctor.is_chaining() || ctor.is_static {
                continue;
            }
            analyzed += 1;
            ledger.absorb(walker.collect_candidates(index, ctor)?);
        }

        ledger.check_invariant()?;
        Ok((ledger, analyzed))
    }

    /// Analyze the declared type, returning its findings in member order
    pub fn analyze(&self) -> Result<Vec<Finding>> {
        let decl = self.model.declaration();
        if self.cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled {
                type_name: decl.name.clone(),
            });
        }

        let (ledger, analyzed) = self.build_ledger()?;
        debug!(
            type_name = %decl.name,
            constructors = analyzed,
            members = ledger.len(),
            "placement ledger built"
        );

        let mut findings = Vec::new();
        for (index, member) in decl.members.iter().enumerate() {
            if !member.is_instance() {
                continue;
            }
            let [declarator] = member.declarators.as_slice() else {
                trace!(declarators = member.declarators.len(), "skipping multi-declarator member");
                continue;
            };
            let id = MemberId::new(index, 0);
            if let Some(finding) = self.member_finding(id, member, declarator, &ledger, analyzed)? {
                findings.push(finding);
            }
        }
        Ok(findings)
    }

    fn member_finding(
        &self,
        id: MemberId,
        member: &MemberDecl,
        declarator: &Declarator,
        ledger: &InitializationLedger,
        analyzed: usize,
    ) -> Result<Option<Finding>> {
        let initializer = declarator.initializer.as_ref();
        if initializer.is_some_and(|e| e.contains_error()) {
            trace!(member = %declarator.name, "skipping member with unresolved initializer");
            return Ok(None);
        }

        let scope = BodyScope::empty();
        let classifier = Classifier::new(self.model, &scope);
        let record = ledger.get(id);
        let baseline = record.and_then(FieldInitializationRecord::baseline);

        let ledger_state = match record {
            None => LedgerState::Absent,
            Some(record) if record.is_disqualified() => LedgerState::Disqualified,
            Some(record) => {
                let Some(baseline) = baseline else {
                    return Err(AnalysisError::Invariant(format!(
                        "record for '{}' has neither a baseline nor a disqualifier",
                        declarator.name
                    )));
                };
                LedgerState::Consistent {
                    baseline_is_default: classifier.is_default_value(&baseline.value.expr, &member.ty),
                    full_coverage: record.assigned_in_constructors().len() == analyzed,
                }
            }
        };
        let declaration_state = match initializer {
            None => DeclarationState::Absent,
            Some(init) => DeclarationState::Present {
                is_default: classifier.is_default_value(init, &member.ty),
                matches_baseline: baseline.is_some_and(|b| are_equivalent(&classifier.init_value(init), &b.value)),
            },
        };

        let facts = MemberFacts {
            ledger: ledger_state,
            declaration: declaration_state,
            requires_initializer: member.ty.requires_initializer(),
        };
        let outcome = decide(facts);
        debug!(member = %declarator.name, ?facts, ?outcome, "placement decided");

        let Outcome::Report(kind) = outcome else {
            return Ok(None);
        };
        let statements = || ledger.candidates_for(id).iter().map(|c| c.span).collect::<Vec<_>>();
        let finding = match kind {
            FindingKind::RedundantDefault | FindingKind::MissingInitializer | FindingKind::ConflictingInitialization => {
                Finding::new(kind, &declarator.name, vec![declarator.span])
            }
            FindingKind::RedundantConstructorAssignment => Finding::new(kind, &declarator.name, statements()),
            FindingKind::Hoist => {
                let finding = Finding::new(kind, &declarator.name, statements());
                match baseline {
                    Some(b) => finding.with_suggested_value(b.value.expr.clone()),
                    None => finding,
                }
            }
        };
        Ok(Some(finding))
    }
}

/// Analyze `decl` with the reference [`DeclarationModel`]
pub fn analyze_type(decl: &TypeDecl) -> Result<Vec<Finding>> {
    let model = DeclarationModel::new(decl);
    PlacementAnalyzer::new(&model).analyze()
}
