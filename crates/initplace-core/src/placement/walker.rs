//! Constructor body walker
//!
//! Collects every direct assignment to a member of the declared type from one
//! constructor, then follows invocation statements into same-type,
//! non-virtual helper methods with an explicit worklist. The worklist keeps a
//! visited set so mutually recursive helpers terminate, and checks the host's
//! cancellation token on every step.

use super::candidate::{CandidateMap, CandidateOrigin, Disqualifier, InitializationCandidate, Placement};
use super::classifier::Classifier;
use crate::error::{AnalysisError, Result};
use crate::hir::{ConstructorDecl, Expr, Span, Stmt, StmtKind};
use crate::semantic::{BodyScope, MemberId, MethodId, SemanticModel, SymbolRef};
use smallvec::SmallVec;
use std::collections::{HashSet, VecDeque};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// How control leaves a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Falls through on every path
    Continues,
    /// Leaves the body on some paths
    MayExit,
    /// Leaves the body on every path
    Exits,
}

struct ScanContext {
    /// Names visible in the block being scanned
    scope: BodyScope,
    origin: CandidateOrigin,
    ctor_has_params: bool,
}

impl ScanContext {
    /// Context for the next nested block of the current one
    fn enter(&self, ordinal: &mut usize) -> ScanContext {
        let scope = self.scope.nested(*ordinal).unwrap_or_else(|| self.scope.clone());
        *ordinal += 1;
        ScanContext {
            scope,
            origin: self.origin,
            ctor_has_params: self.ctor_has_params,
        }
    }
}

/// Output of one scan: candidates plus helper methods still to visit
#[derive(Default)]
struct ScanState {
    candidates: CandidateMap,
    calls: VecDeque<MethodId>,
}

pub struct ConstructorWalker<'a> {
    model: &'a dyn SemanticModel,
    cancel: &'a CancellationToken,
}

impl<'a> ConstructorWalker<'a> {
    pub fn new(model: &'a dyn SemanticModel, cancel: &'a CancellationToken) -> Self {
        Self { model, cancel }
    }

    /// Collect the initialization candidates of the constructor at `index`
    ///
    /// Chaining constructors yield no candidates: the constructor they
    /// delegate to owns the initialization.
    pub fn collect_candidates(&self, index: usize, ctor: &ConstructorDecl) -> Result<CandidateMap> {
        self.check_cancelled()?;
        if ctor.is_chaining() || ctor.is_static {
            debug!(constructor = index, "skipping chaining or static constructor");
            return Ok(CandidateMap::new());
        }

        let ctx = ScanContext {
            scope: BodyScope::for_constructor(ctor),
            origin: CandidateOrigin::Constructor(index),
            ctor_has_params: !ctor.params.is_empty(),
        };
        let mut state = ScanState::default();
        self.scan_block(&ctor.body, &ctx, Placement::StraightLine, &mut state);
        mark_conditional_only(&mut state.candidates);

        self.follow_calls(index, ctx.ctor_has_params, &mut state)?;

        debug!(
            constructor = index,
            members = state.candidates.len(),
            "collected initialization candidates"
        );
        Ok(state.candidates)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(AnalysisError::Cancelled {
                type_name: self.model.declaration().name.clone(),
            });
        }
        Ok(())
    }

    fn follow_calls(&self, index: usize, ctor_has_params: bool, state: &mut ScanState) -> Result<()> {
        let mut visited = HashSet::new();
        while let Some(method_id) = state.calls.pop_front() {
            self.check_cancelled()?;
            if !visited.insert(method_id) {
                continue;
            }
            let Some(method) = self.model.method(method_id) else {
                continue;
            };
            let Some(body) = method.body.as_deref() else {
                continue;
            };
            trace!(method = %method.name, "scanning helper reached from constructor");

            let ctx = ScanContext {
                scope: BodyScope::for_method(method),
                origin: CandidateOrigin::CalledMethod {
                    constructor: index,
                    method: method_id,
                },
                ctor_has_params,
            };
            self.scan_block(body, &ctx, Placement::StraightLine, state);
        }
        Ok(())
    }

    fn scan_block(&self, stmts: &[Stmt], ctx: &ScanContext, entry: Placement, state: &mut ScanState) -> Flow {
        let mut placement = entry;
        let mut may_exit = false;
        // nested blocks are numbered in source order, matching the scope table
        let mut nested = 0;

        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Expr(expr) => self.scan_expression_statement(expr, stmt.span, ctx, placement, state),
                StmtKind::Local { .. } => {}
                StmtKind::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    let then_flow = self.scan_block(then_branch, &ctx.enter(&mut nested), Placement::Conditional, state);
                    let else_flow = match else_branch.as_deref() {
                        Some(b) => self.scan_block(b, &ctx.enter(&mut nested), Placement::Conditional, state),
                        None => Flow::Continues,
                    };
                    match (then_flow, else_flow) {
                        (Flow::Exits, Flow::Exits) => return Flow::Exits,
                        (Flow::Continues, Flow::Continues) => {}
                        _ => {
                            may_exit = true;
                            placement = Placement::Conditional;
                        }
                    }
                }
                StmtKind::Loop { body, .. } => {
                    if self.scan_block(body, &ctx.enter(&mut nested), Placement::Conditional, state) != Flow::Continues {
                        may_exit = true;
                        placement = Placement::Conditional;
                    }
                }
                StmtKind::Block(body) => match self.scan_block(body, &ctx.enter(&mut nested), placement, state) {
                    Flow::Exits => return Flow::Exits,
                    Flow::MayExit => {
                        may_exit = true;
                        placement = Placement::Conditional;
                    }
                    Flow::Continues => {}
                },
                StmtKind::Return(_) | StmtKind::Throw(_) => return Flow::Exits,
            }
        }

        if may_exit {
            Flow::MayExit
        } else {
            Flow::Continues
        }
    }

    fn scan_expression_statement(
        &self,
        expr: &Expr,
        span: Span,
        ctx: &ScanContext,
        placement: Placement,
        state: &mut ScanState,
    ) {
        match expr {
            Expr::Assign { target, value } => {
                let Some(member) = self.assigned_member(target, &ctx.scope) else {
                    return;
                };
                if matches!(**value, Expr::Assign { .. }) {
                    trace!(%member, "ignoring chained assignment");
                    return;
                }
                let candidate = self.candidate(member, value, span, ctx, placement);
                state.candidates.entry(member).or_default().push(candidate);
            }
            Expr::Call { .. } => {
                if let Some(SymbolRef::Method(id)) = self.model.resolve(expr, &ctx.scope) {
                    let followable = self
                        .model
                        .method(id)
                        .is_some_and(|m| !m.is_virtual && m.body.is_some());
                    if followable {
                        state.calls.push_back(id);
                    }
                }
            }
            _ => {}
        }
    }

    /// The member a simple `X = ..` or `this.X = ..` assignment writes
    ///
    /// Compound targets (`a.X`, `this.a.X`, `X[i]`) and static members are not
    /// placement subjects.
    fn assigned_member(&self, target: &Expr, scope: &BodyScope) -> Option<MemberId> {
        let direct = match target {
            Expr::Name(_) => true,
            Expr::Member { target, .. } => matches!(**target, Expr::This),
            _ => false,
        };
        if !direct {
            return None;
        }
        match self.model.resolve(target, scope)? {
            SymbolRef::Member(id) if self.model.member(id)?.decl.is_instance() => Some(id),
            _ => None,
        }
    }

    fn candidate(
        &self,
        member: MemberId,
        value: &Expr,
        span: Span,
        ctx: &ScanContext,
        placement: Placement,
    ) -> InitializationCandidate {
        let classifier = Classifier::new(self.model, &ctx.scope);
        let mut disqualifiers = SmallVec::new();

        if value.contains_error() {
            disqualifiers.push(Disqualifier::Unresolved);
        }
        if classifier.references_constructor_input(value) {
            disqualifiers.push(Disqualifier::ConstructorInput);
        }
        if classifier.references_instance_state(value) {
            disqualifiers.push(Disqualifier::InstanceState);
        }
        if classifier.references_local(value) {
            disqualifiers.push(Disqualifier::LocalValue);
        }
        if ctx.ctor_has_params && classifier.invokes_non_static_operation(value) {
            disqualifiers.push(Disqualifier::NonStaticCall);
        }
        if matches!(ctx.origin, CandidateOrigin::CalledMethod { .. }) {
            disqualifiers.push(Disqualifier::CalledMethod);
        }

        InitializationCandidate {
            member,
            value: classifier.init_value(value),
            span,
            origin: ctx.origin,
            placement,
            disqualifiers,
        }
    }
}

/// Members a constructor assigns only inside branches or loops
fn mark_conditional_only(candidates: &mut CandidateMap) {
    for list in candidates.values_mut() {
        let straight_line = list.iter().any(|c| c.placement == Placement::StraightLine);
        if !straight_line {
            for candidate in list.iter_mut() {
                candidate.flag(Disqualifier::ConditionalOnly);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::{BinOp, MemberDecl, MethodDecl, Param, TypeDecl, TypeRef};
    use crate::semantic::DeclarationModel;

    fn collect(decl: &TypeDecl, index: usize) -> CandidateMap {
        let model = DeclarationModel::new(decl);
        let cancel = CancellationToken::new();
        ConstructorWalker::new(&model, &cancel)
            .collect_candidates(index, &decl.constructors[index])
            .expect("walk succeeds")
    }

    fn counter(body: Vec<Stmt>) -> TypeDecl {
        TypeDecl::new("Counter")
            .with_member(MemberDecl::field(TypeRef::int(), "Count"))
            .with_member(MemberDecl::field(TypeRef::int(), "Other"))
            .with_constructor(ConstructorDecl::parameterless(body))
    }

    const COUNT: MemberId = MemberId {
        declaration: 0,
        declarator: 0,
    };
    const OTHER: MemberId = MemberId {
        declaration: 1,
        declarator: 0,
    };

    #[test]
    fn test_collects_direct_and_this_qualified_assignments() {
        let decl = counter(vec![
            Stmt::assign(Expr::name("Count"), Expr::int(1)).at(Span::line(2)),
            Stmt::assign(Expr::this_member("Other"), Expr::int(2)).at(Span::line(3)),
        ]);
        let found = collect(&decl, 0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[&COUNT][0].span, Span::line(2));
        assert!(found[&OTHER][0].is_clean());
    }

    #[test]
    fn test_ignores_chains_and_compound_targets() {
        let decl = counter(vec![
            Stmt::assign(Expr::name("Count"), Expr::assign(Expr::name("Other"), Expr::int(0))),
            Stmt::assign(Expr::member(Expr::name("helper"), "Count"), Expr::int(1)),
            Stmt::assign(
                Expr::Index {
                    target: Box::new(Expr::name("Other")),
                    args: vec![Expr::int(0)],
                },
                Expr::int(1),
            ),
        ]);
        assert!(collect(&decl, 0).is_empty());
    }

    #[test]
    fn test_branch_only_assignment_is_conditional() {
        let decl = counter(vec![
            Stmt::assign(Expr::name("Other"), Expr::int(1)),
            Stmt::if_then(
                Expr::bool(true),
                vec![Stmt::assign(Expr::name("Count"), Expr::int(5))],
                Some(vec![Stmt::assign(Expr::name("Other"), Expr::int(1))]),
            ),
        ]);
        let found = collect(&decl, 0);
        assert_eq!(found[&COUNT][0].disqualifiers.as_slice(), &[Disqualifier::ConditionalOnly]);
        assert_eq!(found[&OTHER].len(), 2);
        assert!(found[&OTHER].iter().all(InitializationCandidate::is_clean));
    }

    #[test]
    fn test_early_return_makes_rest_conditional() {
        let decl = counter(vec![
            Stmt::if_then(Expr::bool(true), vec![Stmt::ret()], None),
            Stmt::assign(Expr::name("Count"), Expr::int(5)),
        ]);
        let found = collect(&decl, 0);
        assert_eq!(found[&COUNT][0].placement, Placement::Conditional);
        assert!(found[&COUNT][0].disqualifiers.contains(&Disqualifier::ConditionalOnly));
    }

    #[test]
    fn test_statements_after_return_are_unreachable() {
        let decl = counter(vec![Stmt::ret(), Stmt::assign(Expr::name("Count"), Expr::int(5))]);
        assert!(collect(&decl, 0).is_empty());
    }

    #[test]
    fn test_local_shadowing_a_member_is_not_collected() {
        let decl = counter(vec![
            Stmt::local("Count", Expr::int(0)),
            Stmt::assign(Expr::name("Count"), Expr::int(3)),
            Stmt::assign(Expr::this_member("Count"), Expr::name("Count")),
        ]);
        let found = collect(&decl, 0);
        assert_eq!(found[&COUNT].len(), 1);
        assert_eq!(found[&COUNT][0].disqualifiers.as_slice(), &[Disqualifier::LocalValue]);
    }

    #[test]
    fn test_local_declared_in_branch_does_not_hide_earlier_assignment() {
        let decl = TypeDecl::new("Counter")
            .with_member(MemberDecl::field(TypeRef::int(), "Count"))
            .with_constructor(ConstructorDecl::new(
                vec![Param::new("flag", TypeRef::bool())],
                vec![
                    Stmt::assign(Expr::name("Count"), Expr::int(2)).at(Span::line(4)),
                    Stmt::if_then(
                        Expr::name("flag"),
                        vec![
                            Stmt::local("Count", Expr::int(0)),
                            Stmt::assign(Expr::name("Count"), Expr::int(9)),
                        ],
                        None,
                    ),
                    Stmt::block(vec![Stmt::assign(Expr::name("Count"), Expr::int(2)).at(Span::line(8))]),
                ],
            ));
        let found = collect(&decl, 0);
        let spans: Vec<_> = found[&COUNT].iter().map(|c| c.span).collect();
        assert_eq!(spans, vec![Span::line(4), Span::line(8)]);
        assert!(found[&COUNT].iter().all(InitializationCandidate::is_clean));
    }

    #[test]
    fn test_parameter_and_non_static_call_disqualify() {
        let decl = TypeDecl::new("Item")
            .with_member(MemberDecl::field(TypeRef::int(), "Id"))
            .with_member(MemberDecl::field(TypeRef::string(), "Label"))
            .with_constructor(ConstructorDecl::new(
                vec![Param::new("id", TypeRef::int())],
                vec![
                    Stmt::assign(Expr::name("Id"), Expr::binary(BinOp::Add, Expr::name("id"), Expr::int(1))),
                    Stmt::assign(Expr::name("Label"), Expr::call(Expr::member(Expr::string("x"), "Trim"), vec![])),
                ],
            ));
        let found = collect(&decl, 0);
        assert_eq!(found[&COUNT][0].disqualifiers.as_slice(), &[Disqualifier::ConstructorInput]);
        assert_eq!(found[&OTHER][0].disqualifiers.as_slice(), &[Disqualifier::NonStaticCall]);
    }

    #[test]
    fn test_follows_helpers_transitively_with_revisit_guard() {
        let decl = counter(vec![Stmt::expr(Expr::call(Expr::name("Setup"), vec![]))])
            .with_method(MethodDecl::new(
                "Setup",
                vec![
                    Stmt::assign(Expr::name("Count"), Expr::int(1)).at(Span::line(20)),
                    Stmt::expr(Expr::call(Expr::this_member("Reset"), vec![])),
                ],
            ))
            .with_method(MethodDecl::new(
                "Reset",
                vec![
                    Stmt::assign(Expr::name("Other"), Expr::int(0)),
                    Stmt::expr(Expr::call(Expr::name("Setup"), vec![])),
                ],
            ));
        let found = collect(&decl, 0);
        assert_eq!(found[&COUNT].len(), 1);
        assert_eq!(found[&COUNT][0].span, Span::line(20));
        assert!(found[&COUNT][0].disqualifiers.contains(&Disqualifier::CalledMethod));
        assert_eq!(
            found[&OTHER][0].origin,
            CandidateOrigin::CalledMethod {
                constructor: 0,
                method: MethodId(1)
            }
        );
    }

    #[test]
    fn test_virtual_helpers_are_not_followed() {
        let decl = counter(vec![Stmt::expr(Expr::call(Expr::name("Init"), vec![]))])
            .with_method(MethodDecl::new("Init", vec![Stmt::assign(Expr::name("Count"), Expr::int(1))]).virtual_method());
        assert!(collect(&decl, 0).is_empty());
    }

    #[test]
    fn test_chaining_constructor_is_skipped() {
        let decl = TypeDecl::new("Counter")
            .with_member(MemberDecl::field(TypeRef::int(), "Count"))
            .with_constructor(
                ConstructorDecl::parameterless(vec![Stmt::assign(Expr::name("Count"), Expr::int(1))])
                    .chaining(vec![Expr::int(0)]),
            );
        assert!(collect(&decl, 0).is_empty());
    }

    #[test]
    fn test_cancelled_walk_returns_error() {
        let decl = counter(vec![Stmt::assign(Expr::name("Count"), Expr::int(1))]);
        let model = DeclarationModel::new(&decl);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = ConstructorWalker::new(&model, &cancel).collect_candidates(0, &decl.constructors[0]);
        assert!(matches!(result, Err(AnalysisError::Cancelled { .. })));
    }
}
