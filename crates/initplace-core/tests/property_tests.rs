//! Property tests for the placement engine

use initplace_core::hir::{BinOp, ConstructorDecl, Expr, MemberDecl, MethodDecl, Param, Stmt, TypeDecl, TypeRef};
use initplace_core::placement::{
    are_equivalent, CandidateOrigin, Classifier, Disqualifier, InitValue, InitializationCandidate,
    InitializationLedger, Placement, PlacementAnalyzer,
};
use initplace_core::semantic::{BodyScope, MemberId};
use initplace_core::DeclarationModel;
use proptest::prelude::*;
use smallvec::SmallVec;

const MEMBERS: [&str; 3] = ["Alpha", "Beta", "Gamma"];

fn value_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (0i64..3).prop_map(Expr::int),
        Just(Expr::string("")),
        Just(Expr::string("x")),
        Just(Expr::bool(false)),
        Just(Expr::name("arg")),
        Just(Expr::name("Limit")),
        Just(Expr::This),
        Just(Expr::new_array(TypeRef::value("byte"), Expr::int(4))),
    ];
    leaf.prop_recursive(2, 8, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| Expr::binary(BinOp::Add, l, r)),
            inner.prop_map(|e| Expr::call(Expr::member(Expr::name("Math"), "Abs"), vec![e])),
        ]
    })
}

fn assignment() -> impl Strategy<Value = Stmt> {
    (0..MEMBERS.len(), value_expr(), any::<bool>(), any::<bool>()).prop_map(|(member, value, qualified, guarded)| {
        let target = if qualified {
            Expr::this_member(MEMBERS[member])
        } else {
            Expr::name(MEMBERS[member])
        };
        let stmt = Stmt::assign(target, value);
        if guarded {
            Stmt::if_then(Expr::name("arg"), vec![stmt], None)
        } else {
            stmt
        }
    })
}

fn constructor() -> impl Strategy<Value = ConstructorDecl> {
    (prop::collection::vec(assignment(), 0..4), any::<bool>(), any::<bool>()).prop_map(|(mut body, with_param, calls_helper)| {
        if calls_helper {
            body.push(Stmt::expr(Expr::call(Expr::name("Init"), vec![])));
        }
        let params = if with_param {
            vec![Param::new("arg", TypeRef::int())]
        } else {
            vec![]
        };
        ConstructorDecl::new(params, body)
    })
}

fn type_decl() -> impl Strategy<Value = TypeDecl> {
    (
        prop::collection::vec(prop::option::of(value_expr()), MEMBERS.len()),
        prop::collection::vec(constructor(), 0..4),
        prop::collection::vec(assignment(), 0..3),
    )
        .prop_map(|(initializers, constructors, helper_body)| {
            let mut decl = TypeDecl::new("Generated")
                .with_member(MemberDecl::field(TypeRef::int(), "Limit").initialized(Expr::int(2)).constant())
                .with_method(MethodDecl::new("Init", helper_body));
            for (name, init) in MEMBERS.iter().zip(initializers) {
                let mut member = MemberDecl::field(TypeRef::int(), *name);
                if let Some(init) = init {
                    member = member.initialized(init);
                }
                decl = decl.with_member(member);
            }
            for ctor in constructors {
                decl = decl.with_constructor(ctor);
            }
            decl
        })
}

fn candidate(member: u32, value: i64, flagged: bool) -> InitializationCandidate {
    let mut disqualifiers = SmallVec::new();
    if flagged {
        disqualifiers.push(Disqualifier::ConditionalOnly);
    }
    InitializationCandidate {
        member: MemberId {
            declaration: member,
            declarator: 0,
        },
        value: InitValue {
            expr: Expr::int(value),
            constant: Some(initplace_core::semantic::ConstValue::Int(value)),
        },
        span: Default::default(),
        origin: CandidateOrigin::Constructor(0),
        placement: Placement::StraightLine,
        disqualifiers,
    }
}

proptest! {
    #[test]
    fn prop_analysis_is_idempotent(decl in type_decl()) {
        let model = DeclarationModel::new(&decl).with_known_types(["Math"]);
        let first = PlacementAnalyzer::new(&model).analyze().unwrap();
        let second = PlacementAnalyzer::new(&model).analyze().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_at_most_one_finding_per_member(decl in type_decl()) {
        let model = DeclarationModel::new(&decl).with_known_types(["Math"]);
        let findings = PlacementAnalyzer::new(&model).analyze().unwrap();
        let mut names: Vec<_> = findings.iter().map(|f| f.member.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        prop_assert_eq!(names.len(), total);
    }

    #[test]
    fn prop_disqualification_is_monotonic(
        ops in prop::collection::vec((0u32..3, 0i64..3, any::<bool>()), 1..24)
    ) {
        let mut ledger = InitializationLedger::new();
        let mut seen = std::collections::HashSet::new();
        for (member, value, flagged) in ops {
            ledger.record(candidate(member, value, flagged));
            for id in &seen {
                prop_assert!(ledger.is_disqualified(*id));
            }
            seen.extend(ledger.iter().filter(|(_, r)| r.is_disqualified()).map(|(id, _)| id));
        }
        prop_assert!(ledger.check_invariant().is_ok());
    }

    #[test]
    fn prop_equivalence_is_symmetric(a in value_expr(), b in value_expr()) {
        let decl = TypeDecl::new("Generated")
            .with_member(MemberDecl::field(TypeRef::int(), "Limit").initialized(Expr::int(2)).constant());
        let model = DeclarationModel::new(&decl).with_known_types(["Math"]);
        let scope = BodyScope::from_body(&[Param::new("arg", TypeRef::int())], &[]);
        let classifier = Classifier::new(&model, &scope);
        let (a, b) = (classifier.init_value(&a), classifier.init_value(&b));
        prop_assert_eq!(are_equivalent(&a, &b), are_equivalent(&b, &a));
        prop_assert!(are_equivalent(&a, &a));
    }
}
