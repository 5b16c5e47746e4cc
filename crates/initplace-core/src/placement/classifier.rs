//! Expression classification for initialization candidates
//!
//! Every query first tries a syntactic shortcut (literal, closed expression)
//! and only then asks the semantic model. An expression the model cannot bind
//! is treated as unsafe to hoist.

use crate::hir::{Expr, PrimitiveKind, TypeRef};
use crate::semantic::{BodyScope, ConstValue, LocalId, SemanticModel, SymbolRef};
use std::collections::HashSet;

/// An assigned value together with its folded constant, if any
#[derive(Debug, Clone, PartialEq)]
pub struct InitValue {
    pub expr: Expr,
    pub constant: Option<ConstValue>,
}

/// Coarse structural equivalence: same operation kind, equal constants when
/// both sides have one, otherwise identical syntax.
///
/// Two differently written expressions with equal runtime values but no
/// constant value compare unequal; that costs recall, never precision.
pub fn are_equivalent(a: &InitValue, b: &InitValue) -> bool {
    if a.expr.kind() != b.expr.kind() {
        return false;
    }
    match (&a.constant, &b.constant) {
        (Some(x), Some(y)) => x == y,
        (None, None) => a.expr == b.expr,
        _ => false,
    }
}

/// Pure queries over expressions of one body
pub struct Classifier<'a> {
    model: &'a dyn SemanticModel,
    scope: &'a BodyScope,
}

impl<'a> Classifier<'a> {
    pub fn new(model: &'a dyn SemanticModel, scope: &'a BodyScope) -> Self {
        Self { model, scope }
    }

    pub fn init_value(&self, expr: &Expr) -> InitValue {
        InitValue {
            expr: expr.clone(),
            constant: self.model.constant_value(expr, self.scope),
        }
    }

    pub fn is_compile_time_constant(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::Literal(_)) || self.model.constant_value(expr, self.scope).is_some()
    }

    /// Whether `expr` evaluates to the value `target` already holds before any initializer
    pub fn is_default_value(&self, expr: &Expr, target: &TypeRef) -> bool {
        match expr {
            Expr::Default(_) => return true,
            Expr::New { args, initializer, .. } => {
                return args.is_empty()
                    && initializer.as_ref().is_none_or(Vec::is_empty)
                    && target.is_value_type()
                    && self.model.type_of(expr, self.scope).is_some_and(|ty| ty.is_value_type());
            }
            Expr::Member { target: receiver, name } if name == "Empty" => {
                if let Expr::Name(ty) = &**receiver {
                    if matches!(ty.as_str(), "string" | "String" | "System.String") {
                        return target.primitive() == PrimitiveKind::String;
                    }
                }
            }
            _ => {}
        }

        let Some(value) = self.model.constant_value(expr, self.scope) else {
            return false;
        };
        match (value, target.primitive()) {
            (ConstValue::Null, _) => target.admits_null(),
            (_, _) if !target.is_value_type() && target.primitive() != PrimitiveKind::String => false,
            (v @ (ConstValue::Int(_) | ConstValue::Float(_) | ConstValue::Char(_)), PrimitiveKind::Integral)
            | (v @ (ConstValue::Int(_) | ConstValue::Float(_) | ConstValue::Char(_)), PrimitiveKind::Floating)
            | (v @ (ConstValue::Char(_) | ConstValue::Int(_)), PrimitiveKind::Char) => v.is_zero(),
            // enums: the zero member
            (v @ ConstValue::Int(_), PrimitiveKind::Other) => v.is_zero(),
            (ConstValue::Bool(b), PrimitiveKind::Bool) => !b,
            (ConstValue::String(s), PrimitiveKind::String) => s.is_empty(),
            _ => false,
        }
    }

    /// Whether any part of `expr` derives from a constructor parameter,
    /// directly or through the values assigned to a local
    pub fn references_constructor_input(&self, expr: &Expr) -> bool {
        if expr.is_closed() || self.is_compile_time_constant(expr) {
            return false;
        }
        self.input_dependent(expr, self.scope, &mut HashSet::new())
    }

    /// Locals are followed into the values written to them, each resolved in
    /// the block it was written in
    fn input_dependent(&self, expr: &Expr, scope: &BodyScope, visiting: &mut HashSet<LocalId>) -> bool {
        match self.model.resolve(expr, scope) {
            Some(SymbolRef::Parameter(_)) | Some(SymbolRef::Unresolved) => return true,
            Some(SymbolRef::Local(id)) => {
                if !visiting.insert(id) {
                    return false;
                }
                return match scope.local(id) {
                    Some(local) => local
                        .values
                        .iter()
                        .any(|v| self.input_dependent(&v.expr, &scope.at(v.block), visiting)),
                    None => true,
                };
            }
            _ => {}
        }
        value_operands(expr)
            .into_iter()
            .any(|e| self.input_dependent(e, scope, visiting))
    }

    /// Whether `expr` observes the instance under construction: `this`, an
    /// instance member, or an instance method of the declared type
    pub fn references_instance_state(&self, expr: &Expr) -> bool {
        if expr.is_closed() || self.is_compile_time_constant(expr) {
            return false;
        }
        let observes = match self.model.resolve(expr, self.scope) {
            Some(SymbolRef::This) => true,
            Some(SymbolRef::Member(id)) => self.model.member(id).is_some_and(|m| m.decl.is_instance()),
            Some(SymbolRef::Method(id)) => self.model.method(id).is_some_and(|m| !m.is_static),
            _ => false,
        };
        observes || value_operands(expr).into_iter().any(|e| self.references_instance_state(e))
    }

    /// Whether `expr` reads a local of the body; such a value cannot be
    /// written in a member declaration
    pub fn references_local(&self, expr: &Expr) -> bool {
        if expr.is_closed() {
            return false;
        }
        matches!(self.model.resolve(expr, self.scope), Some(SymbolRef::Local(_)))
            || value_operands(expr).into_iter().any(|e| self.references_local(e))
    }

    /// Whether `expr` contains a call whose target is not a static member
    pub fn invokes_non_static_operation(&self, expr: &Expr) -> bool {
        if let Expr::Call { .. } = expr {
            let is_static = match self.model.resolve(expr, self.scope) {
                Some(SymbolRef::Method(id)) => self.model.method(id).is_some_and(|m| m.is_static),
                Some(SymbolRef::ExternalMethod { is_static }) => is_static,
                _ => false,
            };
            if !is_static {
                return true;
            }
        }
        value_operands(expr).into_iter().any(|e| self.invokes_non_static_operation(e))
    }
}

/// Sub-expressions that contribute to the value of `expr`
///
/// Object initializer entries `Prop = value` name a member of the created
/// object, not of the declared type, so only their value side is visited.
fn value_operands(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::New {
            args,
            initializer: Some(entries),
            ..
        } => args
            .iter()
            .chain(entries.iter().map(|entry| match entry {
                Expr::Assign { target, value } if matches!(**target, Expr::Name(_)) => &**value,
                other => other,
            }))
            .collect(),
        other => other.children(),
    }
}
