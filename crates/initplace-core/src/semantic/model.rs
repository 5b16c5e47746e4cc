//! Reference [`SemanticModel`] built directly over a type declaration

use super::constant::{self, ConstValue};
use super::{BodyScope, MemberId, MethodId, SemanticModel, SymbolRef};
use crate::hir::{BinOp, Expr, Literal, TypeDecl, TypeRef};
use std::collections::HashSet;

/// Binds names against one [`TypeDecl`] plus a set of externally known type names
///
/// Simple names resolve in this order: local, parameter, member, method, the
/// declared type itself, built-in types, known types. Anything else is
/// [`SymbolRef::Unresolved`].
#[derive(Debug, Clone)]
pub struct DeclarationModel<'a> {
    decl: &'a TypeDecl,
    known_types: HashSet<String>,
}

impl<'a> DeclarationModel<'a> {
    pub fn new(decl: &'a TypeDecl) -> Self {
        Self {
            decl,
            known_types: HashSet::new(),
        }
    }

    /// Type names that may appear as static receivers, e.g. `Math` in `Math.Max(a, b)`
    pub fn with_known_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_types.extend(names.into_iter().map(Into::into));
        self
    }

    fn find_member(&self, name: &str) -> Option<MemberId> {
        self.decl.members.iter().enumerate().find_map(|(i, member)| {
            member
                .declarators
                .iter()
                .position(|d| d.name == name)
                .map(|j| MemberId::new(i, j))
        })
    }

    fn find_method(&self, name: &str, arity: Option<usize>) -> Option<MethodId> {
        self.decl
            .methods
            .iter()
            .position(|m| m.name == name && arity.is_none_or(|n| m.params.len() == n))
            .map(|i| MethodId(i as u32))
    }

    fn is_type_name(&self, name: &str) -> bool {
        name == self.decl.name || is_builtin_type(name) || self.known_types.contains(name)
    }

    fn resolve_name(&self, name: &str, scope: &BodyScope) -> SymbolRef {
        if let Some(id) = scope.lookup_local(name) {
            SymbolRef::Local(id)
        } else if scope.param(name).is_some() {
            SymbolRef::Parameter(name.to_string())
        } else if let Some(id) = self.find_member(name) {
            SymbolRef::Member(id)
        } else if let Some(id) = self.find_method(name, None) {
            SymbolRef::Method(id)
        } else if self.is_type_name(name) {
            SymbolRef::Type(name.to_string())
        } else {
            SymbolRef::Unresolved
        }
    }

    /// Receiver kind of `target.name`
    fn receiver(&self, target: &Expr, scope: &BodyScope) -> Receiver {
        match target {
            Expr::This => Receiver::This,
            Expr::Error => Receiver::Unknown,
            Expr::Name(name) => match self.resolve_name(name, scope) {
                SymbolRef::Type(ty) if ty == self.decl.name => Receiver::OwnType,
                SymbolRef::Type(_) => Receiver::OtherType,
                SymbolRef::Unresolved => Receiver::Unknown,
                _ => Receiver::Instance,
            },
            _ => Receiver::Instance,
        }
    }

    fn resolve_member_access(&self, target: &Expr, name: &str, scope: &BodyScope) -> SymbolRef {
        match self.receiver(target, scope) {
            Receiver::This => self.find_member(name).map_or(SymbolRef::Unresolved, SymbolRef::Member),
            Receiver::OwnType => self
                .find_member(name)
                .filter(|id| self.member(*id).is_some_and(|m| !m.decl.is_instance()))
                .map_or(SymbolRef::Unresolved, SymbolRef::Member),
            Receiver::OtherType => SymbolRef::ExternalMember { is_static: true },
            Receiver::Instance => SymbolRef::ExternalMember { is_static: false },
            Receiver::Unknown => SymbolRef::Unresolved,
        }
    }

    fn resolve_invocation(&self, callee: &Expr, arity: usize, scope: &BodyScope) -> SymbolRef {
        match callee {
            Expr::Name(name) => {
                if scope.lookup_local(name).is_some() || scope.param(name).is_some() {
                    // delegate invocation
                    return SymbolRef::ExternalMethod { is_static: false };
                }
                self.find_method(name, Some(arity))
                    .map_or(SymbolRef::Unresolved, SymbolRef::Method)
            }
            Expr::Member { target, name } => match self.receiver(target, scope) {
                Receiver::This => self
                    .find_method(name, Some(arity))
                    .map_or(SymbolRef::Unresolved, SymbolRef::Method),
                Receiver::OwnType => self
                    .find_method(name, Some(arity))
                    .filter(|id| self.method(*id).is_some_and(|m| m.is_static))
                    .map_or(SymbolRef::Unresolved, SymbolRef::Method),
                Receiver::OtherType => SymbolRef::ExternalMethod { is_static: true },
                Receiver::Instance => SymbolRef::ExternalMethod { is_static: false },
                Receiver::Unknown => SymbolRef::Unresolved,
            },
            _ => SymbolRef::ExternalMethod { is_static: false },
        }
    }
}

/// Keyword types and their framework names; always valid static receivers
const BUILTIN_TYPES: &[(&str, &str)] = &[
    ("bool", "Boolean"),
    ("byte", "Byte"),
    ("sbyte", "SByte"),
    ("short", "Int16"),
    ("ushort", "UInt16"),
    ("int", "Int32"),
    ("uint", "UInt32"),
    ("long", "Int64"),
    ("ulong", "UInt64"),
    ("nint", "IntPtr"),
    ("nuint", "UIntPtr"),
    ("float", "Single"),
    ("double", "Double"),
    ("decimal", "Decimal"),
    ("char", "Char"),
    ("string", "String"),
    ("object", "Object"),
];

fn is_builtin_type(name: &str) -> bool {
    let framework = name.strip_prefix("System.").unwrap_or(name);
    BUILTIN_TYPES
        .iter()
        .any(|(keyword, type_name)| name == *keyword || framework == *type_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Receiver {
    This,
    OwnType,
    OtherType,
    Instance,
    Unknown,
}

impl SemanticModel for DeclarationModel<'_> {
    fn declaration(&self) -> &TypeDecl {
        self.decl
    }

    fn resolve(&self, expr: &Expr, scope: &BodyScope) -> Option<SymbolRef> {
        match expr {
            Expr::Name(name) => Some(self.resolve_name(name, scope)),
            Expr::This => Some(SymbolRef::This),
            Expr::Member { target, name } => Some(self.resolve_member_access(target, name, scope)),
            Expr::Call { callee, args } => Some(self.resolve_invocation(callee, args.len(), scope)),
            Expr::Error => Some(SymbolRef::Unresolved),
            _ => None,
        }
    }

    fn constant_value(&self, expr: &Expr, scope: &BodyScope) -> Option<ConstValue> {
        constant::fold(self, expr, scope, 0)
    }

    fn type_of(&self, expr: &Expr, scope: &BodyScope) -> Option<TypeRef> {
        match expr {
            Expr::Literal(lit) => match lit {
                Literal::Null => None,
                Literal::Bool(_) => Some(TypeRef::bool()),
                Literal::Int(_) => Some(TypeRef::int()),
                Literal::Float(_) => Some(TypeRef::value("double")),
                Literal::Char(_) => Some(TypeRef::value("char")),
                Literal::String(_) => Some(TypeRef::string()),
            },
            Expr::New { ty, .. } | Expr::Cast { ty, .. } | Expr::Default(Some(ty)) => Some(ty.clone()),
            Expr::NewArray { element, .. } => Some(TypeRef::reference(format!("{}[]", element.name))),
            Expr::Binary { op, left, .. } => match op {
                BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq | BinOp::And | BinOp::Or => {
                    Some(TypeRef::bool())
                }
                _ => self.type_of(left, scope),
            },
            Expr::Unary { operand, .. } => self.type_of(operand, scope),
            Expr::Conditional { then_expr, .. } => self.type_of(then_expr, scope),
            Expr::Name(_) | Expr::Member { .. } => match self.resolve(expr, scope)? {
                SymbolRef::Parameter(name) => scope.param(&name).cloned(),
                SymbolRef::Local(id) => {
                    let local = scope.local(id)?;
                    match &local.ty {
                        Some(ty) => Some(ty.clone()),
                        None => local.values.first().and_then(|v| self.type_of(&v.expr, &scope.at(v.block))),
                    }
                }
                SymbolRef::Member(id) => self.member(id).map(|m| m.ty().clone()),
                _ => None,
            },
            _ => None,
        }
    }
}
