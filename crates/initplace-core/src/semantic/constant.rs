//! Compile-time constant folding

use super::{BodyScope, SemanticModel, SymbolRef};
use crate::hir::{BinOp, Expr, Literal, PrimitiveKind, TypeRef, UnaryOp};
use std::fmt;

/// Const members referencing each other deeper than this are treated as non-constant
const MAX_FOLD_DEPTH: usize = 32;

/// A value fixed at build time
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    String(String),
}

impl ConstValue {
    pub fn is_zero(&self) -> bool {
        match self {
            ConstValue::Int(i) => *i == 0,
            ConstValue::Float(f) => *f == 0.0,
            ConstValue::Char(c) => *c == '\0',
            _ => false,
        }
    }

    fn from_literal(lit: &Literal) -> Self {
        match lit {
            Literal::Null => ConstValue::Null,
            Literal::Bool(b) => ConstValue::Bool(*b),
            Literal::Int(i) => ConstValue::Int(*i),
            Literal::Float(f) => ConstValue::Float(*f),
            Literal::Char(c) => ConstValue::Char(*c),
            Literal::String(s) => ConstValue::String(s.clone()),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Int(i) => Some(*i as f64),
            ConstValue::Float(f) => Some(*f),
            ConstValue::Char(c) => Some(u32::from(*c) as f64),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            ConstValue::Int(i) => Some(*i),
            ConstValue::Char(c) => Some(i64::from(u32::from(*c))),
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => Ok(()),
            ConstValue::Bool(true) => write!(f, "True"),
            ConstValue::Bool(false) => write!(f, "False"),
            ConstValue::Int(i) => write!(f, "{i}"),
            ConstValue::Float(x) => write!(f, "{x}"),
            ConstValue::Char(c) => write!(f, "{c}"),
            ConstValue::String(s) => write!(f, "{s}"),
        }
    }
}

/// Fold `expr` to a constant within `scope`
pub(crate) fn fold(model: &dyn SemanticModel, expr: &Expr, scope: &BodyScope, depth: usize) -> Option<ConstValue> {
    if depth > MAX_FOLD_DEPTH {
        return None;
    }
    match expr {
        Expr::Literal(lit) => Some(ConstValue::from_literal(lit)),
        Expr::Name(_) | Expr::Member { .. } => fold_const_member(model, expr, scope, depth),
        Expr::Unary { op, operand } => fold_unary(*op, fold(model, operand, scope, depth)?),
        Expr::Binary { op, left, right } => {
            let left = fold(model, left, scope, depth)?;
            if *op == BinOp::Coalesce {
                return match left {
                    ConstValue::Null => fold(model, right, scope, depth),
                    other => Some(other),
                };
            }
            fold_binary(*op, left, fold(model, right, scope, depth)?)
        }
        Expr::Conditional {
            cond,
            then_expr,
            else_expr,
        } => match fold(model, cond, scope, depth)? {
            ConstValue::Bool(true) => fold(model, then_expr, scope, depth),
            ConstValue::Bool(false) => fold(model, else_expr, scope, depth),
            _ => None,
        },
        Expr::Default(Some(ty)) => default_constant(ty),
        Expr::Cast { ty, operand } => convert(fold(model, operand, scope, depth)?, ty),
        _ => None,
    }
}

fn fold_const_member(model: &dyn SemanticModel, expr: &Expr, scope: &BodyScope, depth: usize) -> Option<ConstValue> {
    let SymbolRef::Member(id) = model.resolve(expr, scope)? else {
        return None;
    };
    let member = model.member(id)?;
    if !member.decl.modifiers.is_const {
        return None;
    }
    let init = member.declarator.initializer.as_ref()?;
    let value = fold(model, init, &BodyScope::empty(), depth + 1)?;
    convert(value, member.ty())
}

fn default_constant(ty: &TypeRef) -> Option<ConstValue> {
    if !ty.is_value_type() {
        return ty.admits_null().then_some(ConstValue::Null);
    }
    match ty.primitive() {
        PrimitiveKind::Integral => Some(ConstValue::Int(0)),
        PrimitiveKind::Floating => Some(ConstValue::Float(0.0)),
        PrimitiveKind::Bool => Some(ConstValue::Bool(false)),
        PrimitiveKind::Char => Some(ConstValue::Char('\0')),
        PrimitiveKind::String | PrimitiveKind::Other => None,
    }
}

/// Implicit or explicit conversion of a constant to `ty`
fn convert(value: ConstValue, ty: &TypeRef) -> Option<ConstValue> {
    match (ty.primitive(), value) {
        (_, ConstValue::Null) => ty.admits_null().then_some(ConstValue::Null),
        (PrimitiveKind::Integral, v) => v.as_i64().map(ConstValue::Int),
        (PrimitiveKind::Floating, v) => v.as_f64().map(ConstValue::Float),
        (PrimitiveKind::Char, ConstValue::Char(c)) => Some(ConstValue::Char(c)),
        (PrimitiveKind::Char, ConstValue::Int(i)) => u32::try_from(i).ok().and_then(char::from_u32).map(ConstValue::Char),
        (PrimitiveKind::Bool, v @ ConstValue::Bool(_)) => Some(v),
        (PrimitiveKind::String, v @ ConstValue::String(_)) => Some(v),
        // enums and other named types keep the underlying value
        (PrimitiveKind::Other, v) => Some(v),
        _ => None,
    }
}

fn fold_unary(op: UnaryOp, value: ConstValue) -> Option<ConstValue> {
    match (op, value) {
        (UnaryOp::Plus, v @ (ConstValue::Int(_) | ConstValue::Float(_))) => Some(v),
        (UnaryOp::Neg, ConstValue::Int(i)) => i.checked_neg().map(ConstValue::Int),
        (UnaryOp::Neg, ConstValue::Float(f)) => Some(ConstValue::Float(-f)),
        (UnaryOp::Not, ConstValue::Bool(b)) => Some(ConstValue::Bool(!b)),
        (UnaryOp::BitNot, ConstValue::Int(i)) => Some(ConstValue::Int(!i)),
        _ => None,
    }
}

fn fold_binary(op: BinOp, left: ConstValue, right: ConstValue) -> Option<ConstValue> {
    use ConstValue as C;

    match (&left, &right) {
        (C::String(_), _) | (_, C::String(_)) if op == BinOp::Add => {
            Some(C::String(format!("{left}{right}")))
        }
        (C::Int(a), C::Int(b)) => fold_int(op, *a, *b),
        (C::Bool(a), C::Bool(b)) => fold_bool(op, *a, *b),
        (C::Float(_), C::Float(_) | C::Int(_)) | (C::Int(_), C::Float(_)) => {
            fold_float(op, left.as_f64()?, right.as_f64()?)
        }
        (C::Char(_), C::Char(_)) | (C::Char(_), C::Int(_)) | (C::Int(_), C::Char(_)) => {
            fold_int(op, left.as_i64()?, right.as_i64()?)
        }
        _ => match op {
            BinOp::Eq => Some(C::Bool(left == right)),
            BinOp::NotEq => Some(C::Bool(left != right)),
            _ => None,
        },
    }
}

fn fold_int(op: BinOp, a: i64, b: i64) -> Option<ConstValue> {
    let value = match op {
        BinOp::Add => a.checked_add(b)?,
        BinOp::Sub => a.checked_sub(b)?,
        BinOp::Mul => a.checked_mul(b)?,
        BinOp::Div => a.checked_div(b)?,
        BinOp::Rem => a.checked_rem(b)?,
        BinOp::BitAnd => a & b,
        BinOp::BitOr => a | b,
        BinOp::BitXor => a ^ b,
        BinOp::Shl => a.checked_shl(u32::try_from(b).ok()?)?,
        BinOp::Shr => a.checked_shr(u32::try_from(b).ok()?)?,
        _ => return compare(op, a.cmp(&b)),
    };
    Some(ConstValue::Int(value))
}

fn fold_float(op: BinOp, a: f64, b: f64) -> Option<ConstValue> {
    let value = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Rem => a % b,
        _ => return compare(op, a.partial_cmp(&b)?),
    };
    Some(ConstValue::Float(value))
}

fn fold_bool(op: BinOp, a: bool, b: bool) -> Option<ConstValue> {
    let value = match op {
        BinOp::And | BinOp::BitAnd => a && b,
        BinOp::Or | BinOp::BitOr => a || b,
        BinOp::BitXor | BinOp::NotEq => a != b,
        BinOp::Eq => a == b,
        _ => return None,
    };
    Some(ConstValue::Bool(value))
}

fn compare(op: BinOp, ordering: std::cmp::Ordering) -> Option<ConstValue> {
    use std::cmp::Ordering::*;

    let value = match op {
        BinOp::Eq => ordering == Equal,
        BinOp::NotEq => ordering != Equal,
        BinOp::Lt => ordering == Less,
        BinOp::LtEq => ordering != Greater,
        BinOp::Gt => ordering == Greater,
        BinOp::GtEq => ordering != Less,
        _ => return None,
    };
    Some(ConstValue::Bool(value))
}
