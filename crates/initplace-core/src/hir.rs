//! Syntax tree for a single declared type
//!
//! This is the shape the semantic facade hands to the placement engine: one
//! type declaration with its members, constructors and helper methods.
//! Expressions carry no spans, so derived equality on [`Expr`] is structural
//! equality of the written syntax. Spans live on statements and declarations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position of a statement or declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Span at the start of a line
    pub fn line(line: u32) -> Self {
        Self { line, column: 1 }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// How a type holds its value before any initializer runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Struct or primitive; defaults to its zero value
    Value,
    /// `T?` over a value type; defaults to null
    NullableValue,
    /// Non-nullable reference type; has no usable implicit default
    Reference,
    /// Reference type annotated as nullable
    NullableReference,
    /// Generic parameter; default depends on instantiation
    TypeParameter,
}

/// Primitive classification derived from a type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Integral,
    Floating,
    Bool,
    Char,
    String,
    Other,
}

/// A reference to a declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Value)
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Reference)
    }

    pub fn int() -> Self {
        Self::value("int")
    }

    pub fn bool() -> Self {
        Self::value("bool")
    }

    pub fn string() -> Self {
        Self::reference("string")
    }

    /// The nullable form of this type
    pub fn nullable(self) -> Self {
        let kind = match self.kind {
            TypeKind::Value | TypeKind::NullableValue => TypeKind::NullableValue,
            TypeKind::Reference | TypeKind::NullableReference => TypeKind::NullableReference,
            TypeKind::TypeParameter => TypeKind::TypeParameter,
        };
        Self { name: self.name, kind }
    }

    pub fn is_value_type(&self) -> bool {
        self.kind == TypeKind::Value
    }

    /// Whether `null` is a value of this type
    pub fn admits_null(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::NullableValue | TypeKind::Reference | TypeKind::NullableReference
        )
    }

    /// Non-nullable reference types cannot implicitly default to null or zero
    pub fn requires_initializer(&self) -> bool {
        self.kind == TypeKind::Reference
    }

    /// Classify the type name against the primitive keyword and framework spellings
    pub fn primitive(&self) -> PrimitiveKind {
        let name = self.name.strip_prefix("System.").unwrap_or(&self.name);
        match name {
            "sbyte" | "byte" | "short" | "ushort" | "int" | "uint" | "long" | "ulong" | "nint" | "nuint"
            | "SByte" | "Byte" | "Int16" | "UInt16" | "Int32" | "UInt32" | "Int64" | "UInt64" | "IntPtr"
            | "UIntPtr" => PrimitiveKind::Integral,
            "float" | "double" | "decimal" | "Single" | "Double" | "Decimal" => PrimitiveKind::Floating,
            "bool" | "Boolean" => PrimitiveKind::Bool,
            "char" | "Char" => PrimitiveKind::Char,
            "string" | "String" => PrimitiveKind::String,
            _ => PrimitiveKind::Other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TypeKind::NullableValue | TypeKind::NullableReference => write!(f, "{}?", self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// A type declaration under analysis
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    #[serde(default)]
    pub constructors: Vec<ConstructorDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub span: Span,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_constructor(mut self, ctor: ConstructorDecl) -> Self {
        self.constructors.push(ctor);
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    AutoProperty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_const: bool,
}

/// One field or auto-property declaration, possibly introducing several names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDecl {
    pub kind: MemberKind,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    pub declarators: Vec<Declarator>,
    #[serde(default)]
    pub span: Span,
}

impl MemberDecl {
    pub fn field(ty: TypeRef, name: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Field,
            ty,
            modifiers: Modifiers::default(),
            declarators: vec![Declarator::new(name)],
            span: Span::default(),
        }
    }

    pub fn property(ty: TypeRef, name: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::AutoProperty,
            ..Self::field(ty, name)
        }
    }

    /// Set the initializer of the first declarator
    pub fn initialized(mut self, value: Expr) -> Self {
        if let Some(first) = self.declarators.first_mut() {
            first.initializer = Some(value);
        }
        self
    }

    /// Add another name to the same declaration (`int a, b;`)
    pub fn and_declarator(mut self, declarator: Declarator) -> Self {
        self.declarators.push(declarator);
        self
    }

    pub fn constant(mut self) -> Self {
        self.modifiers.is_const = true;
        self.modifiers.is_static = true;
        self
    }

    pub fn static_member(mut self) -> Self {
        self.modifiers.is_static = true;
        self
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        for declarator in &mut self.declarators {
            if declarator.span == Span::default() {
                declarator.span = span;
            }
        }
        self
    }

    pub fn is_instance(&self) -> bool {
        !self.modifiers.is_static && !self.modifiers.is_const
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declarator {
    pub name: String,
    #[serde(default)]
    pub initializer: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

impl Declarator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initializer: None,
            span: Span::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self { name: name.into(), ty }
    }
}

/// `: this(..)` or `: base(..)` after a constructor signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorInitializer {
    This(Vec<Expr>),
    Base(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstructorDecl {
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub initializer: Option<ConstructorInitializer>,
    #[serde(default)]
    pub body: Vec<Stmt>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub span: Span,
}

impl ConstructorDecl {
    pub fn new(params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Self {
            params,
            body,
            ..Self::default()
        }
    }

    pub fn parameterless(body: Vec<Stmt>) -> Self {
        Self::new(Vec::new(), body)
    }

    pub fn chaining(mut self, args: Vec<Expr>) -> Self {
        self.initializer = Some(ConstructorInitializer::This(args));
        self
    }

    /// Delegates to a sibling constructor of the same type
    pub fn is_chaining(&self) -> bool {
        matches!(self.initializer, Some(ConstructorInitializer::This(_)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub body: Option<Vec<Stmt>>,
    #[serde(default)]
    pub is_static: bool,
    /// virtual, abstract or override
    #[serde(default)]
    pub is_virtual: bool,
    #[serde(default)]
    pub span: Span,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: Some(body),
            is_static: false,
            is_virtual: false,
            span: Span::default(),
        }
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn virtual_method(mut self) -> Self {
        self.is_virtual = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtKind {
    Expr(Expr),
    Local {
        name: String,
        ty: Option<TypeRef>,
        init: Option<Expr>,
    },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    Loop {
        cond: Option<Expr>,
        body: Vec<Stmt>,
    },
    Block(Vec<Stmt>),
    Return(Option<Expr>),
    Throw(Option<Expr>),
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            span: Span::default(),
        }
    }

    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr(expr))
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::expr(Expr::assign(target, value))
    }

    pub fn local(name: impl Into<String>, init: Expr) -> Self {
        Self::new(StmtKind::Local {
            name: name.into(),
            ty: None,
            init: Some(init),
        })
    }

    pub fn if_then(cond: Expr, then_branch: Vec<Stmt>, else_branch: Option<Vec<Stmt>>) -> Self {
        Self::new(StmtKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    pub fn block(body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(body))
    }

    pub fn ret() -> Self {
        Self::new(StmtKind::Return(None))
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Coalesce,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Literal(Literal),
    Name(String),
    This,
    Member {
        target: Box<Expr>,
        name: String,
    },
    Index {
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        ty: TypeRef,
        args: Vec<Expr>,
        /// Object initializer assignments or collection initializer items
        initializer: Option<Vec<Expr>>,
    },
    NewArray {
        element: TypeRef,
        sizes: Vec<Expr>,
        items: Option<Vec<Expr>>,
    },
    Collection(Vec<Expr>),
    Default(Option<TypeRef>),
    Cast {
        ty: TypeRef,
        operand: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// Error-recovery node from syntactically invalid source
    Error,
}

/// Operation kind of an expression, the coarse half of equivalence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Literal,
    Name,
    This,
    Member,
    Index,
    Unary,
    Binary,
    Conditional,
    Call,
    New,
    NewArray,
    Collection,
    Default,
    Cast,
    Assign,
    Error,
}

impl Expr {
    pub fn null() -> Self {
        Expr::Literal(Literal::Null)
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::Literal(Literal::Float(value))
    }

    pub fn bool(value: bool) -> Self {
        Expr::Literal(Literal::Bool(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn name(name: impl Into<String>) -> Self {
        Expr::Name(name.into())
    }

    pub fn member(target: Expr, name: impl Into<String>) -> Self {
        Expr::Member {
            target: Box::new(target),
            name: name.into(),
        }
    }

    /// `this.name`
    pub fn this_member(name: impl Into<String>) -> Self {
        Self::member(Expr::This, name)
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn new_object(ty: TypeRef, args: Vec<Expr>) -> Self {
        Expr::New {
            ty,
            args,
            initializer: None,
        }
    }

    pub fn new_array(element: TypeRef, size: Expr) -> Self {
        Expr::NewArray {
            element,
            sizes: vec![size],
            items: None,
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn kind(&self) -> ExprKind {
        match self {
            Expr::Literal(_) => ExprKind::Literal,
            Expr::Name(_) => ExprKind::Name,
            Expr::This => ExprKind::This,
            Expr::Member { .. } => ExprKind::Member,
            Expr::Index { .. } => ExprKind::Index,
            Expr::Unary { .. } => ExprKind::Unary,
            Expr::Binary { .. } => ExprKind::Binary,
            Expr::Conditional { .. } => ExprKind::Conditional,
            Expr::Call { .. } => ExprKind::Call,
            Expr::New { .. } => ExprKind::New,
            Expr::NewArray { .. } => ExprKind::NewArray,
            Expr::Collection(_) => ExprKind::Collection,
            Expr::Default(_) => ExprKind::Default,
            Expr::Cast { .. } => ExprKind::Cast,
            Expr::Assign { .. } => ExprKind::Assign,
            Expr::Error => ExprKind::Error,
        }
    }

    /// Direct sub-expressions, in source order
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Literal(_) | Expr::Name(_) | Expr::This | Expr::Default(_) | Expr::Error => Vec::new(),
            Expr::Member { target, .. } => vec![&**target],
            Expr::Index { target, args } => std::iter::once(&**target).chain(args).collect(),
            Expr::Unary { operand, .. } | Expr::Cast { operand, .. } => vec![&**operand],
            Expr::Binary { left, right, .. } => vec![&**left, &**right],
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
            } => vec![&**cond, &**then_expr, &**else_expr],
            Expr::Call { callee, args } => std::iter::once(&**callee).chain(args).collect(),
            Expr::New { args, initializer, .. } => args.iter().chain(initializer.iter().flatten()).collect(),
            Expr::NewArray { sizes, items, .. } => sizes.iter().chain(items.iter().flatten()).collect(),
            Expr::Collection(items) => items.iter().collect(),
            Expr::Assign { target, value } => vec![&**target, &**value],
        }
    }

    /// Syntactic pre-check: true when no identifier, `this` or error node occurs anywhere
    pub fn is_closed(&self) -> bool {
        match self {
            Expr::Name(_) | Expr::This | Expr::Error => false,
            other => other.children().into_iter().all(Expr::is_closed),
        }
    }

    pub fn contains_error(&self) -> bool {
        matches!(self, Expr::Error) || self.children().into_iter().any(Expr::contains_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality_ignores_statement_spans() {
        let a = Stmt::assign(Expr::name("Buffer"), Expr::new_array(TypeRef::value("byte"), Expr::int(16)))
            .at(Span::line(3));
        let b = Stmt::assign(Expr::name("Buffer"), Expr::new_array(TypeRef::value("byte"), Expr::int(16)))
            .at(Span::line(9));
        assert_ne!(a, b);
        assert_eq!(a.kind, b.kind);
    }

    #[test]
    fn test_primitive_classification() {
        assert_eq!(TypeRef::int().primitive(), PrimitiveKind::Integral);
        assert_eq!(TypeRef::value("System.Double").primitive(), PrimitiveKind::Floating);
        assert_eq!(TypeRef::string().primitive(), PrimitiveKind::String);
        assert_eq!(TypeRef::reference("List<int>").primitive(), PrimitiveKind::Other);
    }

    #[test]
    fn test_nullability() {
        assert!(TypeRef::string().requires_initializer());
        assert!(!TypeRef::string().nullable().requires_initializer());
        assert!(TypeRef::int().nullable().admits_null());
        assert!(!TypeRef::int().admits_null());
    }

    #[test]
    fn test_closed_expressions() {
        assert!(Expr::binary(BinOp::Add, Expr::int(1), Expr::int(2)).is_closed());
        assert!(!Expr::binary(BinOp::Add, Expr::int(1), Expr::name("x")).is_closed());
        assert!(!Expr::new_object(TypeRef::reference("Foo"), vec![Expr::This]).is_closed());
    }

    #[test]
    fn test_multi_declarator_member() {
        let member = MemberDecl::field(TypeRef::int(), "a").and_declarator(Declarator::new("b"));
        assert_eq!(member.declarators.len(), 2);
        assert!(member.is_instance());
    }
}
