//! Semantic facade over a declared type
//!
//! The placement engine never inspects names directly. It asks a
//! [`SemanticModel`] what an expression refers to, whether it has a value
//! fixed at build time, and what its type is. Hosts with a real binder
//! implement the trait themselves; [`DeclarationModel`] is a self-contained
//! implementation over the [`TypeDecl`](crate::hir::TypeDecl) syntax tree.

mod constant;
mod model;

pub use constant::ConstValue;
pub use model::DeclarationModel;

use crate::hir::{ConstructorDecl, Declarator, Expr, MemberDecl, MethodDecl, Param, Stmt, StmtKind, TypeDecl, TypeRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Resolved identity of one declarator of a member declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberId {
    pub declaration: u32,
    pub declarator: u32,
}

impl MemberId {
    pub fn new(declaration: usize, declarator: usize) -> Self {
        Self {
            declaration: declaration as u32,
            declarator: declarator as u32,
        }
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}.{}", self.declaration, self.declarator)
    }
}

/// Resolved identity of a method of the declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodId(pub u32);

/// What a name, member access or invocation refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolRef {
    Parameter(String),
    Local(LocalId),
    /// Field or property of the declared type
    Member(MemberId),
    /// Method of the declared type (method group or invocation target)
    Method(MethodId),
    /// Member or property reached through some other receiver
    ExternalMember { is_static: bool },
    /// Method reached through some other receiver
    ExternalMethod { is_static: bool },
    Type(String),
    This,
    /// The facade could not bind the expression (error recovery, unknown name)
    Unresolved,
}

/// A member declarator together with its declaration
#[derive(Debug, Clone, Copy)]
pub struct MemberSymbol<'a> {
    pub id: MemberId,
    pub decl: &'a MemberDecl,
    pub declarator: &'a Declarator,
}

impl<'a> MemberSymbol<'a> {
    pub fn name(&self) -> &'a str {
        &self.declarator.name
    }

    pub fn ty(&self) -> &'a TypeRef {
        &self.decl.ty
    }
}

/// Read-only semantic queries used by the placement engine
///
/// Implementations must be safe for concurrent reads: the host may analyze
/// several type declarations in parallel against one snapshot.
pub trait SemanticModel: Send + Sync {
    /// The type declaration this model answers for
    fn declaration(&self) -> &TypeDecl;

    /// Bind an expression to a symbol. `None` when the expression is not a
    /// symbol reference at all (literals, operators, object creation).
    fn resolve(&self, expr: &Expr, scope: &BodyScope) -> Option<SymbolRef>;

    /// Value of the expression when it is fixed at build time
    fn constant_value(&self, expr: &Expr, scope: &BodyScope) -> Option<ConstValue>;

    /// Declared type of the expression, when known
    fn type_of(&self, expr: &Expr, scope: &BodyScope) -> Option<TypeRef>;

    fn member(&self, id: MemberId) -> Option<MemberSymbol<'_>> {
        let decl = self.declaration().members.get(id.declaration as usize)?;
        let declarator = decl.declarators.get(id.declarator as usize)?;
        Some(MemberSymbol { id, decl, declarator })
    }

    fn method(&self, id: MethodId) -> Option<&MethodDecl> {
        self.declaration().methods.get(id.0 as usize)
    }
}

/// Identity of one local declaration within a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalId(pub u32);

/// Identity of one statement block within a body; the body itself is block 0
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// A value written to a local, with the block the write appears in
#[derive(Debug, Clone, PartialEq)]
pub struct LocalAssignment {
    pub expr: Expr,
    pub block: BlockId,
}

/// One local declaration and every value it receives
#[derive(Debug, Clone, PartialEq)]
pub struct LocalInfo {
    pub name: String,
    pub ty: Option<TypeRef>,
    pub block: BlockId,
    pub values: Vec<LocalAssignment>,
}

#[derive(Debug, Default)]
struct BlockInfo {
    parent: Option<BlockId>,
    names: IndexMap<String, LocalId>,
    /// Nested blocks in source order
    children: Vec<BlockId>,
}

#[derive(Debug, Default)]
struct ScopeTable {
    params: IndexMap<String, TypeRef>,
    locals: Vec<LocalInfo>,
    blocks: Vec<BlockInfo>,
}

impl ScopeTable {
    fn lookup(&self, mut block: BlockId, name: &str) -> Option<LocalId> {
        loop {
            let info = self.blocks.get(block.0 as usize)?;
            if let Some(id) = info.names.get(name) {
                return Some(*id);
            }
            block = info.parent?;
        }
    }

    /// Register `body` as a new block. A local is visible in its declaring
    /// block and every block nested in it; writes are attributed to the local
    /// already in view at the write.
    fn declare_block(&mut self, body: &[Stmt], parent: Option<BlockId>) -> BlockId {
        let block = BlockId(self.blocks.len() as u32);
        self.blocks.push(BlockInfo {
            parent,
            ..BlockInfo::default()
        });

        for stmt in body {
            match &stmt.kind {
                StmtKind::Local { name, ty, init } => {
                    let id = LocalId(self.locals.len() as u32);
                    self.locals.push(LocalInfo {
                        name: name.clone(),
                        ty: ty.clone(),
                        block,
                        values: init
                            .iter()
                            .map(|expr| LocalAssignment {
                                expr: expr.clone(),
                                block,
                            })
                            .collect(),
                    });
                    self.blocks[block.0 as usize].names.insert(name.clone(), id);
                }
                StmtKind::Expr(expr) => self.record_assignment(expr, block),
                _ => {
                    let mut children = Vec::new();
                    for_each_nested_block(stmt, |nested| children.push(self.declare_block(nested, Some(block))));
                    self.blocks[block.0 as usize].children.extend(children);
                }
            }
        }
        block
    }

    fn record_assignment(&mut self, expr: &Expr, block: BlockId) {
        if let Expr::Assign { target, value } = expr {
            if let Expr::Name(name) = &**target {
                if let Some(id) = self.lookup(block, name) {
                    self.locals[id.0 as usize].values.push(LocalAssignment {
                        expr: (**value).clone(),
                        block,
                    });
                }
            }
            // chained assignment: `a = b = x`
            self.record_assignment(value, block);
        }
    }
}

/// Names visible at one block of a constructor or method body
///
/// The declaration table is shared; moving between blocks only changes which
/// locals are in view, so views are cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct BodyScope {
    table: Arc<ScopeTable>,
    block: BlockId,
}

impl BodyScope {
    /// Scope of a member declaration: no parameters, no locals
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_constructor(ctor: &ConstructorDecl) -> Self {
        Self::from_body(&ctor.params, &ctor.body)
    }

    pub fn for_method(method: &MethodDecl) -> Self {
        Self::from_body(&method.params, method.body.as_deref().unwrap_or_default())
    }

    /// Scope at the outermost block of `body`
    pub fn from_body(params: &[Param], body: &[Stmt]) -> Self {
        let mut table = ScopeTable {
            params: params.iter().map(|p| (p.name.clone(), p.ty.clone())).collect(),
            ..ScopeTable::default()
        };
        let block = table.declare_block(body, None);
        Self {
            table: Arc::new(table),
            block,
        }
    }

    /// The same body viewed from another of its blocks
    pub fn at(&self, block: BlockId) -> Self {
        Self {
            table: Arc::clone(&self.table),
            block,
        }
    }

    /// View from the `ordinal`-th nested block of the current one, counting
    /// `if` branches, loop bodies and bare blocks in source order
    pub fn nested(&self, ordinal: usize) -> Option<Self> {
        let info = self.table.blocks.get(self.block.0 as usize)?;
        info.children.get(ordinal).map(|block| self.at(*block))
    }

    pub fn param(&self, name: &str) -> Option<&TypeRef> {
        self.table.params.get(name)
    }

    /// The local `name` denotes at the current block
    pub fn lookup_local(&self, name: &str) -> Option<LocalId> {
        self.table.lookup(self.block, name)
    }

    pub fn local(&self, id: LocalId) -> Option<&LocalInfo> {
        self.table.locals.get(id.0 as usize)
    }

    pub fn has_params(&self) -> bool {
        !self.table.params.is_empty()
    }
}

fn for_each_nested_block(stmt: &Stmt, mut visit: impl FnMut(&[Stmt])) {
    match &stmt.kind {
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            visit(then_branch);
            if let Some(else_branch) = else_branch {
                visit(else_branch);
            }
        }
        StmtKind::Loop { body, .. } | StmtKind::Block(body) => visit(body),
        StmtKind::Expr(_) | StmtKind::Local { .. } | StmtKind::Return(_) | StmtKind::Throw(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(info: &LocalInfo) -> Vec<Expr> {
        info.values.iter().map(|v| v.expr.clone()).collect()
    }

    #[test]
    fn test_scope_tracks_transitive_local_values() {
        let body = vec![
            Stmt::local("tmp", Expr::int(0)),
            Stmt::if_then(
                Expr::bool(true),
                vec![Stmt::assign(Expr::name("tmp"), Expr::name("size"))],
                None,
            ),
        ];
        let scope = BodyScope::from_body(&[Param::new("size", TypeRef::int())], &body);
        let tmp = scope.lookup_local("tmp").and_then(|id| scope.local(id)).expect("tmp is declared");
        assert_eq!(values(tmp), vec![Expr::int(0), Expr::name("size")]);
        assert_eq!(tmp.values[1].block, BlockId(1));
        assert!(scope.param("size").is_some());
        assert!(scope.has_params());
    }

    #[test]
    fn test_assignments_to_members_are_not_locals() {
        let body = vec![Stmt::assign(Expr::name("Count"), Expr::int(1))];
        let scope = BodyScope::from_body(&[], &body);
        assert!(scope.lookup_local("Count").is_none());
        assert!(!scope.has_params());
    }

    #[test]
    fn test_nested_local_is_invisible_outside_its_block() {
        let body = vec![
            Stmt::assign(Expr::name("Mode"), Expr::int(2)),
            Stmt::if_then(Expr::name("flag"), vec![Stmt::local("Mode", Expr::int(0))], None),
        ];
        let scope = BodyScope::from_body(&[Param::new("flag", TypeRef::bool())], &body);
        assert!(scope.lookup_local("Mode").is_none());

        let inner = scope.nested(0).expect("then branch");
        let id = inner.lookup_local("Mode").expect("declared in the branch");
        assert_eq!(values(scope.local(id).expect("local")), vec![Expr::int(0)]);
        assert!(scope.nested(1).is_none());
    }

    #[test]
    fn test_sibling_blocks_keep_separate_locals() {
        let body = vec![
            Stmt::block(vec![Stmt::local("x", Expr::name("size"))]),
            Stmt::block(vec![Stmt::local("x", Expr::int(1)), Stmt::assign(Expr::name("x"), Expr::int(2))]),
        ];
        let scope = BodyScope::from_body(&[Param::new("size", TypeRef::int())], &body);
        let first = scope.nested(0).and_then(|s| s.lookup_local("x")).expect("first x");
        let second = scope.nested(1).and_then(|s| s.lookup_local("x")).expect("second x");
        assert_ne!(first, second);
        assert_eq!(values(scope.local(first).expect("local")), vec![Expr::name("size")]);
        assert_eq!(values(scope.local(second).expect("local")), vec![Expr::int(1), Expr::int(2)]);
    }
}
