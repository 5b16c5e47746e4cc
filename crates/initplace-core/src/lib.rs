//! # Initplace Core
//!
//! Member initialization placement engine: decides, for every member of a
//! declared type, whether its initial value belongs in the declaration or in
//! the constructors, and reports the members where the two disagree.
//!
//! ## Modules
//!
//! - **[`hir`]** - Syntax tree of one declared type
//! - **[`semantic`]** - Semantic facade trait and the reference model
//! - **[`placement`]** - Classifier, constructor walker, ledger and decision table
//!
//! ## Quick Start
//!
//! ```rust
//! use initplace_core::prelude::*;
//!
//! let decl = TypeDecl::new("Config")
//!     .with_member(MemberDecl::field(TypeRef::string(), "Name").initialized(Expr::string("")));
//!
//! let model = DeclarationModel::new(&decl);
//! let findings = PlacementAnalyzer::new(&model).analyze()?;
//! assert_eq!(findings[0].kind, FindingKind::RedundantDefault);
//! # Ok::<(), initplace_core::AnalysisError>(())
//! ```

pub mod error;
pub mod hir;
pub mod placement;
pub mod semantic;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{AnalysisError, Result};
    pub use crate::hir::{
        ConstructorDecl, Declarator, Expr, MemberDecl, MethodDecl, Param, Span, Stmt, TypeDecl, TypeKind, TypeRef,
    };
    pub use crate::placement::{analyze_type, Finding, FindingKind, PlacementAnalyzer};
    pub use crate::semantic::{DeclarationModel, SemanticModel};
    pub use tokio_util::sync::CancellationToken;
}

pub use error::AnalysisError;
pub use placement::{analyze_type, Finding, FindingKind, PlacementAnalyzer};
pub use semantic::{DeclarationModel, SemanticModel};
pub use tokio_util::sync::CancellationToken;
