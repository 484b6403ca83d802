//! Semantic rewrite passes for a SQL++ style query language.
//!
//! The crate takes an already parsed statement tree and rewrites it into the
//! canonical form later compiler stages expect: every projection item and FROM
//! source named, GROUP BY keys given unique names, aggregate calls registered,
//! `SELECT *` expanded, and (given a catalog of global bindings) every variable
//! reference resolved and typed. Failures carry source locations and convert to
//! miette reports through [`diag`].
//!
//! # Example
//!
//! ```
//! use sqlpp_rewrite::ast::{build, Projection, SelectItem};
//! use sqlpp_rewrite::RewritePipeline;
//!
//! let query = build::select(vec![build::item(build::path(build::id("a"), ["b"]))])
//!     .with_from(build::table("t"))
//!     .into_expr();
//!
//! let rewritten = RewritePipeline::new().run(&query).unwrap();
//! let Projection::List(items) = &rewritten.as_select().unwrap().projection else {
//!     unreachable!()
//! };
//! let SelectItem::Expr { alias, .. } = &items[0] else { unreachable!() };
//! assert_eq!(alias.as_ref().unwrap().as_str(), "b");
//! ```

pub mod ast;
pub mod diag;
pub mod interrupt;
pub mod semantic;

pub use ast::{Expr, ExprKind, MetaContainer, SourceLocation};
pub use diag::{Diag, DiagLabel, DiagSeverity, LabelRole};
pub use interrupt::Interrupt;
pub use semantic::{
    GlobalBindings, RewritePipeline, ScopingConfig, ScopingConstraint, SemanticAnalyzer,
    SemanticError, SemanticResult, StaticType,
};
