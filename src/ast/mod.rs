//! Query tree model, metadata and traversal frameworks.

pub mod build;
pub mod dml;
pub mod expression;
mod location;
pub mod meta;
pub mod query;
pub mod rewrite;
pub mod visit;
pub mod visitors;

pub use location::SourceLocation;

pub use dml::{Ddl, Dml, DmlOp, Exec, Returning};
pub use expression::{
    CaseSensitivity, Expr, ExprKind, Literal, NaryOp, PathExpr, PathStep, ScopeQualifier, VarRef,
};
pub use meta::{Meta, MetaContainer, MetaKind};
pub use query::{
    FromSource, GroupBy, GroupByItem, LetClause, LetVariables, Projection, Select, SelectItem,
    SymbolicName,
};
pub use rewrite::{RewriteResult, Rewriter};
pub use visit::{Visit, VisitResult};
