//! Expression nodes.
//!
//! This module defines the closed set of node kinds that make up a query tree:
//! - Literals and variable references
//! - Operators, function calls and aggregate calls
//! - Path navigation into nested values
//! - CASE, CAST/IS, struct and sequence constructors
//! - Statements (`SELECT`, DML, DDL, `EXEC`), which are expressions too
//!
//! Nodes own their children. Trees are never mutated once built: every pass
//! produces a new tree.

use std::hash::{Hash, Hasher};

use smol_str::SmolStr;

use crate::ast::SourceLocation;
use crate::ast::dml::{Ddl, Dml, Exec};
use crate::ast::meta::{Meta, MetaContainer};
use crate::ast::query::Select;

// ============================================================================
// Expr - node wrapper carrying metadata
// ============================================================================

/// A tree node: its kind plus attached metadata.
///
/// `PartialEq` and `Hash` only look at `kind`, recursively. Metadata never takes
/// part in node identity, which is what substitution-by-equivalence relies on.
#[derive(Debug, Clone)]
pub struct Expr {
    /// The node itself.
    pub kind: ExprKind,
    /// Annotations attached to this node.
    pub meta: MetaContainer,
}

impl Expr {
    /// Creates a node with the given metadata.
    pub fn new(kind: ExprKind, meta: MetaContainer) -> Self {
        Self { kind, meta }
    }

    /// Creates a node without metadata.
    pub fn bare(kind: ExprKind) -> Self {
        Self::new(kind, MetaContainer::new())
    }

    /// Returns the parse-time location of this node, if known.
    pub fn location(&self) -> Option<SourceLocation> {
        self.meta.source_location()
    }

    /// Returns this node with `meta` added to its container.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta.insert(meta);
        self
    }

    /// Returns this node located at the given line, column and length.
    pub fn at(self, line: u32, column: u32, length: u32) -> Self {
        self.with_meta(Meta::SourceLocation(SourceLocation::new(line, column, length)))
    }

    /// Structural equality over the bare tree, ignoring all metadata.
    ///
    /// This is the same relation as `==`; the named form reads better at call sites
    /// that compare trees produced by different passes.
    pub fn structurally_eq(&self, other: &Expr) -> bool {
        self.kind == other.kind
    }

    /// Returns the variable reference if this node is one.
    pub fn as_var_ref(&self) -> Option<&VarRef> {
        match &self.kind {
            ExprKind::Id(var) => Some(var),
            _ => None,
        }
    }

    /// Returns the path if this node is one.
    pub fn as_path(&self) -> Option<&PathExpr> {
        match &self.kind {
            ExprKind::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Returns the SELECT if this node is one.
    pub fn as_select(&self) -> Option<&Select> {
        match &self.kind {
            ExprKind::Select(select) => Some(select),
            _ => None,
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

/// Every node kind of the query tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// Literal value.
    Lit(Literal),

    /// The MISSING value.
    Missing,

    /// Variable reference.
    Id(VarRef),

    /// Positional parameter (`?`), 1-based.
    Param(usize),

    /// N-ary operator application.
    Nary(NaryOp, Vec<Expr>),

    /// Scalar function call. The function name is not an expression.
    Call(Call),

    /// Aggregate function call. The function name is not an expression.
    CallAgg(CallAgg),

    /// `IS` / `CAST` against a data type.
    Typed(TypedOp, Box<Expr>, DataType),

    /// Path navigation (`a.b[0].*`).
    Path(PathExpr),

    /// `CASE <operand> WHEN ... END`
    SimpleCase(SimpleCase),

    /// `CASE WHEN <cond> ... END`
    SearchedCase(SearchedCase),

    /// Struct constructor `{k: v, ...}`.
    Struct(Vec<StructField>),

    /// List, bag or s-expression constructor.
    Seq(SeqKind, Vec<Expr>),

    /// SELECT statement.
    Select(Box<Select>),

    /// Data manipulation statement.
    Dml(Box<Dml>),

    /// Data definition statement.
    Ddl(Ddl),

    /// `EXEC <procedure> <args>`
    Exec(Exec),
}

// ============================================================================
// Literals
// ============================================================================

/// Literal values.
///
/// Numeric and date-time literals keep their source text; interpreting them is
/// the evaluator's business.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    /// Decimal literal text.
    Decimal(SmolStr),
    /// Floating-point literal text.
    Float(SmolStr),
    String(SmolStr),
    /// Timestamp literal text.
    Timestamp(SmolStr),
    /// DATE literal text.
    Date(SmolStr),
    /// TIME literal text.
    Time(SmolStr),
}

// ============================================================================
// Variable references
// ============================================================================

/// Whether a name is matched case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseSensitivity {
    /// Double-quoted identifiers.
    Sensitive,
    /// Bare identifiers.
    Insensitive,
}

impl CaseSensitivity {
    /// Compares two names under this case rule.
    pub fn matches(self, left: &str, right: &str) -> bool {
        match self {
            CaseSensitivity::Sensitive => left == right,
            CaseSensitivity::Insensitive => eq_ignore_case(left, right),
        }
    }
}

/// Unicode-aware case-insensitive comparison.
pub fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}

/// Which scopes a variable reference searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeQualifier {
    /// Default search order of the enclosing scope.
    Unqualified,
    /// Lexical scopes first (the `@name` form, or resolved to a local/lexical binding).
    Lexical,
}

/// A reference to a named binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarRef {
    pub name: SmolStr,
    pub case: CaseSensitivity,
    pub qualifier: ScopeQualifier,
}

impl VarRef {
    /// Creates a reference to `name`.
    pub fn new(name: impl Into<SmolStr>, case: CaseSensitivity, qualifier: ScopeQualifier) -> Self {
        Self {
            name: name.into(),
            case,
            qualifier,
        }
    }
}

// ============================================================================
// Operators and calls
// ============================================================================

/// N-ary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Concat,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Not,
    And,
    Or,
    Like,
    Between,
    In,
    NotIn,
    Union,
    Intersect,
    Except,
}

/// `ALL` / `DISTINCT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SetQuantifier {
    #[default]
    All,
    Distinct,
}

/// Scalar function call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Call {
    pub name: SmolStr,
    pub args: Vec<Expr>,
}

/// Aggregate function call such as `COUNT(DISTINCT x)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallAgg {
    pub name: SmolStr,
    pub quantifier: SetQuantifier,
    pub arg: Box<Expr>,
}

/// Operators taking an expression and a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedOp {
    Is,
    Cast,
}

/// Data types named in `IS` and `CAST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Null,
    Missing,
    Boolean,
    SmallInt,
    Integer,
    Float,
    Real,
    DoublePrecision,
    Decimal,
    Numeric,
    Timestamp,
    Date,
    Time,
    Character,
    Varchar,
    String,
    Symbol,
    Clob,
    Blob,
    Struct,
    Tuple,
    List,
    Sexp,
    Bag,
}

// ============================================================================
// Paths
// ============================================================================

/// Path navigation rooted at an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathExpr {
    pub root: Box<Expr>,
    pub steps: Vec<PathStep>,
}

/// One navigation step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// `.name`, `["name"]` or `[expr]`.
    Index { expr: Expr, case: CaseSensitivity },
    /// `[*]`
    Wildcard,
    /// `.*`
    Unpivot,
}

impl PathStep {
    /// Returns the literal text of an `Index` step whose index is a string literal.
    pub fn literal_name(&self) -> Option<&SmolStr> {
        match self {
            PathStep::Index { expr, .. } => match &expr.kind {
                ExprKind::Lit(Literal::String(name)) => Some(name),
                _ => None,
            },
            PathStep::Wildcard | PathStep::Unpivot => None,
        }
    }
}

impl PathExpr {
    /// Returns the root variable reference, if the path is rooted at one.
    pub fn root_var(&self) -> Option<&VarRef> {
        self.root.as_var_ref()
    }
}

// ============================================================================
// CASE and constructors
// ============================================================================

/// A `WHEN ... THEN ...` arm.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WhenClause {
    pub when: Expr,
    pub then: Expr,
}

/// `CASE operand WHEN value THEN result ... [ELSE default] END`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimpleCase {
    pub operand: Box<Expr>,
    pub whens: Vec<WhenClause>,
    pub default: Option<Box<Expr>>,
}

/// `CASE WHEN condition THEN result ... [ELSE default] END`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchedCase {
    pub whens: Vec<WhenClause>,
    pub default: Option<Box<Expr>>,
}

/// A `name: value` pair of a struct constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: Expr,
    pub value: Expr,
}

/// Sequence constructor flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqKind {
    List,
    Bag,
    Sexp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_metadata() {
        let left = build::id("x").at(1, 1, 1);
        let right = build::id("x").at(7, 3, 1).with_meta(Meta::IsSyntheticName);
        assert_eq!(left, right);
        assert!(left.structurally_eq(&right));
    }

    #[test]
    fn hashing_ignores_metadata() {
        let mut set = HashSet::new();
        set.insert(build::path(build::id("a"), ["b"]).at(1, 8, 3));
        assert!(set.contains(&build::path(build::id("a"), ["b"]).at(2, 1, 3)));
    }

    #[test]
    fn different_case_sensitivity_is_a_different_node() {
        assert_ne!(build::id("x"), build::id_sensitive("x"));
    }

    #[test]
    fn case_insensitive_match_is_unicode_aware() {
        assert!(CaseSensitivity::Insensitive.matches("ÄBC", "äbc"));
        assert!(!CaseSensitivity::Sensitive.matches("ABC", "abc"));
    }

    #[test]
    fn literal_name_of_path_step() {
        let step = PathStep::Index {
            expr: build::string("bat"),
            case: CaseSensitivity::Insensitive,
        };
        assert_eq!(step.literal_name().map(|s| s.as_str()), Some("bat"));
        assert_eq!(PathStep::Wildcard.literal_name(), None);
    }
}
