//! Shorthand constructors for tree nodes.
//!
//! The passes use these when they synthesize nodes; tests use them to build
//! input trees without a parser.

use smol_str::SmolStr;

use crate::ast::dml::Exec;
use crate::ast::expression::{
    Call, CallAgg, CaseSensitivity, Expr, ExprKind, Literal, NaryOp, PathExpr, PathStep,
    ScopeQualifier, SeqKind, SetQuantifier, StructField, VarRef,
};
use crate::ast::query::{
    FromSource, GroupBy, GroupByItem, GroupingStrategy, Join, JoinKind, LetVariables, Projection,
    Select, SelectItem, SymbolicName,
};

/// Case-insensitive, unqualified variable reference.
pub fn id(name: impl Into<SmolStr>) -> Expr {
    var(
        name,
        CaseSensitivity::Insensitive,
        ScopeQualifier::Unqualified,
    )
}

/// Case-sensitive (quoted), unqualified variable reference.
pub fn id_sensitive(name: impl Into<SmolStr>) -> Expr {
    var(
        name,
        CaseSensitivity::Sensitive,
        ScopeQualifier::Unqualified,
    )
}

/// Case-insensitive, lexically qualified (`@name`) variable reference.
pub fn id_lexical(name: impl Into<SmolStr>) -> Expr {
    var(name, CaseSensitivity::Insensitive, ScopeQualifier::Lexical)
}

/// Variable reference with explicit case sensitivity and qualifier.
pub fn var(name: impl Into<SmolStr>, case: CaseSensitivity, qualifier: ScopeQualifier) -> Expr {
    Expr::bare(ExprKind::Id(VarRef::new(name, case, qualifier)))
}

/// Literal value.
pub fn lit(literal: Literal) -> Expr {
    Expr::bare(ExprKind::Lit(literal))
}

/// Integer literal.
pub fn int(value: i64) -> Expr {
    lit(Literal::Int(value))
}

/// String literal.
pub fn string(value: impl Into<SmolStr>) -> Expr {
    lit(Literal::String(value.into()))
}

/// The `MISSING` literal.
pub fn missing() -> Expr {
    Expr::bare(ExprKind::Missing)
}

/// Operator applied to `args`.
pub fn nary(op: NaryOp, args: Vec<Expr>) -> Expr {
    Expr::bare(ExprKind::Nary(op, args))
}

pub fn add(left: Expr, right: Expr) -> Expr {
    nary(NaryOp::Add, vec![left, right])
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    nary(NaryOp::Eq, vec![left, right])
}

pub fn gt(left: Expr, right: Expr) -> Expr {
    nary(NaryOp::Gt, vec![left, right])
}

/// Scalar function call.
pub fn call(name: impl Into<SmolStr>, args: Vec<Expr>) -> Expr {
    Expr::bare(ExprKind::Call(Call {
        name: name.into(),
        args,
    }))
}

/// Aggregate call with the default `ALL` quantifier.
pub fn call_agg(name: impl Into<SmolStr>, arg: Expr) -> Expr {
    Expr::bare(ExprKind::CallAgg(CallAgg {
        name: name.into(),
        quantifier: SetQuantifier::All,
        arg: Box::new(arg),
    }))
}

/// Path with case-insensitive literal name steps: `path(id("a"), ["b", "c"])` is `a.b.c`.
pub fn path<I, S>(root: Expr, steps: I) -> Expr
where
    I: IntoIterator<Item = S>,
    S: Into<SmolStr>,
{
    let steps = steps
        .into_iter()
        .map(|name| PathStep::Index {
            expr: string(name),
            case: CaseSensitivity::Insensitive,
        })
        .collect();
    path_of(root, steps)
}

/// Path with explicit steps.
pub fn path_of(root: Expr, steps: Vec<PathStep>) -> Expr {
    Expr::bare(ExprKind::Path(PathExpr {
        root: Box::new(root),
        steps,
    }))
}

/// List constructor `[v, ...]`.
pub fn list(values: Vec<Expr>) -> Expr {
    Expr::bare(ExprKind::Seq(SeqKind::List, values))
}

/// Struct constructor `{k: v, ...}`.
pub fn structure(fields: Vec<(Expr, Expr)>) -> Expr {
    Expr::bare(ExprKind::Struct(
        fields
            .into_iter()
            .map(|(name, value)| StructField { name, value })
            .collect(),
    ))
}

/// `EXEC procedure arg, ...`
pub fn exec(procedure: impl Into<SmolStr>, args: Vec<Expr>) -> Expr {
    Expr::bare(ExprKind::Exec(Exec {
        procedure: procedure.into(),
        args,
    }))
}

/// Unaliased projection item.
pub fn item(expr: Expr) -> SelectItem {
    SelectItem::Expr { expr, alias: None }
}

/// Aliased projection item.
pub fn item_as(expr: Expr, alias: impl Into<SmolStr>) -> SelectItem {
    SelectItem::Expr {
        expr,
        alias: Some(SymbolicName::new(alias)),
    }
}

/// `SELECT items...` with no other clauses.
pub fn select(items: Vec<SelectItem>) -> Select {
    Select::new(Projection::List(items))
}

/// `SELECT *`
pub fn select_star() -> Select {
    select(vec![SelectItem::Star])
}

/// `SELECT VALUE expr`
pub fn select_value(expr: Expr) -> Select {
    Select::new(Projection::Value(Box::new(expr)))
}

/// FROM source over `expr` with the given variables.
pub fn scan(expr: Expr, vars: LetVariables) -> FromSource {
    FromSource::Scan { expr, vars }
}

/// Unaliased scan of a global named `name`.
pub fn table(name: impl Into<SmolStr>) -> FromSource {
    scan(id(name), LetVariables::none())
}

/// `name AS alias`
pub fn table_as(name: impl Into<SmolStr>, alias: impl Into<SmolStr>) -> FromSource {
    scan(id(name), LetVariables::named(alias))
}

/// Comma (implicit inner) join.
pub fn join(left: FromSource, right: FromSource) -> FromSource {
    FromSource::Join(Box::new(Join {
        kind: JoinKind::Inner,
        left,
        right,
        condition: None,
        implicit: true,
    }))
}

/// GROUP BY key without an alias.
pub fn group_item(expr: Expr) -> GroupByItem {
    GroupByItem { expr, alias: None }
}

/// GROUP BY key with a user alias.
pub fn group_item_as(expr: Expr, alias: impl Into<SmolStr>) -> GroupByItem {
    GroupByItem {
        expr,
        alias: Some(SymbolicName::new(alias)),
    }
}

/// Full GROUP BY over `items`, without a group name.
pub fn group_by(items: Vec<GroupByItem>) -> GroupBy {
    GroupBy {
        strategy: GroupingStrategy::Full,
        items,
        group_name: None,
    }
}
