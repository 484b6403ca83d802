//! SELECT statement nodes: projection, FROM sources, LET, GROUP BY, ORDER BY.

use std::hash::{Hash, Hasher};

use smol_str::SmolStr;

use crate::ast::expression::{Expr, ExprKind, SetQuantifier};
use crate::ast::meta::{Meta, MetaContainer};

/// A name bound by the query (alias, AT/BY variable, LET variable, group name).
///
/// Like [`Expr`], equality and hashing consider only the name text.
#[derive(Debug, Clone)]
pub struct SymbolicName {
    pub name: SmolStr,
    pub meta: MetaContainer,
}

impl SymbolicName {
    /// Creates a name without metadata.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            meta: MetaContainer::new(),
        }
    }

    /// Attaches one metadata entry.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta.insert(meta);
        self
    }

    /// Returns true if a pass synthesized this name.
    pub fn is_synthetic(&self) -> bool {
        self.meta.is_synthetic_name()
    }

    /// The name text.
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl PartialEq for SymbolicName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SymbolicName {}

impl Hash for SymbolicName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// `SELECT` statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Select {
    pub quantifier: SetQuantifier,
    pub projection: Projection,
    pub from: Option<FromSource>,
    pub let_clause: Option<LetClause>,
    pub where_clause: Option<Box<Expr>>,
    pub group_by: Option<GroupBy>,
    pub having: Option<Box<Expr>>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Box<Expr>>,
}

impl Select {
    /// Creates a SELECT with only a projection.
    pub fn new(projection: Projection) -> Self {
        Self {
            quantifier: SetQuantifier::All,
            projection,
            from: None,
            let_clause: None,
            where_clause: None,
            group_by: None,
            having: None,
            order_by: None,
            limit: None,
        }
    }

    /// Sets `DISTINCT` or `ALL`.
    pub fn with_quantifier(mut self, quantifier: SetQuantifier) -> Self {
        self.quantifier = quantifier;
        self
    }

    /// Sets the FROM source.
    pub fn with_from(mut self, from: FromSource) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the LET clause.
    pub fn with_let(mut self, let_clause: LetClause) -> Self {
        self.let_clause = Some(let_clause);
        self
    }

    /// Sets the WHERE condition.
    pub fn with_where(mut self, condition: Expr) -> Self {
        self.where_clause = Some(Box::new(condition));
        self
    }

    /// Sets the GROUP BY clause.
    pub fn with_group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    /// Sets the HAVING condition.
    pub fn with_having(mut self, condition: Expr) -> Self {
        self.having = Some(Box::new(condition));
        self
    }

    /// Sets the ORDER BY clause.
    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Sets the LIMIT expression.
    pub fn with_limit(mut self, limit: Expr) -> Self {
        self.limit = Some(Box::new(limit));
        self
    }

    /// Wraps this statement into an expression node.
    pub fn into_expr(self) -> Expr {
        Expr::bare(ExprKind::Select(Box::new(self)))
    }
}

/// What a SELECT produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Projection {
    /// `SELECT a, b AS c, t.*, *`
    List(Vec<SelectItem>),
    /// `SELECT VALUE expr`
    Value(Box<Expr>),
    /// `PIVOT value AT key`
    Pivot { value: Box<Expr>, key: Box<Expr> },
}

/// One item of a projection list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectItem {
    /// `expr [AS alias]`
    Expr {
        expr: Expr,
        alias: Option<SymbolicName>,
    },
    /// `expr.*`
    ProjectAll(Expr),
    /// Bare `*`.
    Star,
}

/// A FROM clause source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FromSource {
    /// `expr [AS a] [AT b] [BY c]`
    Scan { expr: Expr, vars: LetVariables },
    /// `UNPIVOT expr [AS a] [AT b] [BY c]`
    Unpivot { expr: Expr, vars: LetVariables },
    /// Two sources joined. Comma-separated sources are implicit inner joins.
    Join(Box<Join>),
}

impl FromSource {
    /// Scan over `expr`.
    pub fn scan(expr: Expr, vars: LetVariables) -> Self {
        FromSource::Scan { expr, vars }
    }

    /// Returns the source expression and its variables for non-join sources.
    pub fn as_binding(&self) -> Option<(&Expr, &LetVariables)> {
        match self {
            FromSource::Scan { expr, vars } | FromSource::Unpivot { expr, vars } => {
                Some((expr, vars))
            }
            FromSource::Join(_) => None,
        }
    }

    /// Variables of every leaf source, in declaration order.
    pub fn leaf_variables(&self) -> Vec<&LetVariables> {
        let mut out = Vec::new();
        collect_leaf_variables(self, &mut out);
        out
    }
}

fn collect_leaf_variables<'a>(source: &'a FromSource, out: &mut Vec<&'a LetVariables>) {
    match source {
        FromSource::Scan { vars, .. } | FromSource::Unpivot { vars, .. } => out.push(vars),
        FromSource::Join(join) => {
            collect_leaf_variables(&join.left, out);
            collect_leaf_variables(&join.right, out);
        }
    }
}

/// `left [kind] JOIN right [ON condition]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    pub kind: JoinKind,
    pub left: FromSource,
    pub right: FromSource,
    pub condition: Option<Expr>,
    /// Written with a comma rather than a JOIN keyword.
    pub implicit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

/// The `AS`, `AT` and `BY` names of a FROM source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LetVariables {
    pub as_name: Option<SymbolicName>,
    pub at_name: Option<SymbolicName>,
    pub by_name: Option<SymbolicName>,
}

impl LetVariables {
    /// No variables.
    pub fn none() -> Self {
        Self::default()
    }

    /// Only an `AS` name.
    pub fn named(as_name: impl Into<SmolStr>) -> Self {
        Self {
            as_name: Some(SymbolicName::new(as_name)),
            ..Self::default()
        }
    }

    /// Sets the `AT` name.
    pub fn with_at(mut self, at_name: impl Into<SmolStr>) -> Self {
        self.at_name = Some(SymbolicName::new(at_name));
        self
    }

    /// Sets the `BY` name.
    pub fn with_by(mut self, by_name: impl Into<SmolStr>) -> Self {
        self.by_name = Some(SymbolicName::new(by_name));
        self
    }

    /// The bound names in `AS`, `AT`, `BY` order.
    pub fn names(&self) -> impl Iterator<Item = &SymbolicName> {
        [&self.as_name, &self.at_name, &self.by_name]
            .into_iter()
            .flatten()
    }
}

/// `LET name = expr, ...`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LetClause {
    pub bindings: Vec<LetBinding>,
}

/// `expr AS name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LetBinding {
    pub expr: Expr,
    pub name: SymbolicName,
}

/// `GROUP [PARTIAL] BY key [AS alias], ... [GROUP AS name]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupBy {
    pub strategy: GroupingStrategy,
    pub items: Vec<GroupByItem>,
    pub group_name: Option<SymbolicName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GroupingStrategy {
    #[default]
    Full,
    Partial,
}

/// One GROUP BY key and its alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupByItem {
    pub expr: Expr,
    pub alias: Option<SymbolicName>,
}

/// `ORDER BY spec, ...`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    pub specs: Vec<SortSpec>,
}

/// One ORDER BY key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub expr: Expr,
    pub ordering: Option<Ordering>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ordering {
    Asc,
    Desc,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;

    #[test]
    fn symbolic_name_equality_ignores_metadata() {
        let synthetic = SymbolicName::new("c").with_meta(Meta::IsSyntheticName);
        assert_eq!(synthetic, SymbolicName::new("c"));
        assert!(synthetic.is_synthetic());
    }

    #[test]
    fn leaf_variables_follow_declaration_order() {
        let from = build::join(
            build::scan(build::id("t1"), LetVariables::named("a")),
            build::join(
                build::scan(build::id("t2"), LetVariables::named("b")),
                build::scan(build::id("t3"), LetVariables::named("c")),
            ),
        );
        let names: Vec<_> = from
            .leaf_variables()
            .into_iter()
            .filter_map(|vars| vars.as_name.as_ref().map(SymbolicName::as_str))
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn let_variable_names_in_binding_order() {
        let vars = LetVariables::named("x").with_by("addr").with_at("pos");
        let names: Vec<_> = vars.names().map(SymbolicName::as_str).collect();
        assert_eq!(names, vec!["x", "pos", "addr"]);
    }
}
