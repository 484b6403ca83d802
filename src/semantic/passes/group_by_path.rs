//! Replaces references to GROUP BY keys with the key's group variable.
//!
//! After grouping, `a.b` in `SELECT a.b FROM t AS a GROUP BY a.b` no longer refers
//! to a row of `a`; it refers to the grouped value. Every eligible key expression
//! is therefore replaced by an identifier named by the key's unique name.
//!
//! Matching and replacement go through [`walk_substituted`], the same core the
//! generic [`SubstitutionRewriter`](super::substitution::SubstitutionRewriter) uses.

use crate::ast::build;
use crate::ast::expression::{CallAgg, CaseSensitivity, Expr, ExprKind, ScopeQualifier};
use crate::ast::meta::{Meta, MetaContainer};
use crate::ast::query::{FromSource, GroupBy, GroupByItem, Select, SymbolicName};
use crate::ast::rewrite::{RewriteResult, Rewriter, walk_call_agg};
use crate::interrupt::Interrupt;
use crate::semantic::error::{SemanticError, SemanticResult};
use crate::semantic::passes::substitution::{
    Substituting, SubstitutionMap, SubstitutionPair, walk_substituted,
};

/// Substitutes single-step path references to synthetic-aliased GROUP BY keys.
///
/// Each clause of a SELECT sees the substitutions valid in its scope. The
/// projection, HAVING and ORDER BY see the enclosing query's keys plus this
/// query's keys. LET, WHERE, the GROUP BY keys and LIMIT see only the enclosing
/// query's keys. FROM is rewritten in the enclosing scope. An enclosing key whose
/// path root is rebound by a FROM source of this query is dropped.
pub struct GroupByPathRewriter {
    interrupt: Interrupt,
    substitutions: SubstitutionMap,
}

impl GroupByPathRewriter {
    /// Creates the pass with no enclosing substitutions.
    pub fn new(interrupt: Interrupt) -> Self {
        Self::with_substitutions(SubstitutionMap::new(), interrupt)
    }

    fn with_substitutions(substitutions: SubstitutionMap, interrupt: Interrupt) -> Self {
        Self {
            interrupt,
            substitutions,
        }
    }

    fn scoped(&self, substitutions: SubstitutionMap) -> Self {
        Self::with_substitutions(substitutions, self.interrupt.clone())
    }

    /// Enclosing substitutions that survive this query's FROM bindings.
    fn visible_enclosing(&self, from: Option<&FromSource>) -> SubstitutionMap {
        let bound: Vec<&SymbolicName> = from
            .map(|from| {
                from.leaf_variables()
                    .into_iter()
                    .flat_map(|vars| vars.names())
                    .collect()
            })
            .unwrap_or_default();

        let mut visible = self.substitutions.clone();
        visible.retain(|pair| {
            let Some(root) = pair.target.as_path().and_then(|path| path.root_var()) else {
                return true;
            };
            let shadowed = bound
                .iter()
                .any(|name| root.case.matches(&root.name, name.as_str()));
            if shadowed {
                tracing::trace!(root = %root.name, "FROM alias shadows enclosing GROUP BY key");
            }
            !shadowed
        });
        visible
    }
}

/// Substitutions introduced by the eligible keys of one GROUP BY clause.
fn group_key_substitutions(group_by: &GroupBy) -> SemanticResult<Vec<SubstitutionPair>> {
    group_by
        .items
        .iter()
        .filter(|item| is_substitutable(item))
        .map(|item| {
            let alias = item
                .alias
                .as_ref()
                .ok_or_else(|| SemanticError::internal("GROUP BY item has no alias"))?;
            let unique_name = alias.meta.unique_name().ok_or_else(|| {
                SemanticError::internal(format!(
                    "GROUP BY item '{}' has no unique name",
                    alias.name
                ))
            })?;
            let replacement = build::var(
                unique_name.clone(),
                CaseSensitivity::Sensitive,
                ScopeQualifier::Unqualified,
            )
            .with_meta(Meta::IsSyntheticName);
            Ok(SubstitutionPair::new(item.expr.clone(), replacement))
        })
        .collect()
}

/// A key is substituted only when its alias was synthesized and it is a path of
/// exactly one step.
fn is_substitutable(item: &GroupByItem) -> bool {
    let synthetic = item.alias.as_ref().is_some_and(SymbolicName::is_synthetic);
    let single_step = matches!(&item.expr.kind, ExprKind::Path(path) if path.steps.len() == 1);
    synthetic && single_step
}

impl Substituting for GroupByPathRewriter {
    fn substitutions(&self) -> &SubstitutionMap {
        &self.substitutions
    }
}

impl Rewriter for GroupByPathRewriter {
    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn rewrite_expr(&mut self, expr: &Expr) -> RewriteResult<Expr> {
        walk_substituted(self, expr)
    }

    /// Aggregates range over the rows before grouping, so their arguments are
    /// rewritten without any group key substitution.
    fn rewrite_call_agg(&mut self, agg: &CallAgg, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_call_agg(&mut self.scoped(SubstitutionMap::new()), agg, meta)
    }

    fn rewrite_select(&mut self, select: &Select, meta: &MetaContainer) -> RewriteResult<Expr> {
        let enclosing = self.visible_enclosing(select.from.as_ref());
        let mut combined = enclosing.clone();
        if let Some(group_by) = &select.group_by {
            combined.extend(group_key_substitutions(group_by)?);
        }

        let mut outer = self.scoped(enclosing);
        let mut inner = self.scoped(combined);

        let from = select
            .from
            .as_ref()
            .map(|from| self.rewrite_from_clause(from))
            .transpose()?;
        let let_clause = select
            .let_clause
            .as_ref()
            .map(|clause| outer.rewrite_let_clause(clause))
            .transpose()?;
        let where_clause = select
            .where_clause
            .as_deref()
            .map(|condition| outer.rewrite_select_where(condition).map(Box::new))
            .transpose()?;
        let group_by = select
            .group_by
            .as_ref()
            .map(|group_by| outer.rewrite_group_by(group_by))
            .transpose()?;
        let having = select
            .having
            .as_deref()
            .map(|condition| inner.rewrite_select_having(condition).map(Box::new))
            .transpose()?;
        let projection = inner.rewrite_projection(&select.projection)?;
        let order_by = select
            .order_by
            .as_ref()
            .map(|order_by| inner.rewrite_order_by(order_by))
            .transpose()?;
        let limit = select
            .limit
            .as_deref()
            .map(|limit| outer.rewrite_select_limit(limit).map(Box::new))
            .transpose()?;

        let rewritten = Select {
            quantifier: select.quantifier,
            projection,
            from,
            let_clause,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
        };
        Ok(Expr::new(ExprKind::Select(Box::new(rewritten)), meta.clone()))
    }
}
