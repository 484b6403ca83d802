//! Expands `SELECT *` into an explicit projection list.

use crate::ast::SourceLocation;
use crate::ast::build;
use crate::ast::expression::{CaseSensitivity, Expr, ExprKind, ScopeQualifier};
use crate::ast::meta::MetaContainer;
use crate::ast::query::{FromSource, GroupBy, Projection, Select, SelectItem, SymbolicName};
use crate::ast::rewrite::{RewriteResult, Rewriter};
use crate::interrupt::Interrupt;
use crate::semantic::error::{SemanticError, SemanticResult};

/// Replaces a bare `*` projection.
///
/// Without GROUP BY, `*` becomes one `alias.*` item per FROM source, each followed
/// by its AT and BY variables. With GROUP BY, `*` becomes one item per key,
/// referencing the key's unique name under the key's alias, followed by the group
/// name if one was declared.
///
/// Requires the FROM source and GROUP BY alias passes to have run.
pub struct SelectStarRewriter {
    interrupt: Interrupt,
}

impl SelectStarRewriter {
    /// Creates the pass for the outermost level.
    pub fn new(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }
}

impl Rewriter for SelectStarRewriter {
    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn rewrite_select(&mut self, select: &Select, meta: &MetaContainer) -> RewriteResult<Expr> {
        let mut rewritten = self.rewrite_select_clauses(select)?;
        if let Projection::List(items) = &rewritten.projection
            && items.iter().any(|item| matches!(item, SelectItem::Star))
        {
            if items.len() > 1 {
                return Err(SemanticError::MalformedProjection {
                    message: "`*` cannot be combined with other projection items".to_string(),
                    location: meta.source_location(),
                });
            }
            let expanded = match (&rewritten.group_by, &rewritten.from) {
                (Some(group_by), _) => expand_group_by(group_by)?,
                (None, Some(from)) => expand_from(from)?,
                (None, None) => {
                    return Err(SemanticError::MalformedProjection {
                        message: "`*` requires a FROM or GROUP BY clause".to_string(),
                        location: meta.source_location(),
                    });
                }
            };
            tracing::trace!(items = expanded.len(), "expanded SELECT *");
            rewritten.projection = Projection::List(expanded);
        }
        Ok(Expr::new(ExprKind::Select(Box::new(rewritten)), meta.clone()))
    }
}

fn reference(name: &SymbolicName) -> Expr {
    let expr = build::var(
        name.name.clone(),
        CaseSensitivity::Sensitive,
        ScopeQualifier::Unqualified,
    );
    located(expr, name.meta.source_location())
}

fn located(expr: Expr, location: Option<SourceLocation>) -> Expr {
    Expr::new(
        expr.kind,
        location.map(MetaContainer::located).unwrap_or_default(),
    )
}

fn visible(name: &SymbolicName) -> SymbolicName {
    SymbolicName {
        name: name.name.clone(),
        meta: name.meta.location_only(),
    }
}

fn expand_from(from: &FromSource) -> SemanticResult<Vec<SelectItem>> {
    let mut items = Vec::new();
    for vars in from.leaf_variables() {
        let as_name = vars
            .as_name
            .as_ref()
            .ok_or_else(|| SemanticError::internal("FROM source has no alias"))?;
        items.push(SelectItem::ProjectAll(reference(as_name)));
        for name in [&vars.at_name, &vars.by_name].into_iter().flatten() {
            items.push(SelectItem::Expr {
                expr: reference(name),
                alias: Some(visible(name)),
            });
        }
    }
    Ok(items)
}

fn expand_group_by(group_by: &GroupBy) -> SemanticResult<Vec<SelectItem>> {
    let mut items = Vec::with_capacity(group_by.items.len() + 1);
    for item in &group_by.items {
        let alias = item
            .alias
            .as_ref()
            .ok_or_else(|| SemanticError::internal("GROUP BY item has no alias"))?;
        let unique_name = alias.meta.unique_name().ok_or_else(|| {
            SemanticError::internal(format!("GROUP BY item '{}' has no unique name", alias.name))
        })?;
        let expr = located(
            build::var(
                unique_name.clone(),
                CaseSensitivity::Sensitive,
                ScopeQualifier::Unqualified,
            ),
            item.expr.location(),
        );
        items.push(SelectItem::Expr {
            expr,
            alias: Some(visible(alias)),
        });
    }
    if let Some(group_name) = &group_by.group_name {
        items.push(SelectItem::Expr {
            expr: reference(group_name),
            alias: Some(visible(group_name)),
        });
    }
    Ok(items)
}
