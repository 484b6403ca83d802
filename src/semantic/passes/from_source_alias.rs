//! Synthesizes `AS` aliases for unaliased FROM sources.

use crate::ast::dml::Dml;
use crate::ast::expression::Expr;
use crate::ast::meta::MetaContainer;
use crate::ast::query::{FromSource, Select};
use crate::ast::rewrite::{RewriteResult, Rewriter, walk_dml, walk_from_source, walk_select};
use crate::interrupt::Interrupt;
use crate::semantic::passes::alias_support::{extract_column_alias, synthetic_name};

/// Gives every scan and unpivot source an `AS` alias.
///
/// Leaf sources are numbered in declaration order across joins. Each SELECT and
/// DML statement numbers its own sources from zero.
pub struct FromSourceAliasRewriter {
    interrupt: Interrupt,
    ordinal: usize,
}

impl FromSourceAliasRewriter {
    /// Creates the pass for the outermost level.
    pub fn new(interrupt: Interrupt) -> Self {
        Self {
            interrupt,
            ordinal: 0,
        }
    }

    fn nested(&self) -> Self {
        Self::new(self.interrupt.clone())
    }
}

impl Rewriter for FromSourceAliasRewriter {
    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn rewrite_select(&mut self, select: &Select, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_select(&mut self.nested(), select, meta)
    }

    fn rewrite_dml(&mut self, dml: &Dml, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_dml(&mut self.nested(), dml, meta)
    }

    fn rewrite_from_source(&mut self, source: &FromSource) -> RewriteResult<FromSource> {
        let source = match source {
            FromSource::Scan { expr, vars } | FromSource::Unpivot { expr, vars } => {
                let ordinal = self.ordinal;
                self.ordinal += 1;
                if vars.as_name.is_some() {
                    return walk_from_source(self, source);
                }

                let name = extract_column_alias(expr, ordinal);
                tracing::trace!(alias = %name, ordinal, "synthesized FROM source alias");
                let mut vars = vars.clone();
                vars.as_name = Some(synthetic_name(name, expr));
                match source {
                    FromSource::Unpivot { .. } => FromSource::Unpivot {
                        expr: expr.clone(),
                        vars,
                    },
                    _ => FromSource::Scan {
                        expr: expr.clone(),
                        vars,
                    },
                }
            }
            FromSource::Join(_) => return walk_from_source(self, source),
        };
        walk_from_source(self, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::ast::query::{LetVariables, SymbolicName};

    fn rewrite(expr: &Expr) -> Expr {
        FromSourceAliasRewriter::new(Interrupt::never())
            .rewrite_expr(expr)
            .expect("rewrite")
    }

    fn source_aliases(select: &Select) -> Vec<String> {
        select
            .from
            .as_ref()
            .expect("from")
            .leaf_variables()
            .into_iter()
            .map(|vars| {
                vars.as_name
                    .as_ref()
                    .map(SymbolicName::as_str)
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn aliases_follow_declaration_order_across_joins() {
        let query = build::select_star()
            .with_from(build::join(
                build::table("t1"),
                build::join(
                    build::scan(build::int(1), LetVariables::none()),
                    build::table_as("t3", "x"),
                ),
            ))
            .into_expr();

        let rewritten = rewrite(&query);
        let select = rewritten.as_select().expect("select");
        assert_eq!(source_aliases(select), vec!["t1", "_2", "x"]);

        let from = select.from.as_ref().expect("from");
        let vars = from.leaf_variables();
        assert!(vars[0].as_name.as_ref().is_some_and(SymbolicName::is_synthetic));
        assert!(!vars[2].as_name.as_ref().is_some_and(SymbolicName::is_synthetic));
    }

    #[test]
    fn path_source_uses_last_step() {
        let query = build::select_star()
            .with_from(build::scan(
                build::path(build::id("db"), ["orders"]),
                LetVariables::none(),
            ))
            .into_expr();
        let rewritten = rewrite(&query);
        assert_eq!(
            source_aliases(rewritten.as_select().expect("select")),
            vec!["orders"]
        );
    }

    #[test]
    fn nested_select_numbers_its_own_sources() {
        let inner = build::select_star()
            .with_from(build::scan(build::int(5), LetVariables::none()))
            .into_expr();
        let query = build::select_star()
            .with_from(build::join(
                build::scan(build::int(1), LetVariables::none()),
                build::scan(inner, LetVariables::none()),
            ))
            .into_expr();

        let rewritten = rewrite(&query);
        let select = rewritten.as_select().expect("select");
        assert_eq!(source_aliases(select), vec!["_1", "_2"]);

        let from = select.from.as_ref().expect("from");
        let FromSource::Join(join) = from else {
            panic!("expected join");
        };
        let (inner_expr, _) = join.right.as_binding().expect("scan");
        assert_eq!(
            source_aliases(inner_expr.as_select().expect("nested select")),
            vec!["_1"]
        );
    }

    #[test]
    fn fully_aliased_tree_is_unchanged() {
        let query = build::select_star()
            .with_from(build::table_as("t", "a"))
            .into_expr();
        assert_eq!(rewrite(&query), query);
    }
}
