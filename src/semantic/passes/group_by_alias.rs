//! Synthesizes GROUP BY item aliases and assigns each key its unique name.

use smol_str::{SmolStr, format_smolstr};

use crate::ast::expression::Expr;
use crate::ast::meta::{Meta, MetaContainer};
use crate::ast::query::{GroupBy, Select};
use crate::ast::rewrite::{RewriteResult, Rewriter, walk_group_by, walk_select};
use crate::interrupt::Interrupt;
use crate::semantic::passes::alias_support::{extract_column_alias, synthetic_name};

/// Unique name of the GROUP BY key at `index` of a SELECT nested `depth` levels deep.
pub fn group_key_unique_name(depth: usize, index: usize) -> SmolStr {
    format_smolstr!("$__group_by_{depth}_item_{index}")
}

/// Gives every GROUP BY item an alias carrying a [`Meta::UniqueName`].
///
/// User-written aliases are kept and only receive the unique name. The outermost
/// SELECT is at depth 1.
pub struct GroupByAliasRewriter {
    interrupt: Interrupt,
    depth: usize,
}

impl GroupByAliasRewriter {
    /// Creates the pass for the outermost level.
    pub fn new(interrupt: Interrupt) -> Self {
        Self {
            interrupt,
            depth: 0,
        }
    }
}

impl Rewriter for GroupByAliasRewriter {
    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn rewrite_select(&mut self, select: &Select, meta: &MetaContainer) -> RewriteResult<Expr> {
        let mut nested = Self {
            interrupt: self.interrupt.clone(),
            depth: self.depth + 1,
        };
        walk_select(&mut nested, select, meta)
    }

    fn rewrite_group_by(&mut self, group_by: &GroupBy) -> RewriteResult<GroupBy> {
        let mut rewritten = walk_group_by(self, group_by)?;
        for (index, item) in rewritten.items.iter_mut().enumerate() {
            let unique_name = group_key_unique_name(self.depth, index);
            let alias = match item.alias.take() {
                Some(alias) => alias,
                None => synthetic_name(extract_column_alias(&item.expr, index), &item.expr),
            };
            tracing::trace!(
                alias = %alias.name,
                unique_name = %unique_name,
                "assigned GROUP BY key name"
            );
            item.alias = Some(alias.with_meta(Meta::UniqueName(unique_name)));
        }
        Ok(rewritten)
    }
}
