//! Synthesizes aliases for unaliased projection items.

use crate::ast::query::{Projection, Select, SelectItem};
use crate::ast::rewrite::{RewriteResult, Rewriter, walk_select_clauses};
use crate::interrupt::Interrupt;
use crate::semantic::passes::alias_support::{extract_column_alias, synthetic_name};

/// Gives every `expr` item of a projection list an alias.
///
/// Ordinals are the item's position in its own projection list, so numbering
/// restarts in every nested SELECT.
pub struct SelectListAliasRewriter {
    interrupt: Interrupt,
}

impl SelectListAliasRewriter {
    /// Creates the pass for the outermost level.
    pub fn new(interrupt: Interrupt) -> Self {
        Self { interrupt }
    }
}

impl Rewriter for SelectListAliasRewriter {
    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn rewrite_select_clauses(&mut self, select: &Select) -> RewriteResult<Select> {
        let mut rewritten = walk_select_clauses(self, select)?;
        if let Projection::List(items) = &mut rewritten.projection {
            for (ordinal, item) in items.iter_mut().enumerate() {
                if let SelectItem::Expr { expr, alias } = item
                    && alias.is_none()
                {
                    let name = extract_column_alias(expr, ordinal);
                    tracing::trace!(alias = %name, ordinal, "synthesized projection alias");
                    *alias = Some(synthetic_name(name, expr));
                }
            }
        }
        Ok(rewritten)
    }
}
