//! Registers the aggregate call-sites of every SELECT.

use crate::ast::expression::{CallAgg, Expr};
use crate::ast::meta::{Meta, MetaContainer};
use crate::ast::query::{Projection, Select};
use crate::ast::rewrite::{RewriteResult, Rewriter, walk_call_agg, walk_projection, walk_select};
use crate::interrupt::Interrupt;

/// Assigns each aggregate call of a projection or HAVING clause a dense
/// [`Meta::AggregateRegisterId`] and attaches the ordered call-sites to the SELECT
/// as [`Meta::AggregateCallSiteList`].
///
/// Every SELECT gets a fresh registrar, so aggregates never register across a
/// query boundary.
pub struct AggregateRegistrar {
    interrupt: Interrupt,
    call_sites: Vec<Expr>,
    registering: bool,
}

impl AggregateRegistrar {
    /// Creates the registrar for the outermost level.
    pub fn new(interrupt: Interrupt) -> Self {
        Self {
            interrupt,
            call_sites: Vec::new(),
            registering: false,
        }
    }

    fn with_registering<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> RewriteResult<T>,
    ) -> RewriteResult<T> {
        let previous = std::mem::replace(&mut self.registering, true);
        let result = f(self);
        self.registering = previous;
        result
    }
}

impl Rewriter for AggregateRegistrar {
    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn rewrite_select(&mut self, select: &Select, meta: &MetaContainer) -> RewriteResult<Expr> {
        let mut nested = Self::new(self.interrupt.clone());
        walk_select(&mut nested, select, meta)
    }

    fn rewrite_select_having(&mut self, condition: &Expr) -> RewriteResult<Expr> {
        self.with_registering(|registrar| registrar.rewrite_expr(condition))
    }

    fn rewrite_projection(&mut self, projection: &Projection) -> RewriteResult<Projection> {
        self.with_registering(|registrar| walk_projection(registrar, projection))
    }

    fn rewrite_call_agg(&mut self, agg: &CallAgg, meta: &MetaContainer) -> RewriteResult<Expr> {
        let rewritten = walk_call_agg(self, agg, meta)?;
        if !self.registering {
            return Ok(rewritten);
        }
        let register = self.call_sites.len();
        let registered = rewritten.with_meta(Meta::AggregateRegisterId(register));
        self.call_sites.push(registered.clone());
        Ok(registered)
    }

    fn rewrite_select_meta(
        &mut self,
        _select: &Select,
        meta: &MetaContainer,
    ) -> RewriteResult<MetaContainer> {
        tracing::trace!(call_sites = self.call_sites.len(), "registered aggregates");
        Ok(meta
            .clone()
            .with(Meta::AggregateCallSiteList(std::mem::take(&mut self.call_sites))))
    }
}
