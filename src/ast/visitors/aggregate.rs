//! Aggregate call-site collection visitor.

use crate::ast::expression::{CallAgg, Expr};
use crate::ast::visit::{Visit, VisitResult};
use crate::interrupt::Interrupt;
use crate::semantic::error::SemanticError;

/// Collects every aggregate call node, in visit order, across all nesting levels.
///
/// Calls nested inside another call's argument are collected after their parent.
#[derive(Debug, Clone, Default)]
pub struct AggregateCollector {
    interrupt: Interrupt,
    calls: Vec<Expr>,
}

impl AggregateCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the aggregate calls of `expr`.
    pub fn collect(expr: &Expr) -> Vec<Expr> {
        let mut collector = Self::new();
        let _ = collector.visit_expr(expr);
        collector.calls
    }

    /// Aggregate calls in traversal order.
    pub fn calls(&self) -> &[Expr] {
        &self.calls
    }
}

impl Visit for AggregateCollector {
    type Break = SemanticError;

    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn visit_call_agg(&mut self, agg: &CallAgg, expr: &Expr) -> VisitResult<Self::Break> {
        self.calls.push(expr.clone());
        self.visit_expr(&agg.arg)
    }
}
