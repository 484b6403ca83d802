//! Variable collection visitor.

use std::collections::BTreeSet;
use std::ops::ControlFlow;

use smol_str::SmolStr;

use crate::ast::expression::{Expr, VarRef};
use crate::ast::query::SymbolicName;
use crate::ast::visit::{Visit, VisitResult};
use crate::interrupt::Interrupt;
use crate::semantic::error::SemanticError;

/// Collects variable references and bound names from a tree.
///
/// References are kept in visit order together with the node that carries them,
/// so callers can inspect the reference's metadata.
#[derive(Debug, Clone, Default)]
pub struct VariableCollector {
    interrupt: Interrupt,
    references: Vec<Expr>,
    definitions: BTreeSet<SmolStr>,
}

impl VariableCollector {
    /// Creates a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cancellation handle polled during the walk.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Collects the names referenced anywhere in `expr`.
    pub fn collect_references_from_expression(expr: &Expr) -> BTreeSet<SmolStr> {
        let mut collector = Self::new();
        let _ = collector.visit_expr(expr);
        collector
            .references
            .iter()
            .filter_map(|reference| reference.as_var_ref().map(|var| var.name.clone()))
            .collect()
    }

    /// Returns collected variable reference nodes in visit order.
    pub fn references(&self) -> &[Expr] {
        &self.references
    }

    /// Returns collected bound names (aliases, AT/BY names, LET names, group names).
    pub fn definitions(&self) -> &BTreeSet<SmolStr> {
        &self.definitions
    }

    /// Returns collected variable reference nodes and consumes this collector.
    pub fn into_references(self) -> Vec<Expr> {
        self.references
    }
}

impl Visit for VariableCollector {
    type Break = SemanticError;

    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn visit_var_ref(&mut self, _var: &VarRef, expr: &Expr) -> VisitResult<Self::Break> {
        self.references.push(expr.clone());
        ControlFlow::Continue(())
    }

    fn visit_symbolic_name(&mut self, name: &SymbolicName) -> VisitResult<Self::Break> {
        self.definitions.insert(name.name.clone());
        ControlFlow::Continue(())
    }
}
