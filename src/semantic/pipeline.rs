//! Ordered pass pipeline and its configuration.

use crate::ast::expression::Expr;
use crate::ast::rewrite::Rewriter;
use crate::ast::visit::Visit;
use crate::ast::visitors::VariableCollector;
use crate::interrupt::Interrupt;
use crate::semantic::catalog::GlobalBindings;
use crate::semantic::error::{SemanticError, SemanticResult};
use crate::semantic::passes::{
    AggregateRegistrar, FromSourceAliasRewriter, GroupByAliasRewriter, GroupByPathRewriter,
    SelectListAliasRewriter, SelectStarRewriter, StaticTypeContext, StaticTypeRewriter,
};

/// Restrictions on where global bindings may be referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopingConstraint {
    /// Globals may only be referenced before the FROM clause of their level has
    /// been visited, i.e. from FROM source expressions.
    PreventGlobalsExceptInFrom,
    /// Globals may not be referenced from nested queries.
    PreventGlobalsInNestedQueries,
}

/// Configuration for the scope resolution stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopingConfig {
    /// Reject globals referenced after the FROM clause of their level.
    pub prevent_globals_except_in_from: bool,

    /// Reject globals referenced below the outermost query.
    pub prevent_globals_in_nested_queries: bool,
}

impl ScopingConfig {
    /// Enables one constraint.
    pub fn with_constraint(mut self, constraint: ScopingConstraint) -> Self {
        match constraint {
            ScopingConstraint::PreventGlobalsExceptInFrom => {
                self.prevent_globals_except_in_from = true
            }
            ScopingConstraint::PreventGlobalsInNestedQueries => {
                self.prevent_globals_in_nested_queries = true
            }
        }
        self
    }

    /// Builds a configuration with exactly the given constraints enabled.
    pub fn from_constraints(constraints: impl IntoIterator<Item = ScopingConstraint>) -> Self {
        constraints
            .into_iter()
            .fold(Self::default(), Self::with_constraint)
    }
}

/// A stage of the default pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    SelectListAlias,
    FromSourceAlias,
    GroupByAlias,
    AggregateRegistration,
    GroupByPathSubstitution,
    SelectStarExpansion,
}

impl PipelineStage {
    /// Stages in the order they run.
    pub const ORDER: [PipelineStage; 6] = [
        PipelineStage::SelectListAlias,
        PipelineStage::FromSourceAlias,
        PipelineStage::GroupByAlias,
        PipelineStage::AggregateRegistration,
        PipelineStage::GroupByPathSubstitution,
        PipelineStage::SelectStarExpansion,
    ];

    /// Name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::SelectListAlias => "select_list_alias",
            Self::FromSourceAlias => "from_source_alias",
            Self::GroupByAlias => "group_by_alias",
            Self::AggregateRegistration => "aggregate_registration",
            Self::GroupByPathSubstitution => "group_by_path_substitution",
            Self::SelectStarExpansion => "select_star_expansion",
        }
    }

    fn run(self, expr: &Expr, interrupt: &Interrupt) -> SemanticResult<Expr> {
        let interrupt = interrupt.clone();
        match self {
            Self::SelectListAlias => SelectListAliasRewriter::new(interrupt).rewrite_expr(expr),
            Self::FromSourceAlias => FromSourceAliasRewriter::new(interrupt).rewrite_expr(expr),
            Self::GroupByAlias => GroupByAliasRewriter::new(interrupt).rewrite_expr(expr),
            Self::AggregateRegistration => AggregateRegistrar::new(interrupt).rewrite_expr(expr),
            Self::GroupByPathSubstitution => GroupByPathRewriter::new(interrupt).rewrite_expr(expr),
            Self::SelectStarExpansion => SelectStarRewriter::new(interrupt).rewrite_expr(expr),
        }
    }
}

/// The fixed desugaring pipeline: alias passes, aggregate registration, GROUP BY
/// path substitution, then SELECT-* expansion.
#[derive(Debug, Clone, Default)]
pub struct RewritePipeline {
    interrupt: Interrupt,
}

impl RewritePipeline {
    /// Creates a pipeline that is never interrupted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cancellation handle polled by every stage.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Runs every stage over `expr`.
    pub fn run(&self, expr: &Expr) -> SemanticResult<Expr> {
        let mut current = expr.clone();
        for stage in PipelineStage::ORDER {
            tracing::debug!(stage = stage.name(), "running rewrite stage");
            current = stage.run(&current, &self.interrupt)?;
        }
        Ok(current)
    }
}

/// Runs the rewrite pipeline and, when a catalog is supplied, scope resolution.
pub struct SemanticAnalyzer<'c> {
    pipeline: RewritePipeline,
    catalog: Option<&'c dyn GlobalBindings>,
    scoping: ScopingConfig,
    interrupt: Interrupt,
}

impl<'c> SemanticAnalyzer<'c> {
    /// Creates an analyzer that runs only the rewrite pipeline.
    pub fn new() -> Self {
        Self {
            pipeline: RewritePipeline::new(),
            catalog: None,
            scoping: ScopingConfig::default(),
            interrupt: Interrupt::never(),
        }
    }

    /// Sets the global bindings and enables scope resolution.
    pub fn with_catalog(mut self, catalog: &'c dyn GlobalBindings) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the scoping constraints applied during scope resolution.
    pub fn with_scoping(mut self, scoping: ScopingConfig) -> Self {
        self.scoping = scoping;
        self
    }

    /// Sets the cancellation handle polled by every stage.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.pipeline = self.pipeline.with_interrupt(interrupt.clone());
        self.interrupt = interrupt;
        self
    }

    /// Rewrites `expr` into its canonical form.
    ///
    /// The first error aborts the whole statement.
    pub fn analyze(&self, expr: &Expr) -> SemanticResult<Expr> {
        let rewritten = self.pipeline.run(expr)?;
        let Some(catalog) = self.catalog else {
            return Ok(rewritten);
        };

        tracing::debug!(stage = "static_type", "running scope resolution");
        let context = StaticTypeContext::new(catalog, self.scoping, self.interrupt.clone());
        let resolved = StaticTypeRewriter::new(&context).rewrite_expr(&rewritten)?;
        self.check_resolved(&resolved)?;
        Ok(resolved)
    }

    /// Every variable reference must carry a static type once resolution ran.
    fn check_resolved(&self, expr: &Expr) -> SemanticResult<()> {
        let mut collector = VariableCollector::new().with_interrupt(self.interrupt.clone());
        if let std::ops::ControlFlow::Break(error) = collector.visit_expr(expr) {
            return Err(error);
        }
        match collector
            .references()
            .iter()
            .find(|reference| reference.meta.static_type().is_none())
        {
            Some(reference) => Err(SemanticError::internal(format!(
                "variable reference {:?} has no static type after resolution",
                reference.as_var_ref().map(|var| var.name.as_str())
            ))),
            None => Ok(()),
        }
    }
}

impl<'c> Default for SemanticAnalyzer<'c> {
    fn default() -> Self {
        Self::new()
    }
}
