//! Common test utilities
//!
//! Shared helpers for the integration tests.
//!
//! # Pipeline Helpers
//! - [`rewrite`] - Run the rewrite pipeline, panicking on errors
//! - [`analyze_with`] - Run the pipeline and scope resolution against a catalog
//!
//! # Tree Helpers
//! - [`select_of`] - Borrow the SELECT node of an expression
//! - [`projection_items`] - Borrow a SELECT's projection list
//! - [`aliases`] - Collect the aliases of a projection list

#![allow(dead_code)]

use sqlpp_rewrite::ast::{Expr, Projection, Select, SelectItem, SymbolicName};
use sqlpp_rewrite::semantic::{
    GlobalBindings, MapBindings, RewritePipeline, ScopingConfig, SemanticAnalyzer,
    SemanticResult, StaticType,
};

/// Run the rewrite pipeline and return the rewritten tree.
///
/// # Panics
/// Panics if any pass fails.
pub fn rewrite(expr: &Expr) -> Expr {
    match RewritePipeline::new().run(expr) {
        Ok(rewritten) => rewritten,
        Err(error) => panic!("pipeline failed: {error:?}"),
    }
}

/// Run the pipeline followed by scope resolution.
pub fn analyze_with(
    expr: &Expr,
    catalog: &dyn GlobalBindings,
    scoping: ScopingConfig,
) -> SemanticResult<Expr> {
    SemanticAnalyzer::new()
        .with_catalog(catalog)
        .with_scoping(scoping)
        .analyze(expr)
}

/// A catalog binding each of `names` to a bag of anything.
pub fn catalog_of(names: &[&str]) -> MapBindings {
    names.iter().fold(MapBindings::new(), |catalog, name| {
        catalog.with_binding(*name, StaticType::any_bag())
    })
}

/// Borrow the SELECT node of `expr`.
///
/// # Panics
/// Panics if `expr` is not a SELECT.
pub fn select_of(expr: &Expr) -> &Select {
    expr.as_select()
        .unwrap_or_else(|| panic!("expected SELECT, found {expr:?}"))
}

/// Borrow the projection list of the SELECT `expr`.
///
/// # Panics
/// Panics if `expr` is not a SELECT with a projection list.
pub fn projection_items(expr: &Expr) -> &[SelectItem] {
    match &select_of(expr).projection {
        Projection::List(items) => items,
        other => panic!("expected projection list, found {other:?}"),
    }
}

/// The aliases of a projection list, `None` for items without one.
pub fn aliases(items: &[SelectItem]) -> Vec<Option<&SymbolicName>> {
    items
        .iter()
        .map(|item| match item {
            SelectItem::Expr { alias, .. } => alias.as_ref(),
            _ => None,
        })
        .collect()
}

/// The alias names of a projection list.
pub fn alias_names(items: &[SelectItem]) -> Vec<&str> {
    aliases(items)
        .into_iter()
        .map(|alias| alias.map(SymbolicName::as_str).unwrap_or(""))
        .collect()
}

/// The expression of a projection item.
///
/// # Panics
/// Panics on `*` and `expr.*` items.
pub fn item_expr(item: &SelectItem) -> &Expr {
    match item {
        SelectItem::Expr { expr, .. } => expr,
        other => panic!("expected expression item, found {other:?}"),
    }
}
