//! Alias derivation shared by the alias passes.

use smol_str::{SmolStr, format_smolstr};

use crate::ast::expression::{Expr, ExprKind};
use crate::ast::meta::{Meta, MetaContainer};
use crate::ast::query::SymbolicName;

/// Derives the alias of an unaliased item from the shape of its expression.
///
/// An identifier yields its name; a path whose last step indexes by a string
/// literal yields that string; anything else yields `_<ordinal + 1>`.
pub fn extract_column_alias(expr: &Expr, ordinal: usize) -> SmolStr {
    match &expr.kind {
        ExprKind::Id(var) => var.name.clone(),
        ExprKind::Path(path) => match path.steps.last().and_then(|step| step.literal_name()) {
            Some(name) => name.clone(),
            None => positional_alias(ordinal),
        },
        _ => positional_alias(ordinal),
    }
}

/// `_1`, `_2`, ... for the 0-based `ordinal`.
pub fn positional_alias(ordinal: usize) -> SmolStr {
    format_smolstr!("_{}", ordinal + 1)
}

/// A synthesized alias: marked synthetic and located at the aliased expression.
pub fn synthetic_name(name: SmolStr, expr: &Expr) -> SymbolicName {
    let mut meta = MetaContainer::new().with(Meta::IsSyntheticName);
    if let Some(location) = expr.location() {
        meta.insert(Meta::SourceLocation(location));
    }
    SymbolicName { name, meta }
}
