//! Substitution of sub-trees by structural equivalence.
//!
//! Lookups key on [`Expr`]'s `PartialEq`/`Hash`, which ignore metadata, so a target
//! matches every occurrence of the same bare tree regardless of where it was written.

use std::collections::HashMap;

use crate::ast::expression::Expr;
use crate::ast::meta::Meta;
use crate::ast::rewrite::{RewriteResult, Rewriter, walk_expr};
use crate::interrupt::Interrupt;

/// A registered target and the expression that replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionPair {
    pub target: Expr,
    pub replacement: Expr,
}

impl SubstitutionPair {
    /// Pairs a target with its replacement.
    pub fn new(target: Expr, replacement: Expr) -> Self {
        Self {
            target,
            replacement,
        }
    }
}

/// Substitutions keyed by their target.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionMap {
    pairs: HashMap<Expr, SubstitutionPair>,
}

impl SubstitutionMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pair, replacing any pair with an equivalent target.
    pub fn insert(&mut self, pair: SubstitutionPair) {
        self.pairs.insert(pair.target.clone(), pair);
    }

    /// Returns the replacement for `expr` if `expr` is equivalent to a target.
    ///
    /// When `expr` carries a source location the replacement is returned with that
    /// location, so diagnostics point at the matched occurrence.
    pub fn lookup(&self, expr: &Expr) -> Option<Expr> {
        let pair = self.pairs.get(expr)?;
        let replacement = match expr.location() {
            Some(location) => pair
                .replacement
                .clone()
                .with_meta(Meta::SourceLocation(location)),
            None => pair.replacement.clone(),
        };
        Some(replacement)
    }

    /// Keeps only the pairs for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&SubstitutionPair) -> bool) {
        self.pairs.retain(|_, pair| keep(pair));
    }

    /// Registers every pair.
    pub fn extend(&mut self, pairs: impl IntoIterator<Item = SubstitutionPair>) {
        for pair in pairs {
            self.insert(pair);
        }
    }

    /// Registered pairs, in no particular order.
    pub fn pairs(&self) -> impl Iterator<Item = &SubstitutionPair> {
        self.pairs.values()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<SubstitutionPair> for SubstitutionMap {
    fn from_iter<I: IntoIterator<Item = SubstitutionPair>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

/// Replaces every sub-tree equivalent to a registered target.
///
/// A replaced sub-tree is not descended into. Derived rewriters restrict where
/// substitution applies by overriding the entry points that lead into the
/// sub-trees they want to exclude.
pub struct SubstitutionRewriter {
    interrupt: Interrupt,
    substitutions: SubstitutionMap,
}

impl SubstitutionRewriter {
    /// Creates a rewriter applying `substitutions`.
    pub fn new(substitutions: SubstitutionMap, interrupt: Interrupt) -> Self {
        Self {
            interrupt,
            substitutions,
        }
    }
}

impl Substituting for SubstitutionRewriter {
    fn substitutions(&self) -> &SubstitutionMap {
        &self.substitutions
    }
}

impl Rewriter for SubstitutionRewriter {
    fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn rewrite_expr(&mut self, expr: &Expr) -> RewriteResult<Expr> {
        walk_substituted(self, expr)
    }
}

/// A rewriter that carries a set of active substitutions.
pub trait Substituting: Rewriter {
    fn substitutions(&self) -> &SubstitutionMap;
}

/// Returns the replacement for `expr` when one of the rewriter's targets matches,
/// otherwise rewrites `expr`'s children.
///
/// Substituting rewriters call this from [`Rewriter::rewrite_expr`].
pub fn walk_substituted<R: Substituting + ?Sized>(
    rewriter: &mut R,
    expr: &Expr,
) -> RewriteResult<Expr> {
    if let Some(replacement) = rewriter.substitutions().lookup(expr) {
        return Ok(replacement);
    }
    walk_expr(rewriter, expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expression::Call;
    use crate::ast::{ExprKind, MetaContainer, SourceLocation, build};

    fn rewriter(target: Expr, replacement: Expr) -> SubstitutionRewriter {
        let map = [SubstitutionPair::new(target, replacement)]
            .into_iter()
            .collect();
        SubstitutionRewriter::new(map, Interrupt::never())
    }

    #[test]
    fn replaces_every_equivalent_occurrence() {
        let target = build::path(build::id("a"), ["b"]).at(1, 30, 3);
        let mut rewriter = rewriter(target, build::id_sensitive("k"));

        let expr = build::add(
            build::path(build::id("a"), ["b"]).at(1, 8, 3),
            build::path(build::id("a"), ["b"]).at(1, 14, 3),
        );
        let rewritten = rewriter.rewrite_expr(&expr).expect("rewrite");
        let ExprKind::Nary(_, args) = &rewritten.kind else {
            panic!("expected operator");
        };
        assert_eq!(args[0], build::id_sensitive("k"));
        assert_eq!(args[0].location(), Some(SourceLocation::new(1, 8, 3)));
        assert_eq!(args[1].location(), Some(SourceLocation::new(1, 14, 3)));
    }

    #[test]
    fn unlocated_occurrence_keeps_replacement_meta() {
        let replacement = build::id_sensitive("k").at(9, 9, 1);
        let mut rewriter = rewriter(build::id("x"), replacement);
        let rewritten = rewriter.rewrite_expr(&build::id("x")).expect("rewrite");
        assert_eq!(rewritten.location(), Some(SourceLocation::new(9, 9, 1)));
    }

    #[test]
    fn different_trees_are_never_merged() {
        let mut rewriter = rewriter(build::path(build::id("a"), ["b"]), build::id("k"));
        let expr = build::path(build::id("a"), ["c"]);
        assert_eq!(rewriter.rewrite_expr(&expr).expect("rewrite"), expr);
    }

    /// Substitutes everywhere except inside function call arguments.
    struct SkipCalls {
        interrupt: Interrupt,
        substitutions: SubstitutionMap,
    }

    impl Substituting for SkipCalls {
        fn substitutions(&self) -> &SubstitutionMap {
            &self.substitutions
        }
    }

    impl Rewriter for SkipCalls {
        fn interrupt(&self) -> &Interrupt {
            &self.interrupt
        }

        fn rewrite_expr(&mut self, expr: &Expr) -> RewriteResult<Expr> {
            walk_substituted(self, expr)
        }

        fn rewrite_call(&mut self, call: &Call, meta: &MetaContainer) -> RewriteResult<Expr> {
            Ok(Expr::new(ExprKind::Call(call.clone()), meta.clone()))
        }
    }

    #[test]
    fn derived_rewriter_restricts_substitution() {
        let map: SubstitutionMap = [SubstitutionPair::new(build::id("x"), build::int(1))]
            .into_iter()
            .collect();
        let expr = build::add(build::id("x"), build::call("f", vec![build::id("x")]));

        let mut derived = SkipCalls {
            interrupt: Interrupt::never(),
            substitutions: map.clone(),
        };
        let rewritten = derived.rewrite_expr(&expr).expect("rewrite");
        assert_eq!(
            rewritten,
            build::add(build::int(1), build::call("f", vec![build::id("x")]))
        );

        let mut generic = SubstitutionRewriter::new(map, Interrupt::never());
        assert_eq!(
            generic.rewrite_expr(&expr).expect("rewrite"),
            build::add(build::int(1), build::call("f", vec![build::int(1)]))
        );
    }

    #[test]
    fn retain_drops_pairs() {
        let mut map: SubstitutionMap = [
            SubstitutionPair::new(build::id("x"), build::int(1)),
            SubstitutionPair::new(build::id("y"), build::int(2)),
        ]
        .into_iter()
        .collect();
        map.retain(|pair| pair.target != build::id("x"));
        assert_eq!(map.len(), 1);
        assert!(map.lookup(&build::id("x")).is_none());
    }
}
