//! Scope resolution and static typing of variable references.
//!
//! Every SELECT and DML statement opens a new scope level one deeper than the
//! level it appears in. Level 0 is the global scope served by the catalog; the
//! outermost statement is level 1. A level owns the names bound by its own FROM
//! and LET clauses (its locals) and, once its GROUP BY has been visited, the
//! grouping names. A reference resolves to the first binding found along the
//! level's search order and is classified by the depth it was found at:
//!
//! - depth 0: global
//! - below the current depth: lexical
//! - the current depth: local
//!
//! Lexical and local hits are retagged [`ScopeQualifier::Lexical`]; global hits are
//! retagged [`ScopeQualifier::Unqualified`]. Every resolved reference carries a
//! [`Meta::StaticType`].

use smol_str::SmolStr;

use crate::ast::build;
use crate::ast::dml::Dml;
use crate::ast::expression::{
    CaseSensitivity, Expr, ExprKind, PathExpr, PathStep, ScopeQualifier, VarRef, eq_ignore_case,
};
use crate::ast::meta::{Meta, MetaContainer};
use crate::ast::query::{FromSource, GroupBy, LetBinding, LetVariables, Select, SymbolicName};
use crate::ast::rewrite::{RewriteResult, Rewriter, walk_dml, walk_group_by, walk_path, walk_select};
use crate::interrupt::Interrupt;
use crate::semantic::catalog::{BindingName, CatalogError, GlobalBindings};
use crate::semantic::error::{SemanticError, SemanticResult};
use crate::semantic::pipeline::ScopingConfig;
use crate::semantic::types::StaticType;

/// Order in which a level probes its scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeSearchOrder {
    /// Local, then enclosing levels outward, then globals.
    LexicalThenGlobal,
    /// Globals, then local, then enclosing levels outward. Used while resolving a
    /// FROM source's own value expression.
    GlobalThenLexical,
}

/// Classification of a resolved binding.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedBinding {
    Global(StaticType),
    Lexical(StaticType),
    Local(StaticType),
}

impl ResolvedBinding {
    /// Type of the binding.
    pub fn static_type(&self) -> &StaticType {
        match self {
            ResolvedBinding::Global(ty)
            | ResolvedBinding::Lexical(ty)
            | ResolvedBinding::Local(ty) => ty,
        }
    }
}

/// Inputs shared by every level of one resolution run.
pub struct StaticTypeContext<'a> {
    globals: &'a dyn GlobalBindings,
    config: ScopingConfig,
    interrupt: Interrupt,
}

impl<'a> StaticTypeContext<'a> {
    /// Creates the context for one resolution run.
    pub fn new(
        globals: &'a dyn GlobalBindings,
        config: ScopingConfig,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            globals,
            config,
            interrupt,
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    name: SmolStr,
    ty: StaticType,
}

impl Binding {
    fn matches(&self, var: &VarRef) -> bool {
        var.case.matches(&var.name, &self.name)
    }
}

/// Resolves the variable references of one scope level.
///
/// A nested statement gets a fresh resolver whose parent is this one, borrowed
/// as it stands when the statement is entered.
pub struct StaticTypeRewriter<'a> {
    context: &'a StaticTypeContext<'a>,
    parent: Option<&'a StaticTypeRewriter<'a>>,
    depth: usize,
    locals: Vec<Binding>,
    grouping: Vec<Binding>,
    search_order: ScopeSearchOrder,
    from_visited: bool,
    single_source: Option<SmolStr>,
}

impl<'a> StaticTypeRewriter<'a> {
    /// Creates the resolver of the global level.
    pub fn new(context: &'a StaticTypeContext<'a>) -> Self {
        Self {
            context,
            parent: None,
            depth: 0,
            locals: Vec::new(),
            grouping: Vec::new(),
            search_order: ScopeSearchOrder::LexicalThenGlobal,
            from_visited: false,
            single_source: None,
        }
    }

    fn nested(&self) -> StaticTypeRewriter<'_> {
        StaticTypeRewriter {
            context: self.context,
            parent: Some(self),
            depth: self.depth + 1,
            locals: Vec::new(),
            grouping: Vec::new(),
            search_order: ScopeSearchOrder::LexicalThenGlobal,
            from_visited: false,
            single_source: None,
        }
    }

    /// Nesting depth of this level. The global level is 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Binds a FROM or LET name at this level.
    fn add_local(&mut self, name: &SymbolicName) -> SemanticResult<()> {
        if self
            .locals
            .iter()
            .any(|local| eq_ignore_case(&local.name, &name.name))
        {
            return Err(SemanticError::AmbiguousBinding {
                name: name.name.clone(),
                location: name.meta.source_location(),
            });
        }
        tracing::trace!(name = %name.name, depth = self.depth, "bound local");
        self.locals.push(Binding {
            name: name.name.clone(),
            ty: StaticType::Any,
        });
        Ok(())
    }

    fn add_grouping(&mut self, name: &SmolStr, ty: StaticType) {
        self.grouping.push(Binding {
            name: name.clone(),
            ty,
        });
    }

    fn find_at_level(&self, var: &VarRef) -> Option<&StaticType> {
        self.locals
            .iter()
            .chain(self.grouping.iter())
            .find(|binding| binding.matches(var))
            .map(|binding| &binding.ty)
    }

    /// Probes this level, then every enclosing level outward.
    fn find_lexical(&self, var: &VarRef) -> Option<ResolvedBinding> {
        let mut level = Some(self);
        while let Some(current) = level {
            if current.depth == 0 {
                break;
            }
            if let Some(ty) = current.find_at_level(var) {
                return Some(if current.depth == self.depth {
                    ResolvedBinding::Local(ty.clone())
                } else {
                    ResolvedBinding::Lexical(ty.clone())
                });
            }
            level = current.parent;
        }
        None
    }

    fn find_global(
        &self,
        var: &VarRef,
        meta: &MetaContainer,
    ) -> SemanticResult<Option<ResolvedBinding>> {
        let name = BindingName::new(var.name.clone(), var.case.into());
        match self.context.globals.lookup_binding(&name) {
            Ok(found) => Ok(found.map(ResolvedBinding::Global)),
            Err(CatalogError::Ambiguous { name, .. }) => Err(SemanticError::AmbiguousBinding {
                name,
                location: meta.source_location(),
            }),
            Err(error @ CatalogError::CatalogUnavailable) => {
                Err(SemanticError::internal(error.to_string()))
            }
        }
    }

    fn resolve(
        &self,
        var: &VarRef,
        meta: &MetaContainer,
    ) -> SemanticResult<Option<ResolvedBinding>> {
        let order = match var.qualifier {
            ScopeQualifier::Lexical => ScopeSearchOrder::LexicalThenGlobal,
            ScopeQualifier::Unqualified => self.search_order,
        };
        match order {
            ScopeSearchOrder::LexicalThenGlobal => match self.find_lexical(var) {
                Some(found) => Ok(Some(found)),
                None => self.find_global(var, meta),
            },
            ScopeSearchOrder::GlobalThenLexical => match self.find_global(var, meta)? {
                Some(found) => Ok(Some(found)),
                None => Ok(self.find_lexical(var)),
            },
        }
    }

    /// Rewrites `name` into `<source>.name` against the single FROM source.
    fn qualify_with_source(&self, source: &SmolStr, var: &VarRef, meta: &MetaContainer) -> Expr {
        let source_ref = VarRef::new(
            source.clone(),
            CaseSensitivity::Sensitive,
            ScopeQualifier::Lexical,
        );
        let source_type = self.find_at_level(&source_ref).cloned().unwrap_or(StaticType::Any);
        let root = Expr::new(
            ExprKind::Id(source_ref),
            meta.location_only().with(Meta::StaticType(source_type)),
        );
        tracing::trace!(name = %var.name, source = %source, "qualified with single FROM source");
        Expr::new(
            ExprKind::Path(PathExpr {
                root: Box::new(root),
                steps: vec![PathStep::Index {
                    expr: build::string(var.name.clone()),
                    case: var.case,
                }],
            }),
            meta.clone(),
        )
    }

    fn check_global_access(&self, var: &VarRef, meta: &MetaContainer) -> SemanticResult<()> {
        let config = &self.context.config;
        let outside_from = config.prevent_globals_except_in_from && self.from_visited;
        let nested = config.prevent_globals_in_nested_queries && self.depth > 1;
        if outside_from || nested {
            return Err(SemanticError::IllegalGlobalAccess {
                name: var.name.clone(),
                location: meta.source_location(),
            });
        }
        Ok(())
    }

    fn with_search_order<T>(
        &mut self,
        order: ScopeSearchOrder,
        f: impl FnOnce(&mut Self) -> RewriteResult<T>,
    ) -> RewriteResult<T> {
        let previous = std::mem::replace(&mut self.search_order, order);
        let result = f(self);
        self.search_order = previous;
        result
    }
}

/// Joins a path whose root was itself rewritten into a path into one flat path.
fn flatten_path(path: Expr) -> Expr {
    let Expr { kind, meta } = path;
    match kind {
        ExprKind::Path(PathExpr { root, steps }) => match root.kind {
            ExprKind::Path(inner) => {
                let mut flat_steps = inner.steps;
                flat_steps.extend(steps);
                Expr::new(
                    ExprKind::Path(PathExpr {
                        root: inner.root,
                        steps: flat_steps,
                    }),
                    meta,
                )
            }
            root_kind => Expr::new(
                ExprKind::Path(PathExpr {
                    root: Box::new(Expr::new(root_kind, root.meta)),
                    steps,
                }),
                meta,
            ),
        },
        kind => Expr::new(kind, meta),
    }
}

impl<'a> Rewriter for StaticTypeRewriter<'a> {
    fn interrupt(&self) -> &Interrupt {
        &self.context.interrupt
    }

    fn rewrite_var_ref(&mut self, var: &VarRef, meta: &MetaContainer) -> RewriteResult<Expr> {
        let resolved = self.resolve(var, meta)?;
        let retag = |qualifier: ScopeQualifier, ty: StaticType| {
            let mut var = var.clone();
            var.qualifier = qualifier;
            Expr::new(ExprKind::Id(var), meta.clone().with(Meta::StaticType(ty)))
        };

        match resolved {
            None => match &self.single_source {
                Some(source) => Ok(self.qualify_with_source(source, var, meta)),
                None => Err(SemanticError::UnboundBinding {
                    name: var.name.clone(),
                    location: meta.source_location(),
                }),
            },
            Some(ResolvedBinding::Global(ty)) => {
                if let Some(source) = &self.single_source
                    && var.qualifier == ScopeQualifier::Unqualified
                {
                    return Ok(self.qualify_with_source(source, var, meta));
                }
                self.check_global_access(var, meta)?;
                tracing::trace!(name = %var.name, depth = self.depth, "resolved global");
                Ok(retag(ScopeQualifier::Unqualified, ty))
            }
            Some(ResolvedBinding::Lexical(ty)) | Some(ResolvedBinding::Local(ty)) => {
                tracing::trace!(name = %var.name, depth = self.depth, "resolved lexical");
                Ok(retag(ScopeQualifier::Lexical, ty))
            }
        }
    }

    fn rewrite_path(&mut self, path: &PathExpr, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_path(self, path, meta).map(flatten_path)
    }

    fn rewrite_select(&mut self, select: &Select, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_select(&mut self.nested(), select, meta)
    }

    fn rewrite_dml(&mut self, dml: &Dml, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_dml(&mut self.nested(), dml, meta)
    }

    /// Re-resolves the recorded aggregate call-sites so they match the calls in
    /// the rewritten projection and HAVING clause.
    fn rewrite_select_meta(
        &mut self,
        _select: &Select,
        meta: &MetaContainer,
    ) -> RewriteResult<MetaContainer> {
        let Some(call_sites) = meta.aggregate_call_sites() else {
            return Ok(meta.clone());
        };
        let call_sites = call_sites
            .iter()
            .map(|call| self.rewrite_expr(call))
            .collect::<RewriteResult<Vec<_>>>()?;
        Ok(meta.clone().with(Meta::AggregateCallSiteList(call_sites)))
    }

    fn rewrite_from_clause(&mut self, from: &FromSource) -> RewriteResult<FromSource> {
        let rewritten = self.rewrite_from_source(from)?;
        self.from_visited = true;
        self.single_source = rewritten
            .as_binding()
            .and_then(|(_, vars)| vars.as_name.as_ref())
            .map(|name| name.name.clone());
        Ok(rewritten)
    }

    fn rewrite_from_source_value(&mut self, expr: &Expr) -> RewriteResult<Expr> {
        self.with_search_order(ScopeSearchOrder::GlobalThenLexical, |resolver| {
            resolver.rewrite_expr(expr)
        })
    }

    fn rewrite_let_variables(&mut self, vars: &LetVariables) -> RewriteResult<LetVariables> {
        for name in vars.names() {
            self.add_local(name)?;
        }
        Ok(vars.clone())
    }

    fn rewrite_let_binding(&mut self, binding: &LetBinding) -> RewriteResult<LetBinding> {
        let expr = self.rewrite_expr(&binding.expr)?;
        self.add_local(&binding.name)?;
        Ok(LetBinding {
            expr,
            name: binding.name.clone(),
        })
    }

    fn rewrite_group_by(&mut self, group_by: &GroupBy) -> RewriteResult<GroupBy> {
        let rewritten = walk_group_by(self, group_by)?;
        for alias in rewritten.items.iter().filter_map(|item| item.alias.as_ref()) {
            self.add_grouping(&alias.name, StaticType::Any);
            if let Some(unique_name) = alias.meta.unique_name() {
                self.add_grouping(unique_name, StaticType::Any);
            }
        }
        if let Some(group_name) = &rewritten.group_name {
            self.add_grouping(&group_name.name, StaticType::any_bag());
        }
        Ok(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::query::{LetClause, Projection, SelectItem};
    use crate::semantic::catalog::MapBindings;
    use crate::semantic::pipeline::ScopingConstraint;

    fn catalog() -> MapBindings {
        MapBindings::new()
            .with_binding("orders", StaticType::any_bag())
            .with_binding("limit_value", StaticType::Int)
    }

    fn resolve_with(expr: &Expr, config: ScopingConfig) -> SemanticResult<Expr> {
        let globals = catalog();
        let context = StaticTypeContext::new(&globals, config, Interrupt::never());
        StaticTypeRewriter::new(&context).rewrite_expr(expr)
    }

    fn resolve(expr: &Expr) -> SemanticResult<Expr> {
        resolve_with(expr, ScopingConfig::default())
    }

    fn first_item(expr: &Expr) -> Expr {
        let Projection::List(items) = &expr.as_select().expect("select").projection else {
            panic!("expected list projection");
        };
        match &items[0] {
            SelectItem::Expr { expr, .. } | SelectItem::ProjectAll(expr) => expr.clone(),
            SelectItem::Star => panic!("unexpected star"),
        }
    }

    #[test]
    fn global_and_local_references_are_classified() {
        let query = build::select(vec![build::item(build::path(build::id("o"), ["id"]))])
            .with_from(build::table_as("orders", "o"))
            .into_expr();

        let resolved = resolve(&query).expect("resolve");
        let select = resolved.as_select().expect("select");
        let (source, _) = select.from.as_ref().and_then(FromSource::as_binding).expect("scan");
        let global = source.as_var_ref().expect("global reference");
        assert_eq!(global.qualifier, ScopeQualifier::Unqualified);
        assert_eq!(source.meta.static_type(), Some(&StaticType::any_bag()));

        let item = first_item(&resolved);
        let root = item.as_path().expect("path").root.as_ref();
        assert_eq!(
            root.as_var_ref().map(|v| v.qualifier),
            Some(ScopeQualifier::Lexical)
        );
        assert_eq!(root.meta.static_type(), Some(&StaticType::Any));
    }

    #[test]
    fn single_source_qualifies_unbound_names() {
        let query = build::select(vec![build::item(build::id("price").at(1, 8, 5))])
            .with_from(build::table_as("orders", "o"))
            .into_expr();

        let item = first_item(&resolve(&query).expect("resolve"));
        let path = item.as_path().expect("qualified path");
        assert_eq!(path.root_var().map(|v| v.name.as_str()), Some("o"));
        assert_eq!(
            path.steps[0].literal_name().map(|s| s.as_str()),
            Some("price")
        );
        assert_eq!(
            item.location(),
            Some(crate::ast::SourceLocation::new(1, 8, 5))
        );
    }

    #[test]
    fn single_source_shadows_globals() {
        let query = build::select(vec![build::item(build::id("limit_value"))])
            .with_from(build::table_as("orders", "o"))
            .into_expr();
        let item = first_item(&resolve(&query).expect("resolve"));
        assert!(item.as_path().is_some());
    }

    #[test]
    fn lexically_qualified_global_is_not_qualified_with_source() {
        let query = build::select(vec![build::item(build::id_lexical("limit_value"))])
            .with_from(build::table_as("orders", "o"))
            .into_expr();
        let item = first_item(&resolve(&query).expect("resolve"));
        let var = item.as_var_ref().expect("reference");
        assert_eq!(var.qualifier, ScopeQualifier::Unqualified);
        assert_eq!(item.meta.static_type(), Some(&StaticType::Int));
    }

    #[test]
    fn qualified_path_is_flattened() {
        let query = build::select(vec![build::item(build::path(build::id("customer"), ["name"]))])
            .with_from(build::table_as("orders", "o"))
            .into_expr();
        let item = first_item(&resolve(&query).expect("resolve"));
        let path = item.as_path().expect("path");
        assert_eq!(path.root_var().map(|v| v.name.as_str()), Some("o"));
        let steps: Vec<_> = path
            .steps
            .iter()
            .filter_map(|step| step.literal_name().map(|s| s.to_string()))
            .collect();
        assert_eq!(steps, vec!["customer", "name"]);
    }

    #[test]
    fn unbound_name_without_single_source_fails() {
        let query = build::select(vec![build::item(build::id("nope").at(1, 8, 4))])
            .with_from(build::join(
                build::table_as("orders", "a"),
                build::table_as("orders", "b"),
            ))
            .into_expr();
        let error = resolve(&query).expect_err("expected unbound");
        assert_eq!(error.binding_name(), Some("nope"));
        assert_eq!(
            error.location(),
            Some(crate::ast::SourceLocation::new(1, 8, 4))
        );
        assert!(matches!(error, SemanticError::UnboundBinding { .. }));
    }

    #[test]
    fn duplicate_local_names_are_ambiguous_regardless_of_case() {
        let query = build::select_star()
            .with_from(build::join(
                build::table_as("orders", "x"),
                build::table_as("orders", "X"),
            ))
            .into_expr();
        let error = resolve(&query).expect_err("expected ambiguity");
        assert!(matches!(error, SemanticError::AmbiguousBinding { ref name, .. } if name == "X"));
    }

    #[test]
    fn let_binding_is_visible_after_its_clause() {
        let query = build::select(vec![build::item(build::id("total"))])
            .with_from(build::join(
                build::table_as("orders", "a"),
                build::table_as("orders", "b"),
            ))
            .with_let(LetClause {
                bindings: vec![LetBinding {
                    expr: build::path(build::id("a"), ["amount"]),
                    name: SymbolicName::new("total"),
                }],
            })
            .into_expr();
        let item = first_item(&resolve(&query).expect("resolve"));
        assert_eq!(
            item.as_var_ref().map(|v| v.qualifier),
            Some(ScopeQualifier::Lexical)
        );
    }

    #[test]
    fn outer_locals_are_lexical_in_nested_queries() {
        let inner = build::select_value(build::path(build::id("o"), ["id"]))
            .with_from(build::table_as("orders", "i"))
            .into_expr();
        let query = build::select(vec![build::item(inner)])
            .with_from(build::table_as("orders", "o"))
            .into_expr();

        let resolved = resolve(&query).expect("resolve");
        let nested = first_item(&resolved);
        let Projection::Value(value) = &nested.as_select().expect("nested").projection else {
            panic!("expected SELECT VALUE");
        };
        let root = value.as_path().expect("path").root.as_ref();
        assert_eq!(root.as_var_ref().map(|v| v.name.as_str()), Some("o"));
        assert_eq!(
            root.as_var_ref().map(|v| v.qualifier),
            Some(ScopeQualifier::Lexical)
        );
    }

    #[test]
    fn globals_outside_from_can_be_prevented() {
        let query = build::select(vec![build::item(build::id("limit_value"))])
            .with_from(build::join(
                build::table_as("orders", "a"),
                build::table_as("orders", "b"),
            ))
            .into_expr();
        let config = ScopingConfig::default()
            .with_constraint(ScopingConstraint::PreventGlobalsExceptInFrom);

        let error = resolve_with(&query, config).expect_err("expected illegal access");
        assert!(matches!(error, SemanticError::IllegalGlobalAccess { .. }));

        let only_from = build::select_star()
            .with_from(build::table_as("orders", "a"))
            .into_expr();
        assert!(resolve_with(&only_from, config).is_ok());
    }

    #[test]
    fn globals_in_nested_queries_can_be_prevented() {
        let inner = build::select_star()
            .with_from(build::table_as("orders", "i"))
            .into_expr();
        let query = build::select(vec![build::item(inner)])
            .with_from(build::table_as("orders", "o"))
            .into_expr();
        let config = ScopingConfig::default()
            .with_constraint(ScopingConstraint::PreventGlobalsInNestedQueries);

        let error = resolve_with(&query, config).expect_err("expected illegal access");
        assert_eq!(error.binding_name(), Some("orders"));
    }

    #[test]
    fn grouping_names_resolve_after_group_by() {
        let mut group_by = build::group_by(vec![crate::ast::query::GroupByItem {
            expr: build::path(build::id("o"), ["region"]),
            alias: Some(
                SymbolicName::new("region")
                    .with_meta(Meta::UniqueName("$__group_by_1_item_0".into())),
            ),
        }]);
        group_by.group_name = Some(SymbolicName::new("g"));

        let query = build::select(vec![
            build::item(build::id_sensitive("$__group_by_1_item_0")),
            build::item(build::id_sensitive("g")),
        ])
        .with_from(build::join(
            build::table_as("orders", "o"),
            build::table_as("orders", "p"),
        ))
        .with_group_by(group_by)
        .into_expr();

        let resolved = resolve(&query).expect("resolve");
        let Projection::List(items) = &resolved.as_select().expect("select").projection else {
            panic!("expected list projection");
        };
        let SelectItem::Expr { expr: group, .. } = &items[1] else {
            panic!("expected expression item");
        };
        assert_eq!(group.meta.static_type(), Some(&StaticType::any_bag()));
    }

    #[test]
    fn function_names_bypass_resolution() {
        let query = build::select(vec![build::item(build::call(
            "upper",
            vec![build::path(build::id("o"), ["name"])],
        ))])
        .with_from(build::join(
            build::table_as("orders", "o"),
            build::table_as("orders", "p"),
        ))
        .into_expr();
        assert!(resolve(&query).is_ok());
    }
}
