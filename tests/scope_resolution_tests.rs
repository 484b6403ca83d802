// Integration tests for scope resolution and static typing

mod common;

use common::{analyze_with, catalog_of, item_expr, projection_items, select_of};
use sqlpp_rewrite::ast::query::LetBinding;
use sqlpp_rewrite::ast::{
    CaseSensitivity, Dml, DmlOp, Expr, ExprKind, FromSource, LetClause, LetVariables,
    Projection, ScopeQualifier, SourceLocation, SymbolicName, build,
};
use sqlpp_rewrite::diag::{SourceFile, convert_diag_to_report};
use sqlpp_rewrite::semantic::{
    ErrorCode, MapBindings, ScopingConfig, ScopingConstraint, SemanticError, StaticType,
};

fn value_of(expr: &Expr) -> &Expr {
    match &select_of(expr).projection {
        Projection::Value(value) => value,
        other => panic!("expected SELECT VALUE, found {other:?}"),
    }
}

fn qualifier_of(expr: &Expr) -> ScopeQualifier {
    expr.as_var_ref()
        .unwrap_or_else(|| panic!("expected variable reference, found {expr:?}"))
        .qualifier
}

// ==================== Resolution ====================

#[test]
fn test_unqualified_name_is_qualified_with_single_source() {
    let query = build::select(vec![build::item(build::id("x"))])
        .with_from(build::table("t"))
        .into_expr();

    let resolved = analyze_with(&query, &catalog_of(&["t"]), ScopingConfig::default())
        .expect("analysis should succeed");
    let projected = item_expr(&projection_items(&resolved)[0]);
    assert_eq!(
        *projected,
        build::path(
            build::var("t", CaseSensitivity::Sensitive, ScopeQualifier::Lexical),
            ["x"],
        )
    );
    let root = &projected.as_path().expect("path").root;
    assert_eq!(root.meta.static_type(), Some(&StaticType::Any));
}

#[test]
fn test_global_reference_is_unqualified_and_typed() {
    let query = build::select_value(build::id("t"))
        .with_from(build::join(build::table_as("t", "a"), build::table_as("u", "b")))
        .into_expr();

    let resolved = analyze_with(&query, &catalog_of(&["t", "u"]), ScopingConfig::default())
        .expect("analysis should succeed");
    let value = value_of(&resolved);
    assert_eq!(qualifier_of(value), ScopeQualifier::Unqualified);
    assert_eq!(value.meta.static_type(), Some(&StaticType::any_bag()));
}

#[test]
fn test_local_reference_is_tagged_lexical() {
    let query = build::select_value(build::id("a"))
        .with_from(build::table_as("t", "a"))
        .into_expr();

    let resolved = analyze_with(&query, &catalog_of(&["t"]), ScopingConfig::default())
        .expect("analysis should succeed");
    let value = value_of(&resolved);
    assert_eq!(qualifier_of(value), ScopeQualifier::Lexical);
    assert_eq!(value.meta.static_type(), Some(&StaticType::Any));
}

#[test]
fn test_correlated_reference_resolves_to_enclosing_query() {
    let inner = build::select_value(build::id("a"))
        .with_from(build::join(build::table_as("u", "b"), build::table_as("v", "c")))
        .into_expr();
    let query = build::select_value(inner)
        .with_from(build::table_as("t", "a"))
        .into_expr();

    let resolved = analyze_with(
        &query,
        &catalog_of(&["t", "u", "v"]),
        ScopingConfig::default(),
    )
    .expect("analysis should succeed");
    let inner_value = value_of(value_of(&resolved));
    assert_eq!(qualifier_of(inner_value), ScopeQualifier::Lexical);
}

#[test]
fn test_from_source_expression_prefers_globals() {
    // SELECT x AS v FROM t AS x, x AS y
    let query = build::select(vec![build::item_as(build::id("x"), "v")])
        .with_from(build::join(build::table_as("t", "x"), build::table_as("x", "y")))
        .into_expr();
    let catalog = MapBindings::new()
        .with_binding("t", StaticType::any_bag())
        .with_binding("x", StaticType::Int);

    let resolved = analyze_with(&query, &catalog, ScopingConfig::default())
        .expect("analysis should succeed");
    let select = select_of(&resolved);

    let FromSource::Join(join) = select.from.as_ref().expect("FROM clause") else {
        panic!("expected join");
    };
    let (source, _) = join.right.as_binding().expect("scan");
    assert_eq!(qualifier_of(source), ScopeQualifier::Unqualified);
    assert_eq!(source.meta.static_type(), Some(&StaticType::Int));

    let projected = item_expr(&projection_items(&resolved)[0]);
    assert_eq!(qualifier_of(projected), ScopeQualifier::Lexical);
    assert_eq!(projected.meta.static_type(), Some(&StaticType::Any));
}

#[test]
fn test_let_binding_is_visible_to_projection() {
    let query = build::select_value(build::id("y"))
        .with_from(build::table_as("t", "a"))
        .with_let(LetClause {
            bindings: vec![LetBinding {
                expr: build::path(build::id("a"), ["x"]),
                name: SymbolicName::new("y"),
            }],
        })
        .into_expr();

    let resolved = analyze_with(&query, &catalog_of(&["t"]), ScopingConfig::default())
        .expect("analysis should succeed");
    assert_eq!(qualifier_of(value_of(&resolved)), ScopeQualifier::Lexical);
}

#[test]
fn test_group_keys_resolve_after_grouping() {
    let query = build::select(vec![
        build::item(build::path(build::id("a"), ["b"])),
        build::item(build::id("foo")),
    ])
    .with_from(build::table_as("t", "a"))
    .with_group_by(build::group_by(vec![
        build::group_item(build::path(build::id("a"), ["b"])),
        build::group_item_as(build::path(build::id("a"), ["c"]), "foo"),
    ]))
    .into_expr();

    let resolved = analyze_with(&query, &catalog_of(&["t"]), ScopingConfig::default())
        .expect("analysis should succeed");
    let items = projection_items(&resolved);

    let key = item_expr(&items[0]);
    assert_eq!(
        *key,
        build::var(
            "$__group_by_1_item_0",
            CaseSensitivity::Sensitive,
            ScopeQualifier::Lexical,
        )
    );
    assert!(key.meta.static_type().is_some());

    let alias = item_expr(&items[1]);
    assert_eq!(qualifier_of(alias), ScopeQualifier::Lexical);
    assert_eq!(alias.meta.static_type(), Some(&StaticType::Any));
}

#[test]
fn test_group_name_is_a_bag() {
    let mut group_by = build::group_by(vec![build::group_item(build::path(
        build::id("a"),
        ["k"],
    ))]);
    group_by.group_name = Some(SymbolicName::new("g"));
    let query = build::select_value(build::id("g"))
        .with_from(build::table_as("t", "a"))
        .with_group_by(group_by)
        .into_expr();

    let resolved = analyze_with(&query, &catalog_of(&["t"]), ScopingConfig::default())
        .expect("analysis should succeed");
    assert_eq!(
        value_of(&resolved).meta.static_type(),
        Some(&StaticType::any_bag())
    );
}

#[test]
fn test_aggregate_call_sites_are_resolved_too() {
    let query = build::select(vec![build::item(build::call_agg("sum", build::id("x")))])
        .with_from(build::table("t"))
        .into_expr();

    let resolved = analyze_with(&query, &catalog_of(&["t"]), ScopingConfig::default())
        .expect("analysis should succeed");
    let call_sites = resolved.meta.aggregate_call_sites().expect("call-site list");
    assert_eq!(call_sites.len(), 1);
    assert_eq!(call_sites[0], *item_expr(&projection_items(&resolved)[0]));
}

#[test]
fn test_dml_where_clause_is_resolved_against_its_source() {
    let statement = Dml::new(vec![DmlOp::Delete])
        .with_from(build::table("orders"))
        .with_where(build::gt(build::id("total"), build::int(100)))
        .into_expr();

    let resolved = analyze_with(
        &statement,
        &catalog_of(&["orders"]),
        ScopingConfig::default(),
    )
    .expect("analysis should succeed");
    let ExprKind::Dml(dml) = &resolved.kind else {
        panic!("expected DML statement");
    };
    let ExprKind::Nary(_, args) = &dml.where_clause.as_deref().expect("WHERE").kind else {
        panic!("expected comparison");
    };
    assert_eq!(
        args[0],
        build::path(
            build::var(
                "orders",
                CaseSensitivity::Sensitive,
                ScopeQualifier::Lexical,
            ),
            ["total"],
        )
    );
}

// ==================== Errors ====================

#[test]
fn test_unbound_reference_fails() {
    let query = build::select(vec![build::item(build::id("x").at(1, 8, 1))]).into_expr();

    let error = analyze_with(&query, &MapBindings::new(), ScopingConfig::default())
        .expect_err("unbound name must not resolve");
    assert_eq!(error.code(), ErrorCode::UnboundBinding);
    assert_eq!(error.binding_name(), Some("x"));
    assert_eq!(error.location(), Some(SourceLocation::new(1, 8, 1)));
}

#[test]
fn test_sources_differing_only_in_case_are_ambiguous() {
    let query = build::select(vec![build::item(build::int(1))])
        .with_from(build::join(
            build::table_as("t", "a"),
            build::scan(build::id("u"), LetVariables::named("A")),
        ))
        .into_expr();

    let error = analyze_with(&query, &catalog_of(&["t", "u"]), ScopingConfig::default())
        .expect_err("duplicate alias must fail");
    assert_eq!(error.code(), ErrorCode::AmbiguousBinding);
    assert_eq!(error.binding_name(), Some("A"));
}

#[test]
fn test_let_name_colliding_with_source_is_ambiguous() {
    let query = build::select_value(build::int(1))
        .with_from(build::table_as("t", "a"))
        .with_let(LetClause {
            bindings: vec![LetBinding {
                expr: build::int(1),
                name: SymbolicName::new("A"),
            }],
        })
        .into_expr();

    let error = analyze_with(&query, &catalog_of(&["t"]), ScopingConfig::default())
        .expect_err("LET name shadowing a source must fail");
    assert_eq!(error.code(), ErrorCode::AmbiguousBinding);
}

#[test]
fn test_ambiguous_global_lookup_fails() {
    let catalog = MapBindings::new()
        .with_binding("Orders", StaticType::any_bag())
        .with_binding("ORDERS", StaticType::any_bag());
    let query = build::select_value(build::int(1))
        .with_from(build::table("orders"))
        .into_expr();

    let error = analyze_with(&query, &catalog, ScopingConfig::default())
        .expect_err("case-insensitive lookup matching two globals must fail");
    assert_eq!(error.code(), ErrorCode::AmbiguousBinding);
}

#[test]
fn test_globals_outside_from_are_rejected_when_constrained() {
    let query = build::select_value(build::id("g"))
        .with_from(build::join(build::table_as("t", "a"), build::table_as("u", "b")))
        .into_expr();
    let catalog = catalog_of(&["t", "u", "g"]);

    assert!(analyze_with(&query, &catalog, ScopingConfig::default()).is_ok());

    let constrained =
        ScopingConfig::default().with_constraint(ScopingConstraint::PreventGlobalsExceptInFrom);
    let error = analyze_with(&query, &catalog, constrained).expect_err("global in projection");
    assert_eq!(error.code(), ErrorCode::IllegalGlobalVariableAccess);
    assert_eq!(error.binding_name(), Some("g"));
}

#[test]
fn test_globals_in_nested_queries_are_rejected_when_constrained() {
    let inner = build::select_value(build::int(1))
        .with_from(build::table_as("u", "b"))
        .into_expr();
    let query = build::select_value(inner)
        .with_from(build::table_as("t", "a"))
        .into_expr();
    let catalog = catalog_of(&["t", "u"]);
    let constrained =
        ScopingConfig::default().with_constraint(ScopingConstraint::PreventGlobalsInNestedQueries);

    let error = analyze_with(&query, &catalog, constrained).expect_err("global in nested FROM");
    assert_eq!(
        error,
        SemanticError::IllegalGlobalAccess {
            name: "u".into(),
            location: None,
        }
    );

    let flat = build::select_value(build::id("a"))
        .with_from(build::table_as("t", "a"))
        .into_expr();
    assert!(analyze_with(&flat, &catalog, constrained).is_ok());
}

// ==================== Diagnostics ====================

#[test]
fn test_errors_render_as_diagnostics() {
    let source = "SELECT x";
    let query = build::select(vec![build::item(build::id("x").at(1, 8, 1))])
        .into_expr()
        .at(1, 1, 8);

    let error = analyze_with(&query, &MapBindings::new(), ScopingConfig::default())
        .expect_err("unbound name must not resolve");
    let diag = error.to_diag();
    assert_eq!(diag.code.as_deref(), Some("semantic::unbound_binding"));
    assert_eq!(diag.primary_location(), Some(SourceLocation::new(1, 8, 1)));

    let report = convert_diag_to_report(&diag, &SourceFile::new(source));
    assert_eq!(report.to_string(), "no such variable named 'x'");
}
