//! Rewrite Pipeline Benchmarks
//!
//! Measures the semantic rewrite stage on synthetic trees. Benchmarks are
//! organized into the following categories:
//!
//! - **Simple Queries**: Single-source projections and SELECT *
//! - **Grouping**: GROUP BY with aggregates and key substitution
//! - **Stress Tests**: Wide projections and deeply nested sub-queries
//! - **Scope Resolution**: Full pipeline plus static typing against a catalog
//!
//! ## Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench grouping
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sqlpp_rewrite::ast::{Expr, build};
use sqlpp_rewrite::semantic::{MapBindings, RewritePipeline, SemanticAnalyzer, StaticType};

// ============================================================================
// Query Builders
// ============================================================================

fn simple_projection() -> Expr {
    build::select(vec![
        build::item(build::id("a")),
        build::item(build::path(build::id("t"), ["b"])),
        build::item(build::add(build::id("c"), build::int(1))),
    ])
    .with_from(build::table("t"))
    .with_where(build::gt(build::id("a"), build::int(10)))
    .into_expr()
}

fn star_over_join() -> Expr {
    build::select_star()
        .with_from(build::join(
            build::table("orders"),
            build::join(build::table("customers"), build::table("items")),
        ))
        .into_expr()
}

fn grouped_aggregates() -> Expr {
    build::select(vec![
        build::item(build::path(build::id("o"), ["region"])),
        build::item(build::call_agg("sum", build::path(build::id("o"), ["total"]))),
        build::item(build::call_agg("count", build::id("o"))),
    ])
    .with_from(build::table_as("orders", "o"))
    .with_group_by(build::group_by(vec![build::group_item(build::path(
        build::id("o"),
        ["region"],
    ))]))
    .with_having(build::gt(
        build::call_agg("sum", build::path(build::id("o"), ["total"])),
        build::int(1000),
    ))
    .into_expr()
}

fn wide_projection(width: usize) -> Expr {
    let items = (0..width)
        .map(|i| build::item(build::path(build::id("t"), [format!("c{i}")])))
        .collect();
    build::select(items).with_from(build::table("t")).into_expr()
}

fn nested_queries(depth: usize) -> Expr {
    (0..depth).fold(build::id("x"), |inner, level| {
        build::select_value(inner)
            .with_from(build::table(format!("t{level}")))
            .into_expr()
    })
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_simple_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("simple_queries");
    let pipeline = RewritePipeline::new();

    let queries = vec![
        ("projection", simple_projection()),
        ("star_over_join", star_over_join()),
    ];

    for (name, query) in queries {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(name), &query, |b, q| {
            b.iter(|| pipeline.run(black_box(q)));
        });
    }

    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");
    let pipeline = RewritePipeline::new();
    let query = grouped_aggregates();

    group.bench_function("aggregates_and_substitution", |b| {
        b.iter(|| pipeline.run(black_box(&query)));
    });

    group.finish();
}

fn bench_stress(c: &mut Criterion) {
    let mut group = c.benchmark_group("stress_tests");
    let pipeline = RewritePipeline::new();

    for width in [10, 100, 1000] {
        let query = wide_projection(width);
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("wide_projection", width), &query, |b, q| {
            b.iter(|| pipeline.run(black_box(q)));
        });
    }

    for depth in [5, 25, 50] {
        let query = nested_queries(depth);
        group.bench_with_input(BenchmarkId::new("nested_queries", depth), &query, |b, q| {
            b.iter(|| pipeline.run(black_box(q)));
        });
    }

    group.finish();
}

fn bench_scope_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("scope_resolution");
    let catalog = ["t", "orders", "customers", "items"]
        .into_iter()
        .fold(MapBindings::new(), |catalog, name| {
            catalog.with_binding(name, StaticType::any_bag())
        });
    let analyzer = SemanticAnalyzer::new().with_catalog(&catalog);

    let queries = vec![
        ("projection", simple_projection()),
        ("grouped_aggregates", grouped_aggregates()),
        ("wide_projection_100", wide_projection(100)),
    ];

    for (name, query) in queries {
        group.bench_with_input(BenchmarkId::from_parameter(name), &query, |b, q| {
            b.iter(|| analyzer.analyze(black_box(q)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_simple_queries,
    bench_grouping,
    bench_stress,
    bench_scope_resolution
);
criterion_main!(benches);
