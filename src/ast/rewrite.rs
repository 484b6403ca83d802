//! Tree rewriting infrastructure.
//!
//! A [`Rewriter`] turns a tree into a new tree. Every method has a default that
//! clones its node with children rewritten through the rewriter itself and the
//! node's metadata passed through unchanged, so a pass overrides only the methods
//! for the node shapes it cares about. The defaults delegate to the `walk_*`
//! functions in this module, which overriding methods can call to get the
//! default behaviour for their own node.
//!
//! Clause order is fixed. SELECT: FROM, LET, WHERE, GROUP BY, HAVING, projection,
//! ORDER BY, LIMIT. DML: FROM, WHERE, operations, RETURNING.
//!
//! Walking an expression, a projection item, a FROM source or a DML operation
//! polls [`Rewriter::interrupt`] first.

use crate::ast::dml::{
    Assignment, Ddl, Dml, DmlOp, Exec, OnConflict, Returning, ReturningColumn, ReturningElem,
};
use crate::ast::expression::{
    Call, CallAgg, DataType, Expr, ExprKind, Literal, NaryOp, PathExpr, PathStep, SearchedCase,
    SeqKind, SimpleCase, StructField, TypedOp, VarRef, WhenClause,
};
use crate::ast::meta::MetaContainer;
use crate::ast::query::{
    FromSource, GroupBy, GroupByItem, Join, LetBinding, LetClause, LetVariables, OrderBy,
    Projection, Select, SelectItem, SortSpec, SymbolicName,
};
use crate::interrupt::Interrupt;
use crate::semantic::error::SemanticResult;

/// Result of a rewrite. The first error aborts the whole statement.
pub type RewriteResult<T> = SemanticResult<T>;

/// Tree-to-tree transformation with one overridable method per node kind.
///
/// Every default method delegates to the matching `walk_*` function, which
/// rewrites the node's children and rebuilds it with its metadata intact. A pass
/// overrides only the nodes it cares about.
pub trait Rewriter {
    /// Cancellation handle polled during traversal.
    fn interrupt(&self) -> &Interrupt;

    /// Entry point: rewrites any node.
    fn rewrite_expr(&mut self, expr: &Expr) -> RewriteResult<Expr> {
        walk_expr(self, expr)
    }

    fn rewrite_lit(&mut self, lit: &Literal, meta: &MetaContainer) -> RewriteResult<Expr> {
        Ok(Expr::new(ExprKind::Lit(lit.clone()), meta.clone()))
    }

    fn rewrite_missing(&mut self, meta: &MetaContainer) -> RewriteResult<Expr> {
        Ok(Expr::new(ExprKind::Missing, meta.clone()))
    }

    fn rewrite_var_ref(&mut self, var: &VarRef, meta: &MetaContainer) -> RewriteResult<Expr> {
        Ok(Expr::new(ExprKind::Id(var.clone()), meta.clone()))
    }

    fn rewrite_param(&mut self, position: usize, meta: &MetaContainer) -> RewriteResult<Expr> {
        Ok(Expr::new(ExprKind::Param(position), meta.clone()))
    }

    fn rewrite_nary(
        &mut self,
        op: NaryOp,
        args: &[Expr],
        meta: &MetaContainer,
    ) -> RewriteResult<Expr> {
        walk_nary(self, op, args, meta)
    }

    fn rewrite_call(&mut self, call: &Call, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_call(self, call, meta)
    }

    fn rewrite_call_agg(&mut self, agg: &CallAgg, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_call_agg(self, agg, meta)
    }

    fn rewrite_typed(
        &mut self,
        op: TypedOp,
        expr: &Expr,
        ty: DataType,
        meta: &MetaContainer,
    ) -> RewriteResult<Expr> {
        let expr = self.rewrite_expr(expr)?;
        Ok(Expr::new(
            ExprKind::Typed(op, Box::new(expr), ty),
            meta.clone(),
        ))
    }

    fn rewrite_path(&mut self, path: &PathExpr, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_path(self, path, meta)
    }

    fn rewrite_path_step(&mut self, step: &PathStep) -> RewriteResult<PathStep> {
        walk_path_step(self, step)
    }

    fn rewrite_simple_case(
        &mut self,
        case: &SimpleCase,
        meta: &MetaContainer,
    ) -> RewriteResult<Expr> {
        walk_simple_case(self, case, meta)
    }

    fn rewrite_searched_case(
        &mut self,
        case: &SearchedCase,
        meta: &MetaContainer,
    ) -> RewriteResult<Expr> {
        walk_searched_case(self, case, meta)
    }

    fn rewrite_struct(
        &mut self,
        fields: &[StructField],
        meta: &MetaContainer,
    ) -> RewriteResult<Expr> {
        walk_struct(self, fields, meta)
    }

    fn rewrite_seq(
        &mut self,
        kind: SeqKind,
        values: &[Expr],
        meta: &MetaContainer,
    ) -> RewriteResult<Expr> {
        let values = rewrite_all(self, values)?;
        Ok(Expr::new(ExprKind::Seq(kind, values), meta.clone()))
    }

    /// Rewrites a whole SELECT node: its clauses, then its metadata.
    fn rewrite_select(&mut self, select: &Select, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_select(self, select, meta)
    }

    /// Rewrites the clauses of a SELECT in clause order.
    fn rewrite_select_clauses(&mut self, select: &Select) -> RewriteResult<Select> {
        walk_select_clauses(self, select)
    }

    /// Produces the metadata of a rewritten SELECT. Called after its clauses.
    fn rewrite_select_meta(
        &mut self,
        _select: &Select,
        meta: &MetaContainer,
    ) -> RewriteResult<MetaContainer> {
        Ok(meta.clone())
    }

    /// Rewrites the FROM clause of a SELECT or DML statement as a whole.
    fn rewrite_from_clause(&mut self, from: &FromSource) -> RewriteResult<FromSource> {
        self.rewrite_from_source(from)
    }

    fn rewrite_from_source(&mut self, source: &FromSource) -> RewriteResult<FromSource> {
        walk_from_source(self, source)
    }

    /// Rewrites the value expression a scan or unpivot ranges over.
    fn rewrite_from_source_value(&mut self, expr: &Expr) -> RewriteResult<Expr> {
        self.rewrite_expr(expr)
    }

    fn rewrite_let_variables(&mut self, vars: &LetVariables) -> RewriteResult<LetVariables> {
        walk_let_variables(self, vars)
    }

    fn rewrite_symbolic_name(&mut self, name: &SymbolicName) -> RewriteResult<SymbolicName> {
        Ok(name.clone())
    }

    fn rewrite_let_clause(&mut self, clause: &LetClause) -> RewriteResult<LetClause> {
        let bindings = clause
            .bindings
            .iter()
            .map(|binding| self.rewrite_let_binding(binding))
            .collect::<RewriteResult<_>>()?;
        Ok(LetClause { bindings })
    }

    fn rewrite_let_binding(&mut self, binding: &LetBinding) -> RewriteResult<LetBinding> {
        walk_let_binding(self, binding)
    }

    fn rewrite_select_where(&mut self, condition: &Expr) -> RewriteResult<Expr> {
        self.rewrite_expr(condition)
    }

    fn rewrite_group_by(&mut self, group_by: &GroupBy) -> RewriteResult<GroupBy> {
        walk_group_by(self, group_by)
    }

    fn rewrite_group_by_item(&mut self, item: &GroupByItem) -> RewriteResult<GroupByItem> {
        walk_group_by_item(self, item)
    }

    fn rewrite_select_having(&mut self, condition: &Expr) -> RewriteResult<Expr> {
        self.rewrite_expr(condition)
    }

    fn rewrite_projection(&mut self, projection: &Projection) -> RewriteResult<Projection> {
        walk_projection(self, projection)
    }

    fn rewrite_select_item(&mut self, item: &SelectItem) -> RewriteResult<SelectItem> {
        walk_select_item(self, item)
    }

    fn rewrite_order_by(&mut self, order_by: &OrderBy) -> RewriteResult<OrderBy> {
        let specs = order_by
            .specs
            .iter()
            .map(|spec| self.rewrite_sort_spec(spec))
            .collect::<RewriteResult<_>>()?;
        Ok(OrderBy { specs })
    }

    fn rewrite_sort_spec(&mut self, spec: &SortSpec) -> RewriteResult<SortSpec> {
        Ok(SortSpec {
            expr: self.rewrite_expr(&spec.expr)?,
            ordering: spec.ordering,
        })
    }

    fn rewrite_select_limit(&mut self, limit: &Expr) -> RewriteResult<Expr> {
        self.rewrite_expr(limit)
    }

    /// Rewrites a whole DML node.
    fn rewrite_dml(&mut self, dml: &Dml, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_dml(self, dml, meta)
    }

    /// Rewrites the clauses of a DML statement in clause order.
    fn rewrite_dml_clauses(&mut self, dml: &Dml) -> RewriteResult<Dml> {
        walk_dml_clauses(self, dml)
    }

    fn rewrite_dml_where(&mut self, condition: &Expr) -> RewriteResult<Expr> {
        self.rewrite_expr(condition)
    }

    fn rewrite_dml_op(&mut self, op: &DmlOp) -> RewriteResult<DmlOp> {
        walk_dml_op(self, op)
    }

    fn rewrite_returning(&mut self, returning: &Returning) -> RewriteResult<Returning> {
        walk_returning(self, returning)
    }

    fn rewrite_ddl(&mut self, ddl: &Ddl, meta: &MetaContainer) -> RewriteResult<Expr> {
        walk_ddl(self, ddl, meta)
    }

    fn rewrite_exec(&mut self, exec: &Exec, meta: &MetaContainer) -> RewriteResult<Expr> {
        let args = rewrite_all(self, &exec.args)?;
        Ok(Expr::new(
            ExprKind::Exec(Exec {
                procedure: exec.procedure.clone(),
                args,
            }),
            meta.clone(),
        ))
    }
}

/// Rewrites each expression of a slice in order.
pub fn rewrite_all<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    exprs: &[Expr],
) -> RewriteResult<Vec<Expr>> {
    exprs.iter().map(|expr| rewriter.rewrite_expr(expr)).collect()
}

/// Dispatches on the node kind.
pub fn walk_expr<R: Rewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> RewriteResult<Expr> {
    rewriter.interrupt().check()?;
    let meta = &expr.meta;
    match &expr.kind {
        ExprKind::Lit(lit) => rewriter.rewrite_lit(lit, meta),
        ExprKind::Missing => rewriter.rewrite_missing(meta),
        ExprKind::Id(var) => rewriter.rewrite_var_ref(var, meta),
        ExprKind::Param(position) => rewriter.rewrite_param(*position, meta),
        ExprKind::Nary(op, args) => rewriter.rewrite_nary(*op, args, meta),
        ExprKind::Call(call) => rewriter.rewrite_call(call, meta),
        ExprKind::CallAgg(agg) => rewriter.rewrite_call_agg(agg, meta),
        ExprKind::Typed(op, inner, ty) => rewriter.rewrite_typed(*op, inner, *ty, meta),
        ExprKind::Path(path) => rewriter.rewrite_path(path, meta),
        ExprKind::SimpleCase(case) => rewriter.rewrite_simple_case(case, meta),
        ExprKind::SearchedCase(case) => rewriter.rewrite_searched_case(case, meta),
        ExprKind::Struct(fields) => rewriter.rewrite_struct(fields, meta),
        ExprKind::Seq(kind, values) => rewriter.rewrite_seq(*kind, values, meta),
        ExprKind::Select(select) => rewriter.rewrite_select(select, meta),
        ExprKind::Dml(dml) => rewriter.rewrite_dml(dml, meta),
        ExprKind::Ddl(ddl) => rewriter.rewrite_ddl(ddl, meta),
        ExprKind::Exec(exec) => rewriter.rewrite_exec(exec, meta),
    }
}

/// Rewrites the operands of an operator.
pub fn walk_nary<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    op: NaryOp,
    args: &[Expr],
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let args = rewrite_all(rewriter, args)?;
    Ok(Expr::new(ExprKind::Nary(op, args), meta.clone()))
}

/// Rewrites the arguments of a call. The function name is left untouched.
pub fn walk_call<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    call: &Call,
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let args = rewrite_all(rewriter, &call.args)?;
    Ok(Expr::new(
        ExprKind::Call(Call {
            name: call.name.clone(),
            args,
        }),
        meta.clone(),
    ))
}

/// Rewrites the argument of an aggregate call. The function name is left untouched.
pub fn walk_call_agg<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    agg: &CallAgg,
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let arg = rewriter.rewrite_expr(&agg.arg)?;
    Ok(Expr::new(
        ExprKind::CallAgg(CallAgg {
            name: agg.name.clone(),
            quantifier: agg.quantifier,
            arg: Box::new(arg),
        }),
        meta.clone(),
    ))
}

/// Rewrites a path's root, then its steps.
pub fn walk_path<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    path: &PathExpr,
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let root = rewriter.rewrite_expr(&path.root)?;
    let steps = path
        .steps
        .iter()
        .map(|step| rewriter.rewrite_path_step(step))
        .collect::<RewriteResult<_>>()?;
    Ok(Expr::new(
        ExprKind::Path(PathExpr {
            root: Box::new(root),
            steps,
        }),
        meta.clone(),
    ))
}

/// Rewrites the index expression of a step.
pub fn walk_path_step<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    step: &PathStep,
) -> RewriteResult<PathStep> {
    match step {
        PathStep::Index { expr, case } => Ok(PathStep::Index {
            expr: rewriter.rewrite_expr(expr)?,
            case: *case,
        }),
        PathStep::Wildcard => Ok(PathStep::Wildcard),
        PathStep::Unpivot => Ok(PathStep::Unpivot),
    }
}

fn rewrite_whens<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    whens: &[WhenClause],
) -> RewriteResult<Vec<WhenClause>> {
    whens
        .iter()
        .map(|arm| {
            Ok(WhenClause {
                when: rewriter.rewrite_expr(&arm.when)?,
                then: rewriter.rewrite_expr(&arm.then)?,
            })
        })
        .collect()
}

fn rewrite_boxed<R, F>(
    rewriter: &mut R,
    expr: Option<&Expr>,
    mut rewrite: F,
) -> RewriteResult<Option<Box<Expr>>>
where
    R: Rewriter + ?Sized,
    F: FnMut(&mut R, &Expr) -> RewriteResult<Expr>,
{
    expr.map(|expr| rewrite(rewriter, expr).map(Box::new))
        .transpose()
}

/// Rewrites the operand, each WHEN/THEN pair and the default.
pub fn walk_simple_case<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    case: &SimpleCase,
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let operand = rewriter.rewrite_expr(&case.operand)?;
    let whens = rewrite_whens(rewriter, &case.whens)?;
    let default = rewrite_boxed(rewriter, case.default.as_deref(), |r, e| r.rewrite_expr(e))?;
    Ok(Expr::new(
        ExprKind::SimpleCase(SimpleCase {
            operand: Box::new(operand),
            whens,
            default,
        }),
        meta.clone(),
    ))
}

/// Rewrites each WHEN/THEN pair and the default.
pub fn walk_searched_case<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    case: &SearchedCase,
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let whens = rewrite_whens(rewriter, &case.whens)?;
    let default = rewrite_boxed(rewriter, case.default.as_deref(), |r, e| r.rewrite_expr(e))?;
    Ok(Expr::new(
        ExprKind::SearchedCase(SearchedCase { whens, default }),
        meta.clone(),
    ))
}

/// Rewrites field names and values.
pub fn walk_struct<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    fields: &[StructField],
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let fields = fields
        .iter()
        .map(|field| {
            Ok(StructField {
                name: rewriter.rewrite_expr(&field.name)?,
                value: rewriter.rewrite_expr(&field.value)?,
            })
        })
        .collect::<RewriteResult<_>>()?;
    Ok(Expr::new(ExprKind::Struct(fields), meta.clone()))
}

/// Rewrites a SELECT's clauses, then asks the rewriter for its metadata.
pub fn walk_select<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    select: &Select,
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let rewritten = rewriter.rewrite_select_clauses(select)?;
    let meta = rewriter.rewrite_select_meta(&rewritten, meta)?;
    Ok(Expr::new(ExprKind::Select(Box::new(rewritten)), meta))
}

/// Rewrites the clauses of a SELECT in traversal order.
pub fn walk_select_clauses<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    select: &Select,
) -> RewriteResult<Select> {
    let from = select
        .from
        .as_ref()
        .map(|from| rewriter.rewrite_from_clause(from))
        .transpose()?;
    let let_clause = select
        .let_clause
        .as_ref()
        .map(|clause| rewriter.rewrite_let_clause(clause))
        .transpose()?;
    let where_clause = rewrite_boxed(rewriter, select.where_clause.as_deref(), |r, e| {
        r.rewrite_select_where(e)
    })?;
    let group_by = select
        .group_by
        .as_ref()
        .map(|group_by| rewriter.rewrite_group_by(group_by))
        .transpose()?;
    let having = rewrite_boxed(rewriter, select.having.as_deref(), |r, e| {
        r.rewrite_select_having(e)
    })?;
    let projection = rewriter.rewrite_projection(&select.projection)?;
    let order_by = select
        .order_by
        .as_ref()
        .map(|order_by| rewriter.rewrite_order_by(order_by))
        .transpose()?;
    let limit = rewrite_boxed(rewriter, select.limit.as_deref(), |r, e| {
        r.rewrite_select_limit(e)
    })?;

    Ok(Select {
        quantifier: select.quantifier,
        projection,
        from,
        let_clause,
        where_clause,
        group_by,
        having,
        order_by,
        limit,
    })
}

/// Rewrites a FROM source: value expression, then variables.
pub fn walk_from_source<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    source: &FromSource,
) -> RewriteResult<FromSource> {
    rewriter.interrupt().check()?;
    match source {
        FromSource::Scan { expr, vars } => {
            let expr = rewriter.rewrite_from_source_value(expr)?;
            let vars = rewriter.rewrite_let_variables(vars)?;
            Ok(FromSource::Scan { expr, vars })
        }
        FromSource::Unpivot { expr, vars } => {
            let expr = rewriter.rewrite_from_source_value(expr)?;
            let vars = rewriter.rewrite_let_variables(vars)?;
            Ok(FromSource::Unpivot { expr, vars })
        }
        FromSource::Join(join) => {
            let left = rewriter.rewrite_from_source(&join.left)?;
            let right = rewriter.rewrite_from_source(&join.right)?;
            let condition = join
                .condition
                .as_ref()
                .map(|condition| rewriter.rewrite_expr(condition))
                .transpose()?;
            Ok(FromSource::Join(Box::new(Join {
                kind: join.kind,
                left,
                right,
                condition,
                implicit: join.implicit,
            })))
        }
    }
}

/// Passes the `AS`, `AT` and `BY` names through [`Rewriter::rewrite_symbolic_name`].
pub fn walk_let_variables<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    vars: &LetVariables,
) -> RewriteResult<LetVariables> {
    let mut rewrite = |name: &Option<SymbolicName>| {
        name.as_ref()
            .map(|name| rewriter.rewrite_symbolic_name(name))
            .transpose()
    };
    Ok(LetVariables {
        as_name: rewrite(&vars.as_name)?,
        at_name: rewrite(&vars.at_name)?,
        by_name: rewrite(&vars.by_name)?,
    })
}

/// Rewrites the bound expression, then the name.
pub fn walk_let_binding<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    binding: &LetBinding,
) -> RewriteResult<LetBinding> {
    let expr = rewriter.rewrite_expr(&binding.expr)?;
    let name = rewriter.rewrite_symbolic_name(&binding.name)?;
    Ok(LetBinding { expr, name })
}

/// Rewrites every key and the group name.
pub fn walk_group_by<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    group_by: &GroupBy,
) -> RewriteResult<GroupBy> {
    let items = group_by
        .items
        .iter()
        .map(|item| rewriter.rewrite_group_by_item(item))
        .collect::<RewriteResult<_>>()?;
    let group_name = group_by
        .group_name
        .as_ref()
        .map(|name| rewriter.rewrite_symbolic_name(name))
        .transpose()?;
    Ok(GroupBy {
        strategy: group_by.strategy,
        items,
        group_name,
    })
}

/// Rewrites a key and its alias.
pub fn walk_group_by_item<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    item: &GroupByItem,
) -> RewriteResult<GroupByItem> {
    let expr = rewriter.rewrite_expr(&item.expr)?;
    let alias = item
        .alias
        .as_ref()
        .map(|alias| rewriter.rewrite_symbolic_name(alias))
        .transpose()?;
    Ok(GroupByItem { expr, alias })
}

/// Rewrites every item of the projection.
pub fn walk_projection<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    projection: &Projection,
) -> RewriteResult<Projection> {
    match projection {
        Projection::List(items) => {
            let items = items
                .iter()
                .map(|item| rewriter.rewrite_select_item(item))
                .collect::<RewriteResult<_>>()?;
            Ok(Projection::List(items))
        }
        Projection::Value(expr) => Ok(Projection::Value(Box::new(rewriter.rewrite_expr(expr)?))),
        Projection::Pivot { value, key } => {
            let value = rewriter.rewrite_expr(value)?;
            let key = rewriter.rewrite_expr(key)?;
            Ok(Projection::Pivot {
                value: Box::new(value),
                key: Box::new(key),
            })
        }
    }
}

/// Rewrites one projection item.
pub fn walk_select_item<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    item: &SelectItem,
) -> RewriteResult<SelectItem> {
    rewriter.interrupt().check()?;
    match item {
        SelectItem::Expr { expr, alias } => {
            let expr = rewriter.rewrite_expr(expr)?;
            let alias = alias
                .as_ref()
                .map(|alias| rewriter.rewrite_symbolic_name(alias))
                .transpose()?;
            Ok(SelectItem::Expr { expr, alias })
        }
        SelectItem::ProjectAll(expr) => Ok(SelectItem::ProjectAll(rewriter.rewrite_expr(expr)?)),
        SelectItem::Star => Ok(SelectItem::Star),
    }
}

/// Rewrites a DML statement and keeps its metadata.
pub fn walk_dml<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    dml: &Dml,
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let rewritten = rewriter.rewrite_dml_clauses(dml)?;
    Ok(Expr::new(ExprKind::Dml(Box::new(rewritten)), meta.clone()))
}

/// Rewrites FROM, WHERE, the operations and RETURNING, in that order.
pub fn walk_dml_clauses<R: Rewriter + ?Sized>(rewriter: &mut R, dml: &Dml) -> RewriteResult<Dml> {
    let from = dml
        .from
        .as_ref()
        .map(|from| rewriter.rewrite_from_clause(from))
        .transpose()?;
    let where_clause = rewrite_boxed(rewriter, dml.where_clause.as_deref(), |r, e| {
        r.rewrite_dml_where(e)
    })?;
    let ops = dml
        .ops
        .iter()
        .map(|op| rewriter.rewrite_dml_op(op))
        .collect::<RewriteResult<_>>()?;
    let returning = dml
        .returning
        .as_ref()
        .map(|returning| rewriter.rewrite_returning(returning))
        .transpose()?;
    Ok(Dml {
        ops,
        from,
        where_clause,
        returning,
    })
}

/// Rewrites the expressions of one DML operation.
pub fn walk_dml_op<R: Rewriter + ?Sized>(rewriter: &mut R, op: &DmlOp) -> RewriteResult<DmlOp> {
    rewriter.interrupt().check()?;
    match op {
        DmlOp::Insert { target, values } => Ok(DmlOp::Insert {
            target: rewriter.rewrite_expr(target)?,
            values: rewriter.rewrite_expr(values)?,
        }),
        DmlOp::InsertValue {
            target,
            value,
            position,
            on_conflict,
        } => {
            let target = rewriter.rewrite_expr(target)?;
            let value = rewriter.rewrite_expr(value)?;
            let position = position
                .as_ref()
                .map(|position| rewriter.rewrite_expr(position))
                .transpose()?;
            let on_conflict = on_conflict
                .as_ref()
                .map(|conflict| {
                    rewriter
                        .rewrite_expr(&conflict.condition)
                        .map(|condition| OnConflict { condition })
                })
                .transpose()?;
            Ok(DmlOp::InsertValue {
                target,
                value,
                position,
                on_conflict,
            })
        }
        DmlOp::Set(assignments) => {
            let assignments = assignments
                .iter()
                .map(|assignment| {
                    Ok(Assignment {
                        target: rewriter.rewrite_expr(&assignment.target)?,
                        value: rewriter.rewrite_expr(&assignment.value)?,
                    })
                })
                .collect::<RewriteResult<_>>()?;
            Ok(DmlOp::Set(assignments))
        }
        DmlOp::Remove { target } => Ok(DmlOp::Remove {
            target: rewriter.rewrite_expr(target)?,
        }),
        DmlOp::Delete => Ok(DmlOp::Delete),
    }
}

/// Rewrites every RETURNING column expression.
pub fn walk_returning<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    returning: &Returning,
) -> RewriteResult<Returning> {
    let elems = returning
        .elems
        .iter()
        .map(|elem| {
            let column = match &elem.column {
                ReturningColumn::Wildcard => ReturningColumn::Wildcard,
                ReturningColumn::Expr(expr) => ReturningColumn::Expr(rewriter.rewrite_expr(expr)?),
            };
            Ok(ReturningElem {
                mapping: elem.mapping,
                column,
            })
        })
        .collect::<RewriteResult<_>>()?;
    Ok(Returning { elems })
}

/// Clones DDL, rewriting index key expressions.
pub fn walk_ddl<R: Rewriter + ?Sized>(
    rewriter: &mut R,
    ddl: &Ddl,
    meta: &MetaContainer,
) -> RewriteResult<Expr> {
    let ddl = match ddl {
        Ddl::CreateIndex { table, keys } => Ddl::CreateIndex {
            table: table.clone(),
            keys: rewrite_all(rewriter, keys)?,
        },
        other => other.clone(),
    };
    Ok(Expr::new(ExprKind::Ddl(ddl), meta.clone()))
}
