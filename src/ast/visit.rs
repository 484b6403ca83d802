//! Immutable tree visitor infrastructure.
//!
//! [`Visit`] is the read-only counterpart of [`Rewriter`](crate::ast::rewrite::Rewriter):
//! the same traversal order, nothing produced. A visitor skips a sub-tree by not
//! calling the `walk_*` function for it, and stops the whole traversal by breaking.

use std::ops::ControlFlow;

use crate::ast::dml::{Ddl, Dml, DmlOp, Returning, ReturningColumn};
use crate::ast::expression::{CallAgg, Expr, ExprKind, PathExpr, PathStep, VarRef, WhenClause};
use crate::ast::query::{
    FromSource, GroupBy, LetClause, LetVariables, Projection, Select, SelectItem, SymbolicName,
};
use crate::interrupt::Interrupt;
use crate::semantic::error::SemanticError;

/// Shared type alias for visitor traversal methods.
pub type VisitResult<B> = ControlFlow<B>;

macro_rules! try_visit {
    ($expr:expr) => {
        match $expr {
            ControlFlow::Continue(()) => {}
            ControlFlow::Break(b) => return ControlFlow::Break(b),
        }
    };
}

macro_rules! check_interrupt {
    ($visitor:expr) => {
        if let Err(error) = $visitor.interrupt().check() {
            return ControlFlow::Break(error.into());
        }
    };
}

/// Read-only traversal with one overridable method per node kind.
///
/// Walks nodes in the same order as [`Rewriter`](crate::ast::Rewriter).
pub trait Visit {
    /// Early-exit payload produced when traversal stops. Cancellation breaks with
    /// [`SemanticError::Interrupted`] converted into this type.
    type Break: From<SemanticError>;

    /// Cancellation handle polled during traversal.
    fn interrupt(&self) -> &Interrupt;

    fn visit_expr(&mut self, expr: &Expr) -> VisitResult<Self::Break> {
        walk_expr(self, expr)
    }

    fn visit_var_ref(&mut self, _var: &VarRef, _expr: &Expr) -> VisitResult<Self::Break> {
        ControlFlow::Continue(())
    }

    fn visit_call_agg(&mut self, agg: &CallAgg, _expr: &Expr) -> VisitResult<Self::Break> {
        self.visit_expr(&agg.arg)
    }

    fn visit_path(&mut self, path: &PathExpr) -> VisitResult<Self::Break> {
        walk_path(self, path)
    }

    fn visit_select(&mut self, select: &Select) -> VisitResult<Self::Break> {
        walk_select(self, select)
    }

    fn visit_from_source(&mut self, source: &FromSource) -> VisitResult<Self::Break> {
        walk_from_source(self, source)
    }

    fn visit_let_variables(&mut self, vars: &LetVariables) -> VisitResult<Self::Break> {
        for name in vars.names() {
            try_visit!(self.visit_symbolic_name(name));
        }
        ControlFlow::Continue(())
    }

    fn visit_symbolic_name(&mut self, _name: &SymbolicName) -> VisitResult<Self::Break> {
        ControlFlow::Continue(())
    }

    fn visit_let_clause(&mut self, clause: &LetClause) -> VisitResult<Self::Break> {
        for binding in &clause.bindings {
            try_visit!(self.visit_expr(&binding.expr));
            try_visit!(self.visit_symbolic_name(&binding.name));
        }
        ControlFlow::Continue(())
    }

    fn visit_group_by(&mut self, group_by: &GroupBy) -> VisitResult<Self::Break> {
        walk_group_by(self, group_by)
    }

    fn visit_projection(&mut self, projection: &Projection) -> VisitResult<Self::Break> {
        walk_projection(self, projection)
    }

    fn visit_select_item(&mut self, item: &SelectItem) -> VisitResult<Self::Break> {
        walk_select_item(self, item)
    }

    fn visit_dml(&mut self, dml: &Dml) -> VisitResult<Self::Break> {
        walk_dml(self, dml)
    }

    fn visit_dml_op(&mut self, op: &DmlOp) -> VisitResult<Self::Break> {
        walk_dml_op(self, op)
    }

    fn visit_returning(&mut self, returning: &Returning) -> VisitResult<Self::Break> {
        for elem in &returning.elems {
            if let ReturningColumn::Expr(expr) = &elem.column {
                try_visit!(self.visit_expr(expr));
            }
        }
        ControlFlow::Continue(())
    }
}

fn visit_all<V: Visit + ?Sized>(visitor: &mut V, exprs: &[Expr]) -> VisitResult<V::Break> {
    for expr in exprs {
        try_visit!(visitor.visit_expr(expr));
    }
    ControlFlow::Continue(())
}

fn visit_whens<V: Visit + ?Sized>(visitor: &mut V, whens: &[WhenClause]) -> VisitResult<V::Break> {
    for arm in whens {
        try_visit!(visitor.visit_expr(&arm.when));
        try_visit!(visitor.visit_expr(&arm.then));
    }
    ControlFlow::Continue(())
}

fn visit_opt<V: Visit + ?Sized>(visitor: &mut V, expr: Option<&Expr>) -> VisitResult<V::Break> {
    match expr {
        Some(expr) => visitor.visit_expr(expr),
        None => ControlFlow::Continue(()),
    }
}

/// Dispatches on the node kind after polling the interrupt.
pub fn walk_expr<V: Visit + ?Sized>(visitor: &mut V, expr: &Expr) -> VisitResult<V::Break> {
    check_interrupt!(visitor);
    match &expr.kind {
        ExprKind::Lit(_) | ExprKind::Missing | ExprKind::Param(_) => ControlFlow::Continue(()),
        ExprKind::Id(var) => visitor.visit_var_ref(var, expr),
        ExprKind::Nary(_, args) => visit_all(visitor, args),
        ExprKind::Call(call) => visit_all(visitor, &call.args),
        ExprKind::CallAgg(agg) => visitor.visit_call_agg(agg, expr),
        ExprKind::Typed(_, inner, _) => visitor.visit_expr(inner),
        ExprKind::Path(path) => visitor.visit_path(path),
        ExprKind::SimpleCase(case) => {
            try_visit!(visitor.visit_expr(&case.operand));
            try_visit!(visit_whens(visitor, &case.whens));
            visit_opt(visitor, case.default.as_deref())
        }
        ExprKind::SearchedCase(case) => {
            try_visit!(visit_whens(visitor, &case.whens));
            visit_opt(visitor, case.default.as_deref())
        }
        ExprKind::Struct(fields) => {
            for field in fields {
                try_visit!(visitor.visit_expr(&field.name));
                try_visit!(visitor.visit_expr(&field.value));
            }
            ControlFlow::Continue(())
        }
        ExprKind::Seq(_, values) => visit_all(visitor, values),
        ExprKind::Select(select) => visitor.visit_select(select),
        ExprKind::Dml(dml) => visitor.visit_dml(dml),
        ExprKind::Ddl(Ddl::CreateIndex { keys, .. }) => visit_all(visitor, keys),
        ExprKind::Ddl(_) => ControlFlow::Continue(()),
        ExprKind::Exec(exec) => visit_all(visitor, &exec.args),
    }
}

/// Visits a path's root, then its index expressions.
pub fn walk_path<V: Visit + ?Sized>(visitor: &mut V, path: &PathExpr) -> VisitResult<V::Break> {
    try_visit!(visitor.visit_expr(&path.root));
    for step in &path.steps {
        if let PathStep::Index { expr, .. } = step {
            try_visit!(visitor.visit_expr(expr));
        }
    }
    ControlFlow::Continue(())
}

/// Visits the clauses of a SELECT in traversal order.
pub fn walk_select<V: Visit + ?Sized>(visitor: &mut V, select: &Select) -> VisitResult<V::Break> {
    if let Some(from) = &select.from {
        try_visit!(visitor.visit_from_source(from));
    }
    if let Some(let_clause) = &select.let_clause {
        try_visit!(visitor.visit_let_clause(let_clause));
    }
    try_visit!(visit_opt(visitor, select.where_clause.as_deref()));
    if let Some(group_by) = &select.group_by {
        try_visit!(visitor.visit_group_by(group_by));
    }
    try_visit!(visit_opt(visitor, select.having.as_deref()));
    try_visit!(visitor.visit_projection(&select.projection));
    if let Some(order_by) = &select.order_by {
        for spec in &order_by.specs {
            try_visit!(visitor.visit_expr(&spec.expr));
        }
    }
    visit_opt(visitor, select.limit.as_deref())
}

/// Visits a FROM source: value expression, then variables.
pub fn walk_from_source<V: Visit + ?Sized>(
    visitor: &mut V,
    source: &FromSource,
) -> VisitResult<V::Break> {
    check_interrupt!(visitor);
    match source {
        FromSource::Scan { expr, vars } | FromSource::Unpivot { expr, vars } => {
            try_visit!(visitor.visit_expr(expr));
            visitor.visit_let_variables(vars)
        }
        FromSource::Join(join) => {
            try_visit!(visitor.visit_from_source(&join.left));
            try_visit!(visitor.visit_from_source(&join.right));
            visit_opt(visitor, join.condition.as_ref())
        }
    }
}

/// Visits every key and alias, then the group name.
pub fn walk_group_by<V: Visit + ?Sized>(
    visitor: &mut V,
    group_by: &GroupBy,
) -> VisitResult<V::Break> {
    for item in &group_by.items {
        try_visit!(visitor.visit_expr(&item.expr));
        if let Some(alias) = &item.alias {
            try_visit!(visitor.visit_symbolic_name(alias));
        }
    }
    if let Some(name) = &group_by.group_name {
        try_visit!(visitor.visit_symbolic_name(name));
    }
    ControlFlow::Continue(())
}

/// Visits every item of the projection.
pub fn walk_projection<V: Visit + ?Sized>(
    visitor: &mut V,
    projection: &Projection,
) -> VisitResult<V::Break> {
    match projection {
        Projection::List(items) => {
            for item in items {
                try_visit!(visitor.visit_select_item(item));
            }
            ControlFlow::Continue(())
        }
        Projection::Value(expr) => visitor.visit_expr(expr),
        Projection::Pivot { value, key } => {
            try_visit!(visitor.visit_expr(value));
            visitor.visit_expr(key)
        }
    }
}

/// Visits one projection item.
pub fn walk_select_item<V: Visit + ?Sized>(
    visitor: &mut V,
    item: &SelectItem,
) -> VisitResult<V::Break> {
    check_interrupt!(visitor);
    match item {
        SelectItem::Expr { expr, alias } => {
            try_visit!(visitor.visit_expr(expr));
            match alias {
                Some(alias) => visitor.visit_symbolic_name(alias),
                None => ControlFlow::Continue(()),
            }
        }
        SelectItem::ProjectAll(expr) => visitor.visit_expr(expr),
        SelectItem::Star => ControlFlow::Continue(()),
    }
}

/// Visits FROM, WHERE, the operations and RETURNING, in that order.
pub fn walk_dml<V: Visit + ?Sized>(visitor: &mut V, dml: &Dml) -> VisitResult<V::Break> {
    if let Some(from) = &dml.from {
        try_visit!(visitor.visit_from_source(from));
    }
    try_visit!(visit_opt(visitor, dml.where_clause.as_deref()));
    for op in &dml.ops {
        try_visit!(visitor.visit_dml_op(op));
    }
    match &dml.returning {
        Some(returning) => visitor.visit_returning(returning),
        None => ControlFlow::Continue(()),
    }
}

/// Visits the expressions of one DML operation.
pub fn walk_dml_op<V: Visit + ?Sized>(visitor: &mut V, op: &DmlOp) -> VisitResult<V::Break> {
    check_interrupt!(visitor);
    match op {
        DmlOp::Insert { target, values } => {
            try_visit!(visitor.visit_expr(target));
            visitor.visit_expr(values)
        }
        DmlOp::InsertValue {
            target,
            value,
            position,
            on_conflict,
        } => {
            try_visit!(visitor.visit_expr(target));
            try_visit!(visitor.visit_expr(value));
            try_visit!(visit_opt(visitor, position.as_ref()));
            visit_opt(visitor, on_conflict.as_ref().map(|conflict| &conflict.condition))
        }
        DmlOp::Set(assignments) => {
            for assignment in assignments {
                try_visit!(visitor.visit_expr(&assignment.target));
                try_visit!(visitor.visit_expr(&assignment.value));
            }
            ControlFlow::Continue(())
        }
        DmlOp::Remove { target } => visitor.visit_expr(target),
        DmlOp::Delete => ControlFlow::Continue(()),
    }
}
