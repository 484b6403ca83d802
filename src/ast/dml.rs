//! Data manipulation, data definition and procedure call nodes.

use smol_str::SmolStr;

use crate::ast::expression::{CaseSensitivity, Expr, ExprKind};
use crate::ast::query::FromSource;

/// A DML statement: `[FROM ...] op [op ...] [WHERE ...] [RETURNING ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dml {
    pub ops: Vec<DmlOp>,
    pub from: Option<FromSource>,
    pub where_clause: Option<Box<Expr>>,
    pub returning: Option<Returning>,
}

impl Dml {
    /// Statement applying `ops` with no FROM, WHERE or RETURNING.
    pub fn new(ops: Vec<DmlOp>) -> Self {
        Self {
            ops,
            from: None,
            where_clause: None,
            returning: None,
        }
    }

    /// Sets the FROM source.
    pub fn with_from(mut self, from: FromSource) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the WHERE condition.
    pub fn with_where(mut self, condition: Expr) -> Self {
        self.where_clause = Some(Box::new(condition));
        self
    }

    /// Sets the RETURNING clause.
    pub fn with_returning(mut self, returning: Returning) -> Self {
        self.returning = Some(returning);
        self
    }

    /// Wraps the statement in an [`Expr`] without metadata.
    pub fn into_expr(self) -> Expr {
        Expr::bare(ExprKind::Dml(Box::new(self)))
    }
}

/// One data manipulation operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DmlOp {
    /// `INSERT INTO target <values>`
    Insert { target: Expr, values: Expr },
    /// `INSERT INTO target VALUE v [AT pos] [ON CONFLICT WHERE cond DO NOTHING]`
    InsertValue {
        target: Expr,
        value: Expr,
        position: Option<Expr>,
        on_conflict: Option<OnConflict>,
    },
    /// `SET target = value, ...`
    Set(Vec<Assignment>),
    /// `REMOVE target`
    Remove { target: Expr },
    /// `DELETE`
    Delete,
}

/// `ON CONFLICT WHERE condition`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OnConflict {
    pub condition: Expr,
}

/// `target = value` of a SET operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Assignment {
    pub target: Expr,
    pub value: Expr,
}

/// `RETURNING elem, ...`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Returning {
    pub elems: Vec<ReturningElem>,
}

/// One `MODIFIED|ALL NEW|OLD column` element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReturningElem {
    pub mapping: ReturningMapping,
    pub column: ReturningColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturningMapping {
    ModifiedNew,
    ModifiedOld,
    AllNew,
    AllOld,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturningColumn {
    /// `*`
    Wildcard,
    Expr(Expr),
}

/// Data definition statements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ddl {
    CreateTable {
        name: SmolStr,
    },
    DropTable {
        name: SmolStr,
        case: CaseSensitivity,
    },
    CreateIndex {
        table: SmolStr,
        keys: Vec<Expr>,
    },
    DropIndex {
        table: SmolStr,
        index: SmolStr,
        case: CaseSensitivity,
    },
}

/// `EXEC procedure arg, ...`. The procedure name is not an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exec {
    pub procedure: SmolStr,
    pub args: Vec<Expr>,
}
