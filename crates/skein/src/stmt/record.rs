use super::{member_of, Expr, IntoExpr};
use skein_core::{
    stmt::{self, ExprRecord},
    Result,
};

/// Member-labelled expressions, used as a projection.
///
/// Labels are the member names of the type the rows are read into.
#[derive(Debug, Clone, Default)]
pub struct Record {
    untyped: ExprRecord,
}

/// `member = value`, collected by an update's `set`.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub(crate) member: Result<String>,
    pub(crate) value: stmt::Expr,
}

impl Record {
    pub fn new() -> Record {
        Record::default()
    }

    pub fn field<T>(mut self, label: &str, expr: impl IntoExpr<T>) -> Record {
        self.untyped.push(label, expr.into_expr().untyped);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.untyped.is_empty()
    }

    pub(crate) fn into_untyped(self) -> stmt::Expr {
        self.untyped.into()
    }
}

impl<T> Expr<T> {
    /// Assigns `value` to the member this expression reads.
    pub fn assign(&self, value: impl IntoExpr<T>) -> Assignment {
        Assignment {
            member: member_of(self),
            value: value.into_expr().untyped,
        }
    }
}

impl Assignment {
    pub(crate) fn into_record(assignments: impl IntoIterator<Item = Assignment>) -> Result<ExprRecord> {
        let mut record = ExprRecord::new();
        for assignment in assignments {
            record.push(assignment.member?, assignment.value);
        }
        Ok(record)
    }
}
