use super::Expr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies the statement a column reference belongs to.
///
/// Every builder allocates a fresh scope, so a column captured from an outer
/// statement inside a sub-query still resolves to the outer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    pub fn next() -> ScopeId {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        ScopeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A member of one of the statement's tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprColumn {
    pub scope: ScopeId,

    /// Position of the table in the statement's FROM/JOIN list
    pub table: usize,

    /// Entity member name, resolved to a field through the entity map
    pub member: String,
}

impl Expr {
    pub fn column(scope: ScopeId, table: usize, member: impl Into<String>) -> Self {
        ExprColumn {
            scope,
            table,
            member: member.into(),
        }
        .into()
    }

    pub fn is_column(&self) -> bool {
        matches!(self, Self::Column(_))
    }

    pub fn as_column(&self) -> Option<&ExprColumn> {
        match self {
            Self::Column(column) => Some(column),
            _ => None,
        }
    }
}

impl From<ExprColumn> for Expr {
    fn from(value: ExprColumn) -> Self {
        Self::Column(value)
    }
}
