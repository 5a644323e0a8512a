use super::{Expr, ScopeId};
use crate::schema::EntityMap;
use std::sync::Arc;

/// The intent of a `SELECT`, accumulated by a query builder.
///
/// Compiling a query never mutates it: the same value renders the same SQL
/// and parameters every time.
#[derive(Debug, Clone)]
pub struct Query {
    pub scope: ScopeId,

    /// FROM table first, then joins in call order
    pub tables: Vec<TableSource>,

    /// Named sub-queries rendered in a `WITH` clause
    pub ctes: Vec<Cte>,

    /// WHERE clauses, AND-joined in order
    pub filter: Vec<Expr>,

    pub group_by: Vec<Expr>,

    /// HAVING clauses, AND-joined in order
    pub having: Vec<Expr>,

    pub order_by: Vec<OrderBy>,

    /// Projection. `None` selects every mapped member of the first table.
    pub select: Option<Expr>,

    pub distinct: bool,

    pub paging: Option<Paging>,

    pub unions: Vec<Union>,

    /// Navigations loaded by a second statement once the rows are read
    pub includes: Vec<Include>,
}

#[derive(Debug, Clone)]
pub struct TableSource {
    pub entity: Arc<EntityMap>,

    /// `None` for the FROM table
    pub join: Option<Join>,

    /// Physical table name overriding the entity's mapped name
    pub table_name: Option<String>,

    /// Reads from a sub-query or CTE instead of a table
    pub body: Option<TableBody>,
}

#[derive(Debug, Clone)]
pub enum TableBody {
    /// `FROM (SELECT ...) alias`
    Subquery(Box<Query>),

    /// `FROM cte_name alias`
    Cte(String),
}

#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    pub on: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Cte {
    pub name: String,
    pub query: Query,
}

#[derive(Debug, Clone)]
pub struct OrderBy {
    pub expr: Expr,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Row window. Only one mode is active; the last builder call wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    SkipTake { skip: Option<u64>, take: Option<u64> },

    /// One-based page index
    Page { index: u64, size: u64 },
}

#[derive(Debug, Clone)]
pub struct Union {
    pub all: bool,
    pub query: Query,
}

/// A navigation to load after the primary rows are read.
///
/// Children are the `target` rows whose `child_key` member equals the
/// parent's `parent_key` member.
#[derive(Debug, Clone)]
pub struct Include {
    pub navigation: String,
    pub target: Arc<EntityMap>,
    pub parent_key: String,
    pub child_key: String,

    /// Navigations of the children, loaded in the same round trip
    pub then: Vec<Include>,
}

impl Query {
    pub fn new(entity: Arc<EntityMap>) -> Query {
        Query {
            scope: ScopeId::next(),
            tables: vec![TableSource::new(entity)],
            ctes: vec![],
            filter: vec![],
            group_by: vec![],
            having: vec![],
            order_by: vec![],
            select: None,
            distinct: false,
            paging: None,
            unions: vec![],
            includes: vec![],
        }
    }

    /// The entity of the FROM table.
    pub fn entity(&self) -> &Arc<EntityMap> {
        &self.tables[0].entity
    }

    pub fn skip(&mut self, n: u64) {
        self.paging = Some(match self.paging {
            Some(Paging::SkipTake { take, .. }) => Paging::SkipTake {
                skip: Some(n),
                take,
            },
            _ => Paging::SkipTake {
                skip: Some(n),
                take: None,
            },
        });
    }

    pub fn take(&mut self, n: u64) {
        self.paging = Some(match self.paging {
            Some(Paging::SkipTake { skip, .. }) => Paging::SkipTake {
                skip,
                take: Some(n),
            },
            _ => Paging::SkipTake {
                skip: None,
                take: Some(n),
            },
        });
    }

    pub fn page(&mut self, index: u64, size: u64) {
        self.paging = Some(Paging::Page { index, size });
    }
}

impl TableSource {
    pub fn new(entity: Arc<EntityMap>) -> TableSource {
        TableSource {
            entity,
            join: None,
            table_name: None,
            body: None,
        }
    }
}

impl Paging {
    /// `(offset, limit)` to render.
    pub fn offset_limit(&self) -> (Option<u64>, Option<u64>) {
        match *self {
            Paging::SkipTake { skip, take } => (skip.filter(|n| *n > 0), take),
            Paging::Page { index, size } => {
                let offset = index.saturating_sub(1).saturating_mul(size);
                ((offset > 0).then_some(offset), Some(size))
            }
        }
    }

    /// One-based page index and page size, when a page size is known.
    ///
    /// Skip/take converts as `ceil(skip / take) + 1`.
    pub fn page_index(&self) -> Option<(u64, u64)> {
        match *self {
            Paging::Page { index, size } => Some((index, size)),
            Paging::SkipTake {
                skip,
                take: Some(size),
            } if size > 0 => Some((skip.unwrap_or(0).div_ceil(size) + 1, size)),
            Paging::SkipTake { .. } => None,
        }
    }
}
