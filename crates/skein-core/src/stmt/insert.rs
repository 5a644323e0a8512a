use super::{CommandSegment, Expr, FieldFilter, MemberValues, Query, ScopeId};
use crate::schema::EntityMap;
use std::sync::Arc;

/// The intent of an `INSERT`.
#[derive(Debug, Clone)]
pub struct Insert {
    pub scope: ScopeId,
    pub entity: Arc<EntityMap>,

    /// Physical table name overriding the entity's mapped name
    pub table_name: Option<String>,

    pub segments: Vec<CommandSegment>,
    pub fields: FieldFilter,

    /// Append the dialect's identity fetch and read the generated key
    pub return_identity: bool,

    pub upsert: Option<Upsert>,

    /// `INSERT INTO t (...) SELECT ...`
    pub from_query: Option<Box<Query>>,

    /// Rows per round trip for bulk inserts; the context default when unset
    pub bulk_count: Option<usize>,
}

/// The argument of a single-row insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    One(MemberValues),

    /// A collection passed where one row is expected; always rejected
    Many(Vec<MemberValues>),
}

/// Assignments applied when the inserted row conflicts with an existing one.
#[derive(Debug, Clone)]
pub enum Upsert {
    /// Member expressions, which may read the existing row
    Record(Expr),

    /// Member values
    Values(MemberValues),
}

impl Insert {
    pub fn new(entity: Arc<EntityMap>) -> Insert {
        Insert {
            scope: ScopeId::next(),
            entity,
            table_name: None,
            segments: vec![],
            fields: FieldFilter::default(),
            return_identity: false,
            upsert: None,
            from_query: None,
            bulk_count: None,
        }
    }

    pub fn is_bulk(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, CommandSegment::WithBulk(_)))
    }
}

impl From<MemberValues> for InsertSource {
    fn from(value: MemberValues) -> Self {
        InsertSource::One(value)
    }
}

impl From<Vec<MemberValues>> for InsertSource {
    fn from(value: Vec<MemberValues>) -> Self {
        InsertSource::Many(value)
    }
}

impl<K: Into<String>, V: Into<super::Value>> From<std::collections::HashMap<K, V>> for InsertSource {
    fn from(value: std::collections::HashMap<K, V>) -> Self {
        InsertSource::One(value.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<super::Value>> From<indexmap::IndexMap<K, V>> for InsertSource {
    fn from(value: indexmap::IndexMap<K, V>) -> Self {
        InsertSource::One(value.into_iter().collect())
    }
}
