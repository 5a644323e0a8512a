use super::{CommandSegment, ScopeId};
use crate::schema::EntityMap;
use std::sync::Arc;

/// The intent of a `DELETE`.
#[derive(Debug, Clone)]
pub struct Delete {
    pub scope: ScopeId,
    pub entity: Arc<EntityMap>,

    /// Physical table name overriding the entity's mapped name
    pub table_name: Option<String>,

    pub segments: Vec<CommandSegment>,

    /// Keys per statement when deleting by a key list; the context default
    /// when unset
    pub bulk_count: Option<usize>,
}

impl Delete {
    pub fn new(entity: Arc<EntityMap>) -> Delete {
        Delete {
            scope: ScopeId::next(),
            entity,
            table_name: None,
            segments: vec![],
            bulk_count: None,
        }
    }
}
