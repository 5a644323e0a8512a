use super::{CommandSegment, FieldFilter, ScopeId, TableSource};
use crate::schema::EntityMap;
use std::sync::Arc;

/// The intent of an `UPDATE`.
#[derive(Debug, Clone)]
pub struct Update {
    pub scope: ScopeId,

    /// The updated table first, then joined tables
    pub tables: Vec<TableSource>,

    pub segments: Vec<CommandSegment>,
    pub fields: FieldFilter,

    /// Column references are alias-qualified. Once set by a join or a
    /// `SetFrom` it stays set.
    pub need_table_alias: bool,
}

impl Update {
    pub fn new(entity: Arc<EntityMap>) -> Update {
        Update {
            scope: ScopeId::next(),
            tables: vec![TableSource::new(entity)],
            segments: vec![],
            fields: FieldFilter::default(),
            need_table_alias: false,
        }
    }

    pub fn entity(&self) -> &Arc<EntityMap> {
        &self.tables[0].entity
    }

    pub fn push(&mut self, segment: CommandSegment) {
        if matches!(
            segment,
            CommandSegment::SetFrom(_) | CommandSegment::SetFromField { .. }
        ) {
            self.need_table_alias = true;
        }
        self.segments.push(segment);
    }

    pub fn is_bulk(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, CommandSegment::SetBulk(_)))
    }
}
