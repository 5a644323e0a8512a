use super::TypeHandler;
use crate::stmt::Type;
use heck::ToSnakeCase;
use std::sync::Arc;

/// Column metadata for one entity member.
#[derive(Debug, Clone)]
pub struct MemberMap {
    /// Name of the member on the entity
    pub member_name: String,

    /// Name of the mapped column
    pub field_name: String,

    pub ty: Type,
    pub nullable: bool,

    pub is_key: bool,
    pub is_auto_increment: bool,

    /// Not mapped to a column at all
    pub is_ignore: bool,

    /// Never written by inserts
    pub is_ignore_insert: bool,

    /// Never written by updates
    pub is_ignore_update: bool,

    /// Optimistic concurrency token, bumped on every update
    pub is_row_version: bool,

    /// Converts values on their way to and from the column
    pub type_handler: Option<Arc<dyn TypeHandler>>,
}

impl MemberMap {
    /// A member mapped to the snake case form of its name.
    pub fn new(member_name: impl Into<String>, ty: Type) -> MemberMap {
        let member_name = member_name.into();
        MemberMap {
            field_name: member_name.to_snake_case(),
            member_name,
            ty,
            nullable: false,
            is_key: false,
            is_auto_increment: false,
            is_ignore: false,
            is_ignore_insert: false,
            is_ignore_update: false,
            is_row_version: false,
            type_handler: None,
        }
    }

    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    pub fn ignore(mut self) -> Self {
        self.is_ignore = true;
        self
    }

    pub fn ignore_insert(mut self) -> Self {
        self.is_ignore_insert = true;
        self
    }

    pub fn ignore_update(mut self) -> Self {
        self.is_ignore_update = true;
        self
    }

    pub fn row_version(mut self) -> Self {
        self.is_row_version = true;
        self
    }

    pub fn type_handler(mut self, handler: Arc<dyn TypeHandler>) -> Self {
        self.type_handler = Some(handler);
        self
    }

    /// Whether an insert writes this member.
    pub fn is_insertable(&self) -> bool {
        !self.is_ignore && !self.is_ignore_insert && !self.is_auto_increment
    }

    /// Whether an update may assign this member.
    pub fn is_updatable(&self) -> bool {
        !self.is_ignore && !self.is_ignore_update && !self.is_key && !self.is_auto_increment
    }
}
