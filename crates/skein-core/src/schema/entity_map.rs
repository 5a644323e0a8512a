use super::MemberMap;
use crate::{Error, Result};
use heck::ToSnakeCase;
use indexmap::IndexMap;

/// Table mapping for one entity.
#[derive(Debug, Clone)]
pub struct EntityMap {
    /// Entity name, as used for lookups and error messages
    pub name: String,

    pub table_name: String,

    /// Members in declaration order
    members: IndexMap<String, MemberMap>,
}

pub struct EntityMapBuilder {
    name: String,
    table_name: Option<String>,
    members: IndexMap<String, MemberMap>,
}

impl EntityMap {
    pub fn builder(name: impl Into<String>) -> EntityMapBuilder {
        EntityMapBuilder {
            name: name.into(),
            table_name: None,
            members: IndexMap::new(),
        }
    }

    pub fn member(&self, name: &str) -> Option<&MemberMap> {
        self.members.get(name)
    }

    /// Looks up a mapped member, failing for unknown or ignored members.
    pub fn member_or_err(&self, name: &str) -> Result<&MemberMap> {
        match self.members.get(name) {
            Some(member) if !member.is_ignore => Ok(member),
            Some(_) => Err(Error::invalid_mapping(format!(
                "member `{}.{name}` is not mapped to a column",
                self.name
            ))),
            None => Err(Error::invalid_mapping(format!(
                "entity `{}` has no member `{name}`",
                self.name
            ))),
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &MemberMap> {
        self.members.values()
    }

    /// Members backed by a column.
    pub fn mapped_members(&self) -> impl Iterator<Item = &MemberMap> {
        self.members.values().filter(|member| !member.is_ignore)
    }

    pub fn key_members(&self) -> impl Iterator<Item = &MemberMap> {
        self.members.values().filter(|member| member.is_key)
    }

    /// The single key member, required by key-list operations.
    pub fn single_key(&self) -> Result<&MemberMap> {
        let mut keys = self.key_members();
        match (keys.next(), keys.next()) {
            (Some(key), None) => Ok(key),
            (None, _) => Err(Error::invalid_mapping(format!(
                "entity `{}` has no key member",
                self.name
            ))),
            (Some(_), Some(_)) => Err(Error::invalid_mapping(format!(
                "entity `{}` has a composite key; pass key objects instead of values",
                self.name
            ))),
        }
    }

    pub fn auto_increment_key(&self) -> Option<&MemberMap> {
        self.key_members().find(|member| member.is_auto_increment)
    }

    pub fn row_version(&self) -> Option<&MemberMap> {
        self.mapped_members().find(|member| member.is_row_version)
    }

    /// A copy of this map reading from a different table.
    pub fn with_table_name(&self, table_name: impl Into<String>) -> EntityMap {
        EntityMap {
            table_name: table_name.into(),
            ..self.clone()
        }
    }
}

impl EntityMapBuilder {
    /// Sets the table name; defaults to the snake case entity name.
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn member(mut self, member: MemberMap) -> Self {
        self.members.insert(member.member_name.clone(), member);
        self
    }

    /// Adjusts an already declared member.
    pub fn configure(mut self, name: &str, f: impl FnOnce(MemberMap) -> MemberMap) -> Result<Self> {
        let Some(member) = self.members.shift_remove_full(name) else {
            return Err(Error::invalid_mapping(format!(
                "entity `{}` has no member `{name}` to configure",
                self.name
            )));
        };
        let (index, _, member) = member;
        let member = f(member);
        let (last, _) = self.members.insert_full(member.member_name.clone(), member);
        self.members.move_index(last, index);
        Ok(self)
    }

    pub fn build(self) -> Result<EntityMap> {
        if self.members.values().all(|member| member.is_ignore) {
            return Err(Error::invalid_mapping(format!(
                "entity `{}` maps no members",
                self.name
            )));
        }

        let auto_increment = self
            .members
            .values()
            .filter(|member| member.is_auto_increment)
            .collect::<Vec<_>>();
        if let Some(member) = auto_increment.iter().find(|member| !member.ty.is_integer()) {
            return Err(Error::invalid_mapping(format!(
                "auto-increment member `{}.{}` must be an integer",
                self.name, member.member_name
            )));
        }
        if auto_increment.len() > 1 {
            return Err(Error::invalid_mapping(format!(
                "entity `{}` declares more than one auto-increment member",
                self.name
            )));
        }

        Ok(EntityMap {
            table_name: self
                .table_name
                .unwrap_or_else(|| self.name.to_snake_case()),
            name: self.name,
            members: self.members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stmt::Type;

    fn user() -> EntityMap {
        EntityMap::builder("UserProfile")
            .member(MemberMap::new("id", Type::I64).key().auto_increment())
            .member(MemberMap::new("displayName", Type::String))
            .member(MemberMap::new("cache", Type::String).ignore())
            .build()
            .unwrap()
    }

    #[test]
    fn names_default_to_snake_case() {
        let map = user();
        assert_eq!(map.table_name, "user_profile");
        assert_eq!(map.member("displayName").unwrap().field_name, "display_name");
    }

    #[test]
    fn ignored_members_are_not_mapped() {
        let map = user();
        assert_eq!(map.mapped_members().count(), 2);
        assert!(map.member_or_err("cache").unwrap_err().is_invalid_mapping());
        assert!(map.member_or_err("nope").unwrap_err().is_invalid_mapping());
    }

    #[test]
    fn configure_keeps_declaration_order() {
        let map = EntityMap::builder("Tag")
            .member(MemberMap::new("id", Type::I64))
            .member(MemberMap::new("label", Type::String))
            .configure("id", MemberMap::key)
            .unwrap()
            .build()
            .unwrap();

        let names: Vec<_> = map.members().map(|m| m.member_name.as_str()).collect();
        assert_eq!(names, ["id", "label"]);
        assert_eq!(map.single_key().unwrap().member_name, "id");
    }

    #[test]
    fn auto_increment_must_be_integer() {
        let err = EntityMap::builder("Tag")
            .member(MemberMap::new("id", Type::String).key().auto_increment())
            .build()
            .unwrap_err();
        assert!(err.is_invalid_mapping());
    }
}
