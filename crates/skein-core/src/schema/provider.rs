use super::EntityMap;
use crate::{Error, Result};
use indexmap::IndexMap;
use std::{
    fmt::Debug,
    sync::{Arc, PoisonError, RwLock},
};

/// Read-only lookup of entity maps by entity name.
pub trait EntityMapProvider: Debug + Send + Sync + 'static {
    fn entity_map(&self, name: &str) -> Result<Arc<EntityMap>>;
}

/// The entity maps known to a `Db`.
///
/// Entities are registered up front through the db builder, or on first use
/// from the entity's own declaration.
#[derive(Debug, Default)]
pub struct Schema {
    table_name_prefix: Option<String>,
    entities: RwLock<IndexMap<String, Arc<EntityMap>>>,
}

impl Schema {
    pub fn new(table_name_prefix: Option<String>) -> Schema {
        Schema {
            table_name_prefix,
            entities: RwLock::default(),
        }
    }

    /// Adds a map, replacing any previous map for the same entity.
    pub fn register(&self, map: EntityMap) -> Arc<EntityMap> {
        let map = Arc::new(self.apply_prefix(map));
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(map.name.clone(), map.clone());
        map
    }

    /// Returns the registered map, registering the result of `init` first
    /// when the entity is unknown.
    pub fn get_or_register(
        &self,
        name: &str,
        init: impl FnOnce() -> Result<EntityMap>,
    ) -> Result<Arc<EntityMap>> {
        if let Some(map) = self
            .entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(map.clone());
        }

        let map = init()?;
        let mut entities = self.entities.write().unwrap_or_else(PoisonError::into_inner);
        let map = entities
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(self.apply_prefix(map)));
        Ok(map.clone())
    }

    /// Registered maps, in registration order.
    pub fn entities(&self) -> Vec<Arc<EntityMap>> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn apply_prefix(&self, mut map: EntityMap) -> EntityMap {
        if let Some(prefix) = &self.table_name_prefix {
            map.table_name = format!("{prefix}{}", map.table_name);
        }
        map
    }
}

impl EntityMapProvider for Schema {
    fn entity_map(&self, name: &str) -> Result<Arc<EntityMap>> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| Error::invalid_mapping(format!("entity `{name}` is not registered")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schema::MemberMap, stmt::Type};

    fn tag() -> Result<EntityMap> {
        EntityMap::builder("Tag")
            .member(MemberMap::new("id", Type::I64).key())
            .build()
    }

    #[test]
    fn prefix_applies_on_registration() {
        let schema = Schema::new(Some("app_".to_string()));
        let map = schema.get_or_register("Tag", tag).unwrap();
        assert_eq!(map.table_name, "app_tag");
        assert_eq!(schema.entity_map("Tag").unwrap().table_name, "app_tag");
    }

    #[test]
    fn registration_happens_once() {
        let schema = Schema::default();
        schema.get_or_register("Tag", tag).unwrap();
        let map = schema
            .get_or_register("Tag", || panic!("already registered"))
            .unwrap();
        assert_eq!(map.name, "Tag");
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn unknown_entity() {
        let err = Schema::default().entity_map("Missing").unwrap_err();
        assert!(err.is_invalid_mapping());
    }
}
