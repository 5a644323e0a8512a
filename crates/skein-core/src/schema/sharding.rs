use super::EntityMap;
use crate::{
    stmt::{MemberValues, Value},
    Error, Result,
};
use indexmap::IndexMap;
use std::{fmt, sync::Arc};

/// Resolves the physical table of a sharded entity.
pub trait TableSharding: fmt::Debug + Send + Sync + 'static {
    /// Members whose values select the table, in the order `table_name`
    /// receives them.
    fn dependent_members(&self) -> &[String];

    fn table_name(&self, origin: &str, values: &[Value]) -> Result<String>;
}

/// Looks up the sharding rule for an entity, if any.
pub trait ShardingProvider: fmt::Debug + Send + Sync + 'static {
    fn table_sharding(&self, entity: &str) -> Option<Arc<dyn TableSharding>>;
}

type ShardFn = dyn Fn(&str, &[Value]) -> Result<String> + Send + Sync;

/// A sharding rule backed by a closure.
pub struct ShardBy {
    members: Vec<String>,
    f: Box<ShardFn>,
}

/// Sharding rules keyed by entity name.
#[derive(Debug, Default)]
pub struct Sharding {
    tables: IndexMap<String, Arc<dyn TableSharding>>,
}

impl ShardBy {
    pub fn new(
        members: impl IntoIterator<Item = impl Into<String>>,
        f: impl Fn(&str, &[Value]) -> Result<String> + Send + Sync + 'static,
    ) -> ShardBy {
        ShardBy {
            members: members.into_iter().map(Into::into).collect(),
            f: Box::new(f),
        }
    }
}

impl fmt::Debug for ShardBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardBy")
            .field("members", &self.members)
            .finish()
    }
}

impl TableSharding for ShardBy {
    fn dependent_members(&self) -> &[String] {
        &self.members
    }

    fn table_name(&self, origin: &str, values: &[Value]) -> Result<String> {
        (self.f)(origin, values)
    }
}

impl Sharding {
    pub fn new() -> Sharding {
        Sharding::default()
    }

    pub fn table(mut self, entity: impl Into<String>, rule: impl TableSharding) -> Self {
        self.tables.insert(entity.into(), Arc::new(rule));
        self
    }
}

impl ShardingProvider for Sharding {
    fn table_sharding(&self, entity: &str) -> Option<Arc<dyn TableSharding>> {
        self.tables.get(entity).cloned()
    }
}

/// Computes the table of one row.
pub fn sharded_table_name(
    sharding: &dyn TableSharding,
    entity: &EntityMap,
    row: &MemberValues,
) -> Result<String> {
    let values = sharding
        .dependent_members()
        .iter()
        .map(|member| {
            row.get(member).cloned().ok_or_else(|| {
                Error::invalid_argument(format!(
                    "sharded entity `{}` needs member `{member}` to resolve its table",
                    entity.name
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    sharding.table_name(&entity.table_name, &values)
}

/// Groups row indices by the table each row routes to, keeping first-seen
/// table order and row order within a table.
pub fn split_sharding_parameters(
    sharding: &dyn TableSharding,
    entity: &EntityMap,
    rows: &[MemberValues],
) -> Result<IndexMap<String, Vec<usize>>> {
    let mut groups = IndexMap::<String, Vec<usize>>::new();
    for (index, row) in rows.iter().enumerate() {
        let table = sharded_table_name(sharding, entity, row)?;
        groups.entry(table).or_default().push(index);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schema::MemberMap, stmt::Type};

    fn by_region() -> ShardBy {
        ShardBy::new(["region"], |origin, values| {
            Ok(format!("{origin}_{}", values[0].as_str().unwrap_or("default")))
        })
    }

    #[test]
    fn rows_group_by_table_in_first_seen_order() {
        let entity = EntityMap::builder("Order")
            .member(MemberMap::new("id", Type::I64).key())
            .member(MemberMap::new("region", Type::String))
            .build()
            .unwrap();
        let rows = ["eu", "us", "eu", "ap"]
            .into_iter()
            .map(|region| MemberValues::new().with("region", region))
            .collect::<Vec<_>>();

        let groups = split_sharding_parameters(&by_region(), &entity, &rows).unwrap();
        let groups: Vec<_> = groups.into_iter().collect();
        assert_eq!(
            groups,
            [
                ("order_eu".to_string(), vec![0, 2]),
                ("order_us".to_string(), vec![1]),
                ("order_ap".to_string(), vec![3]),
            ]
        );
    }

    #[test]
    fn missing_dependent_member() {
        let entity = EntityMap::builder("Order")
            .member(MemberMap::new("id", Type::I64).key())
            .build()
            .unwrap();
        let err = sharded_table_name(&by_region(), &entity, &MemberValues::new()).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
