use super::{connect, Db, Shared};
use crate::{Entity, Result};
use skein_core::{
    driver::Driver,
    schema::{EntityMap, EntityMapBuilder, Schema, ShardingProvider},
};
use skein_sql::{Context, Dialect};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct Builder {
    /// Entity maps declared by `register`, validated in `build`
    entities: Vec<Result<EntityMap>>,

    table_name_prefix: Option<String>,

    dialect: Option<Arc<dyn Dialect>>,

    sharding: Option<Arc<dyn ShardingProvider>>,

    bulk_count: Option<usize>,

    table_as_start: Option<char>,
}

impl Builder {
    pub fn register<T: Entity>(&mut self) -> &mut Self {
        self.entities.push(T::entity_map());
        self
    }

    /// Registers `T` with its declared mapping adjusted by `f`, for member
    /// options the declaration does not carry: column names, ignored and
    /// row version members, type handlers.
    pub fn register_with<T: Entity>(
        &mut self,
        f: impl FnOnce(EntityMapBuilder) -> Result<EntityMapBuilder>,
    ) -> &mut Self {
        self.entities
            .push(f(T::entity_map_builder()).and_then(EntityMapBuilder::build));
        self
    }

    /// Set the table name prefix for all tables
    pub fn table_name_prefix(&mut self, prefix: &str) -> &mut Self {
        self.table_name_prefix = Some(prefix.to_string());
        self
    }

    /// Overrides the dialect otherwise picked from the driver URL scheme.
    pub fn dialect(&mut self, dialect: impl Dialect) -> &mut Self {
        self.dialect = Some(Arc::new(dialect));
        self
    }

    pub fn sharding(&mut self, sharding: impl ShardingProvider) -> &mut Self {
        self.sharding = Some(Arc::new(sharding));
        self
    }

    /// Rows per bulk insert round trip and keys per bulk delete statement.
    pub fn bulk_count(&mut self, bulk_count: usize) -> &mut Self {
        self.bulk_count = Some(bulk_count);
        self
    }

    /// Alias of the first table of every statement.
    pub fn table_as_start(&mut self, start: char) -> &mut Self {
        self.table_as_start = Some(start);
        self
    }

    pub async fn connect(&mut self, url: &str) -> Result<Db> {
        self.build(connect::driver(url)?).await
    }

    pub async fn build(&mut self, driver: impl Driver) -> Result<Db> {
        let schema = Schema::new(self.table_name_prefix.clone());
        for entity in self.entities.drain(..) {
            schema.register(entity?);
        }

        let dialect = match &self.dialect {
            Some(dialect) => dialect.clone(),
            None => connect::dialect(&driver.url())?,
        };

        let mut cx = Context::from_arc(dialect);
        if let Some(sharding) = &self.sharding {
            cx = cx.with_sharding(sharding.clone());
        }
        if let Some(bulk_count) = self.bulk_count {
            cx = cx.with_bulk_count(bulk_count);
        }
        if let Some(start) = self.table_as_start {
            cx = cx.with_table_as_start(start);
        }

        tracing::debug!(
            url = %driver.url(),
            dialect = cx.dialect.name(),
            entities = schema.len(),
            "database handle built"
        );

        Ok(Db {
            shared: Arc::new(Shared {
                cx,
                schema,
                driver: Arc::new(driver),
                connection: Mutex::new(None),
            }),
        })
    }
}
