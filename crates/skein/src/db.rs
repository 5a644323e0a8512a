mod builder;
pub use builder::Builder;

mod connect;

use crate::{
    entity::entity_map,
    multi::{MultiCommand, MultiQuery},
    stmt::{Create, Delete, Query, Update},
    Entity, Result,
};
use skein_core::{
    driver::{Capability, Connection, Driver, Operation, QuerySql, Response},
    schema::{EntityMap, Schema},
    Error,
};
use skein_sql::{Command, Context};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Shared state between all `Db` clones.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) cx: Context,
    pub(crate) schema: Schema,
    driver: Arc<dyn Driver>,

    /// Opened on first use and held for the life of the handle
    connection: Mutex<Option<Box<dyn Connection>>>,
}

/// A database handle.
///
/// Clones share one connection. An execution holds the connection from its
/// first round trip until its last result set is consumed, so executions on
/// the same handle never interleave.
#[derive(Debug, Clone)]
pub struct Db {
    pub(crate) shared: Arc<Shared>,
}

/// Exclusive use of the handle's connection.
pub(crate) struct ConnectionGuard<'a> {
    connection: MutexGuard<'a, Option<Box<dyn Connection>>>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn context(&self) -> &Context {
        &self.shared.cx
    }

    pub fn schema(&self) -> &Schema {
        &self.shared.schema
    }

    pub fn capability(&self) -> &'static Capability {
        self.shared.driver.capability()
    }

    /// The entity map of `T`, registered on first use.
    pub fn entity_map<T: Entity>(&self) -> Result<Arc<EntityMap>> {
        entity_map::<T>(&self.shared.schema)
    }

    pub fn query<T: Entity>(&self) -> Result<Query<T>> {
        Query::new(self.clone())
    }

    pub fn create<T: Entity>(&self) -> Result<Create<T>> {
        Create::new(self.clone())
    }

    pub fn update<T: Entity>(&self) -> Result<Update<T>> {
        Update::new(self.clone())
    }

    pub fn delete<T: Entity>(&self) -> Result<Delete<T>> {
        Delete::new(self.clone())
    }

    /// Several queries read in one round trip.
    pub fn multiple_query(&self) -> MultiQuery {
        MultiQuery::new(self.clone())
    }

    /// Several writes executed in one round trip.
    pub fn multiple_command(&self) -> MultiCommand {
        MultiCommand::new(self.clone())
    }

    /// Creates the tables of every registered entity that do not exist yet.
    pub async fn push_schema(&self) -> Result<()> {
        let mut connection = self.connection().await?;
        for entity in self.shared.schema.entities() {
            let sql = skein_sql::create_table(self.shared.cx.dialect.as_ref(), &entity);
            connection.execute(sql).await?;
        }
        Ok(())
    }

    pub async fn create_table<T: Entity>(&self) -> Result<()> {
        let entity = self.entity_map::<T>()?;
        let sql = skein_sql::create_table(self.shared.cx.dialect.as_ref(), &entity);
        self.connection().await?.execute(sql).await
    }

    /// Runs SQL with no parameters and no result rows.
    pub async fn exec_raw(&self, sql: impl Into<String>) -> Result<()> {
        self.connection().await?.execute(sql.into()).await
    }

    /// Waits for exclusive use of the connection, opening it first if
    /// needed.
    pub(crate) async fn connection(&self) -> Result<ConnectionGuard<'_>> {
        let mut connection = self.shared.connection.lock().await;
        if connection.is_none() {
            tracing::debug!(url = %self.shared.driver.url(), "opening connection");
            *connection = Some(self.shared.driver.connect().await?);
        }
        Ok(ConnectionGuard { connection })
    }

    /// Runs `commands` in order, one round trip each, on one connection.
    ///
    /// A failed round trip stops the run; earlier round trips stay applied.
    pub(crate) async fn exec_all(&self, commands: Vec<Command>) -> Result<Vec<Response>> {
        for command in &commands {
            self.check_batch(command)?;
        }

        let round_trips = commands.len();
        let mut connection = self.connection().await?;
        let mut responses = Vec::with_capacity(round_trips);
        for (index, command) in commands.into_iter().enumerate() {
            if round_trips > 1 {
                tracing::debug!(round_trip = index + 1, of = round_trips, "bulk chunk");
            }
            responses.push(connection.exec(command).await?);
        }
        Ok(responses)
    }

    /// Rejects a round trip of several statements against a driver that
    /// runs one statement at a time.
    pub(crate) fn check_batch(&self, command: &Command) -> Result<()> {
        if command.statements > 1 && !self.capability().multiple_statements {
            return Err(Error::unsupported_feature(format!(
                "driver for {} cannot run {} statements in one round trip",
                self.shared.driver.url(),
                command.statements
            )));
        }
        Ok(())
    }
}

impl ConnectionGuard<'_> {
    /// One round trip.
    pub(crate) async fn exec(&mut self, command: Command) -> Result<Response> {
        tracing::debug!(
            statements = command.statements,
            param_count = command.params.len(),
            "round trip"
        );
        let statements = command.statements;
        let response = self
            .connection()?
            .exec(Operation::QuerySql(QuerySql::from(command)))
            .await?;

        if response.len() != statements {
            return Err(Error::invalid_result(format!(
                "expected {statements} result sets, got {}",
                response.len()
            )));
        }
        Ok(response)
    }

    async fn execute(&mut self, sql: String) -> Result<()> {
        tracing::debug!(%sql, "execute");
        self.connection()?.exec(Operation::Execute(sql)).await?;
        Ok(())
    }

    fn connection(&mut self) -> Result<&mut Box<dyn Connection>> {
        self.connection
            .as_mut()
            .ok_or_else(|| Error::invalid_argument("connection is closed"))
    }
}
