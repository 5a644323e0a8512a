use super::{Assignment, Select};
use crate::{Db, Entity, Result};
use skein_core::{
    stmt::{self, CommandSegment, InsertSource, MemberValues, Primitive, Upsert},
    Error,
};
use skein_sql::{Command, MultipleCommand};
use std::{fmt, marker::PhantomData};

/// An `INSERT` of one row, many rows, or the rows of a query.
pub struct Create<T> {
    db: Db,
    untyped: stmt::Insert,
    _p: PhantomData<fn() -> T>,
}

impl<T: Entity> Create<T> {
    pub(crate) fn new(db: Db) -> Result<Create<T>> {
        let untyped = stmt::Insert::new(db.entity_map::<T>()?);
        Ok(Create {
            db,
            untyped,
            _p: PhantomData,
        })
    }

    pub fn fields(&self) -> T::Fields {
        T::fields(self.untyped.scope, 0)
    }

    /// Inserts the members of `entity`.
    pub fn with(mut self, entity: &T) -> Self {
        self.untyped
            .segments
            .push(CommandSegment::WithBy(InsertSource::One(entity.to_values())));
        self
    }

    /// Inserts a partial row. A collection of rows is rejected when the
    /// insert compiles; use [`Create::bulk_values`] instead.
    pub fn with_values(mut self, values: impl Into<InsertSource>) -> Self {
        self.untyped.segments.push(CommandSegment::WithBy(values.into()));
        self
    }

    /// Sets one member, overriding the value of an earlier `with`.
    pub fn set(mut self, f: impl FnOnce(T::Fields) -> Assignment) -> Result<Self> {
        let assignment = f(self.fields());
        self.untyped.segments.push(CommandSegment::WithByField {
            member: assignment.member?,
            value: assignment.value,
        });
        Ok(self)
    }

    pub fn bulk<'a>(self, rows: impl IntoIterator<Item = &'a T>) -> Result<Self> {
        self.bulk_values(rows.into_iter().map(Entity::to_values).collect())
    }

    /// Inserts many rows, `bulk_count` rows per round trip.
    pub fn bulk_values(mut self, rows: Vec<MemberValues>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::invalid_argument("bulk insert has no rows"));
        }
        self.untyped.segments.push(CommandSegment::WithBulk(rows));
        Ok(self)
    }

    /// Inserts the rows of a query whose projection labels are members of
    /// `T`.
    pub fn from_query<R>(mut self, query: Select<R>) -> Self {
        self.untyped.from_query = Some(Box::new(query.into_untyped()));
        self
    }

    /// On a key conflict, assigns these members of the existing row instead.
    pub fn on_conflict_update(
        mut self,
        f: impl FnOnce(T::Fields) -> Vec<Assignment>,
    ) -> Result<Self> {
        let record = Assignment::into_record(f(self.fields()))?;
        self.untyped.upsert = Some(Upsert::Record(record.into()));
        Ok(self)
    }

    pub fn on_conflict_update_values(mut self, values: MemberValues) -> Self {
        self.untyped.upsert = Some(Upsert::Values(values));
        self
    }

    pub fn only_fields(mut self, members: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.untyped.fields.only(members);
        self
    }

    pub fn ignore_fields(mut self, members: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.untyped.fields.ignore(members);
        self
    }

    /// Writes to `table_name` instead of the entity's table.
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.untyped.table_name = Some(table_name.into());
        self
    }

    pub fn bulk_count(mut self, bulk_count: usize) -> Result<Self> {
        if bulk_count == 0 {
            return Err(Error::invalid_argument("bulk count must be at least 1"));
        }
        self.untyped.bulk_count = Some(bulk_count);
        Ok(self)
    }

    /// One command per round trip.
    pub fn to_sql(&self) -> Result<Vec<Command>> {
        skein_sql::compile_insert(self.db.context(), &self.untyped)
    }

    /// Rows inserted.
    pub async fn exec(self) -> Result<u64> {
        let commands = self.to_sql()?;
        let responses = self.db.exec_all(commands).await?;
        Ok(responses.iter().map(|response| response.total_count()).sum())
    }

    /// Inserts one row and returns its generated key.
    pub async fn exec_identity(mut self) -> Result<i64> {
        self.untyped.return_identity = true;
        let commands = self.to_sql()?;
        let mut responses = self.db.exec_all(commands).await?;

        let identity = responses
            .pop()
            .and_then(|mut response| response.results.pop_back())
            .ok_or_else(|| Error::invalid_result("insert returned no identity"))?
            .into_values()?;
        i64::from_value(identity.scalar()?.clone())
    }

    pub fn into_untyped(self) -> stmt::Insert {
        self.untyped
    }
}

impl<T> From<Create<T>> for MultipleCommand {
    fn from(value: Create<T>) -> Self {
        MultipleCommand::Insert(value.untyped)
    }
}

impl<T> fmt::Debug for Create<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Create").field("untyped", &self.untyped).finish()
    }
}
