use super::Expr;
use crate::{Db, Entity, Result};
use skein_core::{
    stmt::{self, CommandSegment, Keys, MemberValues},
    Error,
};
use skein_sql::{Command, MultipleCommand};
use std::{fmt, marker::PhantomData};

/// A `DELETE` by predicate or by keys.
pub struct Delete<T> {
    db: Db,
    untyped: stmt::Delete,
    _p: PhantomData<fn() -> T>,
}

impl<T: Entity> Delete<T> {
    pub(crate) fn new(db: Db) -> Result<Delete<T>> {
        let untyped = stmt::Delete::new(db.entity_map::<T>()?);
        Ok(Delete {
            db,
            untyped,
            _p: PhantomData,
        })
    }

    pub fn fields(&self) -> T::Fields {
        T::fields(self.untyped.scope, 0)
    }

    pub fn filter(mut self, f: impl FnOnce(T::Fields) -> Expr<bool>) -> Self {
        let expr = f(self.fields()).untyped;
        let filtered = self
            .untyped
            .segments
            .iter()
            .any(|segment| matches!(segment, CommandSegment::Where(_)));

        self.untyped.segments.push(if filtered {
            CommandSegment::And(expr)
        } else {
            CommandSegment::Where(expr)
        });
        self
    }

    /// Matches rows by key value(s) or by member values. A key list is
    /// split into statements of `bulk_count` keys.
    pub fn where_key(mut self, keys: impl Into<Keys>) -> Self {
        self.untyped.segments.push(CommandSegment::WhereWith(keys.into()));
        self
    }

    /// Matches each of `rows` by its key members.
    pub fn remove<'a>(self, rows: impl IntoIterator<Item = &'a T>) -> Self {
        let entity = self.untyped.entity.clone();
        let keys = rows
            .into_iter()
            .map(|row| {
                let values = row.to_values();
                entity
                    .key_members()
                    .filter_map(|key| {
                        let value = values.get(&key.member_name)?.clone();
                        Some((key.member_name.clone(), value))
                    })
                    .collect::<MemberValues>()
            })
            .collect::<Vec<_>>();
        self.where_key(keys)
    }

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
        skein_sql::compile_delete(self.db.context(), &self.untyped)
    }

    /// Rows deleted.
    pub async fn exec(self) -> Result<u64> {
        let commands = self.to_sql()?;
        let responses = self.db.exec_all(commands).await?;
        Ok(responses.iter().map(|response| response.total_count()).sum())
    }

    pub fn into_untyped(self) -> stmt::Delete {
        self.untyped
    }
}

impl<T> From<Delete<T>> for MultipleCommand {
    fn from(value: Delete<T>) -> Self {
        MultipleCommand::Delete(value.untyped)
    }
}

impl<T> fmt::Debug for Delete<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delete").field("untyped", &self.untyped).finish()
    }
}
