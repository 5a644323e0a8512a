use super::{member_of, Assignment, Expr, Select};
use crate::{Db, Entity, JoinWith, Participants, Result};
use skein_core::{
    stmt::{self, CommandSegment, Join, JoinKind, Keys, MemberValues, TableSource},
    Error,
};
use skein_sql::{Command, MultipleCommand};
use std::{fmt, marker::PhantomData};

/// An `UPDATE` of `P::Root`, optionally joined with other entities whose
/// members the assignments and filters may read.
pub struct Update<P: Participants> {
    db: Db,
    untyped: stmt::Update,
    _p: PhantomData<P>,
}

impl<T: Entity> Update<T> {
    pub(crate) fn new(db: Db) -> Result<Update<T>> {
        let untyped = stmt::Update::new(db.entity_map::<T>()?);
        Ok(Update {
            db,
            untyped,
            _p: PhantomData,
        })
    }
}

impl<P: Participants> Update<P> {
    pub fn fields(&self) -> P::Fields {
        P::fields(self.untyped.scope)
    }

    pub fn join<N: Entity>(
        self,
        kind: JoinKind,
        on: impl FnOnce(<<P as JoinWith<N>>::Output as Participants>::Fields) -> Expr<bool>,
    ) -> Result<Update<<P as JoinWith<N>>::Output>>
    where
        P: JoinWith<N>,
    {
        let entity = self.db.entity_map::<N>()?;
        let on = on(<<P as JoinWith<N>>::Output as Participants>::fields(
            self.untyped.scope,
        ));

        let mut untyped = self.untyped;
        untyped.tables.push(TableSource {
            join: Some(Join {
                kind,
                on: on.untyped,
            }),
            ..TableSource::new(entity)
        });
        untyped.need_table_alias = true;

        Ok(Update {
            db: self.db,
            untyped,
            _p: PhantomData,
        })
    }

    /// Assigns several members. Assigning a member to itself is skipped.
    pub fn set(mut self, f: impl FnOnce(P::Fields) -> Vec<Assignment>) -> Result<Self> {
        let record: stmt::Expr = Assignment::into_record(f(self.fields()))?.into();

        // Values read from joined tables render as `SET ... FROM`.
        let mut reads_join = false;
        record.walk(&mut |expr| {
            reads_join |= expr.as_column().is_some_and(|column| column.table > 0)
        });

        self.untyped.push(if reads_join {
            CommandSegment::SetFrom(record)
        } else {
            CommandSegment::Set(record)
        });
        Ok(self)
    }

    pub fn set_field(mut self, f: impl FnOnce(P::Fields) -> Assignment) -> Result<Self> {
        let assignment = f(self.fields());
        self.untyped.push(CommandSegment::SetField {
            member: assignment.member?,
            value: assignment.value,
        });
        Ok(self)
    }

    /// Assigns a member from a scalar sub-query, which may read the
    /// updated row through the fields passed to `f`.
    pub fn set_query<V>(mut self, f: impl FnOnce(P::Fields) -> (Expr<V>, Select<V>)) -> Result<Self> {
        let (target, query) = f(self.fields());
        self.untyped.push(CommandSegment::SetFromField {
            member: member_of(&target)?,
            query: query.into_untyped(),
        });
        Ok(self)
    }

    /// Assigns the updatable members of `entity`, matching its key (and its
    /// row version, when mapped).
    pub fn set_with(mut self, entity: &P::Root) -> Self {
        self.untyped.push(CommandSegment::SetWith(entity.to_values()));
        self
    }

    /// Updates each row by its key, one statement per row in one round
    /// trip.
    pub fn bulk<'a>(mut self, rows: impl IntoIterator<Item = &'a P::Root>) -> Result<Self> {
        let rows = rows.into_iter().map(Entity::to_values).collect::<Vec<MemberValues>>();
        if rows.is_empty() {
            return Err(Error::invalid_argument("bulk update has no rows"));
        }
        self.untyped.push(CommandSegment::SetBulk(rows));
        Ok(self)
    }

    pub fn filter(mut self, f: impl FnOnce(P::Fields) -> Expr<bool>) -> Self {
        let expr = f(self.fields()).untyped;
        let filtered = self
            .untyped
            .segments
            .iter()
            .any(|segment| matches!(segment, CommandSegment::Where(_)));

        self.untyped.push(if filtered {
            CommandSegment::And(expr)
        } else {
            CommandSegment::Where(expr)
        });
        self
    }

    /// Matches rows by key value(s) or by member values.
    pub fn where_key(mut self, keys: impl Into<Keys>) -> Result<Self> {
        let keys = keys.into();
        if keys.is_empty() {
            return Err(Error::invalid_argument("no keys to match"));
        }
        self.untyped.push(CommandSegment::WhereWith(keys));
        Ok(self)
    }

    /// Writes to `table_name` instead of the entity's table, bypassing any
    /// sharding rule.
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.untyped.tables[0].table_name = Some(table_name.into());
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

    pub fn to_sql(&self) -> Result<Command> {
        skein_sql::compile_update(self.db.context(), &self.untyped)
    }

    /// Rows updated.
    pub async fn exec(self) -> Result<u64> {
        let command = self.to_sql()?;
        let responses = self.db.exec_all(vec![command]).await?;
        Ok(responses.iter().map(|response| response.total_count()).sum())
    }

    pub fn into_untyped(self) -> stmt::Update {
        self.untyped
    }
}

impl<P: Participants> From<Update<P>> for MultipleCommand {
    fn from(value: Update<P>) -> Self {
        MultipleCommand::Update(value.untyped)
    }
}

impl<P: Participants> fmt::Debug for Update<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update").field("untyped", &self.untyped).finish()
    }
}
