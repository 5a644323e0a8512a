use super::{Expr, IntoExpr, Record};
use crate::{
    include::IncludeLoader, multi::MultiQuery, Db, Entity, FromRow, HasMany, JoinWith, PagedList,
    Participants, Result,
};
use skein_core::{
    stmt::{self, Cte, Direction, Join, JoinKind, OrderBy, TableBody, TableSource, Union, Value},
    Error,
};
use skein_sql::Command;
use std::{fmt, marker::PhantomData};

/// A `SELECT` reading rows into `P::Root`.
///
/// Every builder call appends to the query's intent; nothing is rendered
/// until a terminal (`to_list`, `count`, `to_sql`, ...) compiles it.
pub struct Query<P: Participants> {
    db: Db,
    pub(crate) untyped: stmt::Query,

    /// Loaders of `untyped.includes`, in the same order
    pub(crate) includes: Vec<Box<dyn IncludeLoader<P::Root>>>,

    _p: PhantomData<P>,
}

/// A query with a projection, reading each row into `R`.
pub struct Select<R> {
    db: Db,
    untyped: stmt::Query,
    _p: PhantomData<fn() -> R>,
}

impl<T: Entity> Query<T> {
    pub(crate) fn new(db: Db) -> Result<Query<T>> {
        let untyped = stmt::Query::new(db.entity_map::<T>()?);
        Ok(Query::from_untyped(db, untyped, vec![]))
    }

    /// Reads from this query as the common table expression `name`.
    ///
    /// Filters, ordering and paging added afterwards apply to the CTE's
    /// rows; includes move to the outer query.
    pub fn from_with(mut self, name: &str) -> Query<T> {
        let includes = std::mem::take(&mut self.untyped.includes);
        let entity = self.untyped.entity().clone();

        let mut outer = stmt::Query::new(entity.clone());
        outer.tables[0].body = Some(TableBody::Cte(name.to_string()));
        outer.ctes.push(Cte {
            name: name.to_string(),
            query: self.untyped,
        });
        outer.includes = includes;

        Query::from_untyped(self.db, outer, self.includes)
    }
}

impl<P: Participants> Query<P> {
    fn from_untyped(
        db: Db,
        untyped: stmt::Query,
        includes: Vec<Box<dyn IncludeLoader<P::Root>>>,
    ) -> Query<P> {
        Query {
            db,
            untyped,
            includes,
            _p: PhantomData,
        }
    }

    /// The fields of every participant, bound to this query's scope.
    pub fn fields(&self) -> P::Fields {
        P::fields(self.untyped.scope)
    }

    pub fn filter(mut self, f: impl FnOnce(P::Fields) -> Expr<bool>) -> Self {
        let expr = f(self.fields());
        self.untyped.filter.push(expr.untyped);
        self
    }

    pub fn join<N: Entity>(
        self,
        kind: JoinKind,
        on: impl FnOnce(<<P as JoinWith<N>>::Output as Participants>::Fields) -> Expr<bool>,
    ) -> Result<Query<<P as JoinWith<N>>::Output>>
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
        Ok(Query::from_untyped(self.db, untyped, self.includes))
    }

    pub fn inner_join<N: Entity>(
        self,
        on: impl FnOnce(<<P as JoinWith<N>>::Output as Participants>::Fields) -> Expr<bool>,
    ) -> Result<Query<<P as JoinWith<N>>::Output>>
    where
        P: JoinWith<N>,
    {
        self.join::<N>(JoinKind::Inner, on)
    }

    pub fn left_join<N: Entity>(
        self,
        on: impl FnOnce(<<P as JoinWith<N>>::Output as Participants>::Fields) -> Expr<bool>,
    ) -> Result<Query<<P as JoinWith<N>>::Output>>
    where
        P: JoinWith<N>,
    {
        self.join::<N>(JoinKind::Left, on)
    }

    pub fn order_by<V>(self, f: impl FnOnce(P::Fields) -> Expr<V>) -> Self {
        self.push_order_by(Direction::Asc, f)
    }

    pub fn order_by_desc<V>(self, f: impl FnOnce(P::Fields) -> Expr<V>) -> Self {
        self.push_order_by(Direction::Desc, f)
    }

    fn push_order_by<V>(mut self, direction: Direction, f: impl FnOnce(P::Fields) -> Expr<V>) -> Self {
        let expr = f(self.fields());
        self.untyped.order_by.push(OrderBy {
            expr: expr.untyped,
            direction,
        });
        self
    }

    pub fn group_by<V>(mut self, f: impl FnOnce(P::Fields) -> Expr<V>) -> Self {
        let expr = f(self.fields());
        self.untyped.group_by.push(expr.untyped);
        self
    }

    pub fn having(mut self, f: impl FnOnce(P::Fields) -> Expr<bool>) -> Self {
        let expr = f(self.fields());
        self.untyped.having.push(expr.untyped);
        self
    }

    /// Reads `table_name` instead of the root entity's table, bypassing
    /// any sharding rule.
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.untyped.tables[0].table_name = Some(table_name.into());
        self
    }

    pub fn distinct(mut self) -> Self {
        self.untyped.distinct = true;
        self
    }

    pub fn skip(mut self, n: u64) -> Self {
        self.untyped.skip(n);
        self
    }

    pub fn take(mut self, n: u64) -> Self {
        self.untyped.take(n);
        self
    }

    /// The `index`-th page of `size` rows, counting from 1.
    pub fn page(mut self, index: u64, size: u64) -> Result<Self> {
        check_page(index, size)?;
        self.untyped.page(index, size);
        Ok(self)
    }

    pub fn union(self, other: Query<P>) -> Self {
        self.push_union(false, other)
    }

    pub fn union_all(self, other: Query<P>) -> Self {
        self.push_union(true, other)
    }

    fn push_union(mut self, all: bool, other: Query<P>) -> Self {
        self.untyped.unions.push(Union {
            all,
            query: other.untyped,
        });
        self
    }

    /// Loads a navigation of the rows with a second statement.
    pub fn include<C: Entity + Clone>(mut self, navigation: HasMany<P::Root, C>) -> Result<Self> {
        let include = navigation.include(self.db.schema())?;
        self.untyped.includes.push(include);
        self.includes.push(Box::new(navigation));
        Ok(self)
    }

    /// Projects a single expression.
    pub fn select<V>(self, f: impl FnOnce(P::Fields) -> Expr<V>) -> Select<V> {
        let expr = f(self.fields());
        self.into_select(expr.untyped)
    }

    /// Projects member-labelled expressions read into `R`.
    pub fn select_record<R>(self, f: impl FnOnce(P::Fields) -> Record) -> Select<R> {
        let record = f(self.fields());
        self.into_select(record.into_untyped())
    }

    /// Projects one member of the root entity.
    pub fn select_field<V>(self, member: &str) -> Result<Select<V>> {
        self.untyped.entity().member_or_err(member)?;
        let column = stmt::Expr::column(self.untyped.scope, 0, member);
        Ok(self.into_select(column))
    }

    fn into_select<R>(mut self, projection: stmt::Expr) -> Select<R> {
        self.untyped.select = Some(projection);
        self.untyped.includes.clear();
        Select {
            db: self.db,
            untyped: self.untyped,
            _p: PhantomData,
        }
    }

    pub fn to_sql(&self) -> Result<Command> {
        skein_sql::compile_query(self.db.context(), &self.untyped)
    }

    pub fn to_count_sql(&self) -> Result<Command> {
        skein_sql::compile_count(self.db.context(), &self.untyped)
    }

    pub async fn to_list(self) -> Result<Vec<P::Root>> {
        let mut multi = MultiQuery::new(self.db.clone());
        let handle = multi.to_list(self);
        multi.execute().await?.take(handle)
    }

    pub async fn first(self) -> Result<Option<P::Root>> {
        let mut multi = MultiQuery::new(self.db.clone());
        let handle = multi.first(self);
        multi.execute().await?.take(handle)
    }

    /// The row whose single-member key equals `key`.
    pub async fn get(self, key: impl Into<Value>) -> Result<P::Root> {
        let key = key.into();
        let entity = self.untyped.entity().clone();
        let member = entity.single_key()?;

        let mut query = self;
        let column = stmt::Expr::column(query.untyped.scope, 0, member.member_name.as_str());
        query.untyped.filter.push(stmt::Expr::eq(column, key.clone()));

        query.first().await?.ok_or_else(|| {
            Error::record_not_found(format!("{} with key {key:?}", entity.name))
        })
    }

    pub async fn count(self) -> Result<i64> {
        let mut multi = MultiQuery::new(self.db.clone());
        let handle = multi.count(self);
        multi.execute().await?.take(handle)
    }

    /// The total row count and the `index`-th page, in one round trip.
    pub async fn to_page_list(self, index: u64, size: u64) -> Result<PagedList<P::Root>> {
        let mut multi = MultiQuery::new(self.db.clone());
        let handle = multi.to_page_list(self, index, size)?;
        multi.execute().await?.take(handle)
    }

    pub fn into_untyped(self) -> stmt::Query {
        self.untyped
    }
}

impl<R> Select<R> {
    pub fn to_sql(&self) -> Result<Command> {
        skein_sql::compile_query(self.db.context(), &self.untyped)
    }

    pub fn distinct(mut self) -> Self {
        self.untyped.distinct = true;
        self
    }

    pub fn into_untyped(self) -> stmt::Query {
        self.untyped
    }

    /// Used as a scalar sub-query.
    pub fn into_expr(self) -> Expr<R> {
        Expr::from_untyped(stmt::Expr::stmt(self.untyped))
    }
}

impl<R: FromRow> Select<R> {
    pub async fn to_list(self) -> Result<Vec<R>> {
        let mut multi = MultiQuery::new(self.db.clone());
        let handle = multi.select(self);
        multi.execute().await?.take(handle)
    }

    pub async fn first(mut self) -> Result<Option<R>> {
        self.untyped.take(1);
        Ok(self.to_list().await?.into_iter().next())
    }
}

impl<R> IntoExpr<R> for Select<R> {
    fn into_expr(self) -> Expr<R> {
        Select::into_expr(self)
    }
}

pub(crate) fn check_page(index: u64, size: u64) -> Result<()> {
    if index == 0 || size == 0 {
        return Err(Error::invalid_argument(format!(
            "page index and size start at 1; index={index}, size={size}"
        )));
    }
    let offset = (index - 1).checked_mul(size);
    if offset.map_or(true, |offset| offset > i64::MAX as u64) || size > i64::MAX as u64 {
        return Err(Error::invalid_argument(format!(
            "page {index} of size {size} is out of range"
        )));
    }
    Ok(())
}

impl<P: Participants> fmt::Debug for Query<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("untyped", &self.untyped)
            .field("includes", &self.includes.len())
            .finish()
    }
}

impl<R> fmt::Debug for Select<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select").field("untyped", &self.untyped).finish()
    }
}
