use crate::{
    entity::entity_map,
    include::{distinct_keys, parent_keys, IncludeLoader},
    stmt::{check_page, Query, Select},
    Db, Entity, FromRow, PagedList, Participants, Result,
};
use skein_core::{
    driver::Response,
    schema::Schema,
    stmt::{self, Include, Primitive, Value},
    Error,
};
use skein_sql::{Command, Context, MultipleCommand};
use std::{any::Any, fmt, marker::PhantomData};

/// Several queries read in one round trip.
///
/// Each queued query returns a [`Handle`]. `execute` renders every query
/// into one batch, then hands the result sets to the queries in the order
/// they were queued. Queries with includes load them in a second round
/// trip on the same connection.
pub struct MultiQuery {
    db: Db,
    readers: Vec<Box<dyn ReaderAfter>>,
}

/// A queued query's result, taken from [`MultiResults`].
pub struct Handle<T> {
    index: usize,
    _p: PhantomData<fn() -> T>,
}

/// The results of a [`MultiQuery`].
pub struct MultiResults {
    values: Vec<Option<Box<dyn Any + Send>>>,
}

/// Several writes executed in one round trip.
pub struct MultiCommand {
    db: Db,
    commands: Vec<MultipleCommand>,
}

/// Reads one queued query's result sets from the shared response.
trait ReaderAfter: Send {
    /// Statements the query contributes to the primary round trip.
    fn statements(&self) -> usize;

    fn compile(&self, batch: &mut Batch<'_>) -> Result<Command>;

    /// Takes this query's result sets, in statement order.
    fn read(&mut self, response: &mut Response, schema: &Schema) -> Result<()>;

    /// True once rows are read and some include has parents to load for.
    fn has_pending_includes(&self) -> bool {
        false
    }

    fn include_command(&self, _batch: &mut Batch<'_>) -> Result<Command> {
        Err(Error::invalid_argument("query has no includes"))
    }

    fn graft(&mut self, _response: &mut Response, _schema: &Schema) -> Result<()> {
        Ok(())
    }

    fn finish(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// Hands out the context of each command of a batch. Commands of a batch
/// with more than one command get distinct parameter suffixes.
struct Batch<'a> {
    cx: &'a Context,
    numbered: bool,
    next: usize,
}

impl<'a> Batch<'a> {
    fn new(cx: &'a Context, commands: usize) -> Batch<'a> {
        Batch {
            cx,
            numbered: commands > 1,
            next: 0,
        }
    }

    fn next(&mut self) -> Context {
        if !self.numbered {
            return self.cx.clone();
        }
        let cx = self.cx.for_command(self.next);
        self.next += 1;
        cx
    }
}

impl MultiQuery {
    pub(crate) fn new(db: Db) -> MultiQuery {
        MultiQuery { db, readers: vec![] }
    }

    pub fn to_list<P: Participants>(&mut self, query: Query<P>) -> Handle<Vec<P::Root>> {
        self.push(EntityReader::new(query, Mode::List))
    }

    pub fn first<P: Participants>(&mut self, mut query: Query<P>) -> Handle<Option<P::Root>> {
        query.untyped.take(1);
        self.push(EntityReader::new(query, Mode::First))
    }

    pub fn count<P: Participants>(&mut self, query: Query<P>) -> Handle<i64> {
        self.push(CountReader {
            query: query.untyped,
            count: 0,
        })
    }

    /// The total row count and the `index`-th page of `size` rows.
    pub fn to_page_list<P: Participants>(
        &mut self,
        mut query: Query<P>,
        index: u64,
        size: u64,
    ) -> Result<Handle<PagedList<P::Root>>> {
        check_page(index, size)?;
        query.untyped.page(index, size);
        Ok(self.push(EntityReader::new(query, Mode::Page { index, size })))
    }

    pub fn select<R: FromRow>(&mut self, select: Select<R>) -> Handle<Vec<R>> {
        self.push(SelectReader::<R> {
            query: select.into_untyped(),
            items: vec![],
        })
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    fn push<T>(&mut self, reader: impl ReaderAfter + 'static) -> Handle<T> {
        self.readers.push(Box::new(reader));
        Handle {
            index: self.readers.len() - 1,
            _p: PhantomData,
        }
    }

    /// The primary round trip's command.
    pub fn to_sql(&self) -> Result<Command> {
        let statements = self.readers.iter().map(|reader| reader.statements()).sum();
        let mut batch = Batch::new(self.db.context(), statements);
        let mut commands = Vec::with_capacity(self.readers.len());
        for reader in &self.readers {
            commands.push(reader.compile(&mut batch)?);
        }
        Ok(Command::join(commands))
    }

    pub async fn execute(self) -> Result<MultiResults> {
        let command = self.to_sql()?;
        let MultiQuery { db, mut readers } = self;
        if readers.is_empty() {
            return Ok(MultiResults { values: vec![] });
        }
        db.check_batch(&command)?;

        tracing::debug!(
            queries = readers.len(),
            statements = command.statements,
            "multiple query"
        );

        let schema = db.schema();
        let mut connection = db.connection().await?;
        let mut response = connection.exec(command).await?;
        for reader in &mut readers {
            reader.read(&mut response, schema)?;
        }

        let pending = readers
            .iter()
            .enumerate()
            .filter(|(_, reader)| reader.has_pending_includes())
            .map(|(index, _)| index)
            .collect::<Vec<_>>();

        if !pending.is_empty() {
            let mut batch = Batch::new(db.context(), pending.len());
            let mut commands = Vec::with_capacity(pending.len());
            for index in &pending {
                commands.push(readers[*index].include_command(&mut batch)?);
            }
            let command = Command::join(commands);
            db.check_batch(&command)?;

            tracing::debug!(
                queries = pending.len(),
                statements = command.statements,
                "loading includes"
            );

            let mut response = connection.exec(command).await?;
            for index in pending {
                readers[index].graft(&mut response, schema)?;
            }
        }
        drop(connection);

        Ok(MultiResults {
            values: readers.into_iter().map(|reader| Some(reader.finish())).collect(),
        })
    }
}

impl MultiResults {
    pub fn take<T: 'static>(&mut self, handle: Handle<T>) -> Result<T> {
        let value = self
            .values
            .get_mut(handle.index)
            .and_then(Option::take)
            .ok_or_else(|| {
                Error::invalid_argument(format!("result {} was already taken", handle.index))
            })?;

        value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::invalid_argument("handle belongs to another multiple query"))
    }
}

impl MultiCommand {
    pub(crate) fn new(db: Db) -> MultiCommand {
        MultiCommand {
            db,
            commands: vec![],
        }
    }

    pub fn push(&mut self, command: impl Into<MultipleCommand>) -> &mut Self {
        self.commands.push(command.into());
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn to_sql(&self) -> Result<Command> {
        skein_sql::build_multi_command(self.db.context(), &self.commands)
    }

    /// Rows affected across every statement.
    pub async fn exec(self) -> Result<u64> {
        if self.commands.is_empty() {
            return Ok(0);
        }
        let command = self.to_sql()?;
        self.db.check_batch(&command)?;

        let response = self.db.connection().await?.exec(command).await?;
        Ok(response.total_count())
    }
}

enum Mode {
    List,
    First,
    Page { index: u64, size: u64 },
}

struct EntityReader<T: Entity> {
    query: stmt::Query,
    includes: Vec<Box<dyn IncludeLoader<T>>>,
    mode: Mode,
    items: Vec<T>,
    total_count: u64,
}

impl<T: Entity> EntityReader<T> {
    fn new<P: Participants<Root = T>>(query: Query<P>, mode: Mode) -> EntityReader<T> {
        EntityReader {
            query: query.untyped,
            includes: query.includes,
            mode,
            items: vec![],
            total_count: 0,
        }
    }
}

impl<T: Entity> ReaderAfter for EntityReader<T> {
    fn statements(&self) -> usize {
        match self.mode {
            Mode::Page { .. } => 2,
            Mode::List | Mode::First => 1,
        }
    }

    fn compile(&self, batch: &mut Batch<'_>) -> Result<Command> {
        let mut commands = Vec::with_capacity(2);
        if let Mode::Page { .. } = self.mode {
            commands.push(skein_sql::compile_count(&batch.next(), &self.query)?);
        }
        commands.push(skein_sql::compile_query(&batch.next(), &self.query)?);
        Ok(Command::join(commands))
    }

    fn read(&mut self, response: &mut Response, schema: &Schema) -> Result<()> {
        if let Mode::Page { .. } = self.mode {
            self.total_count = read_count(response)?.try_into()?;
        }

        let map = entity_map::<T>(schema)?;
        let rows = response.next_rows()?.into_values()?;
        self.items = rows
            .rows()
            .map(|row| T::load(row, &map))
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn has_pending_includes(&self) -> bool {
        !self.includes.is_empty() && !self.items.is_empty()
    }

    fn include_command(&self, batch: &mut Batch<'_>) -> Result<Command> {
        let keys = self
            .includes
            .iter()
            .map(|loader| distinct_keys(parent_keys(&self.items, loader.parent_key())))
            .collect::<Vec<_>>();
        let loads = self
            .query
            .includes
            .iter()
            .zip(&keys)
            .map(|(include, keys)| (include, keys.as_slice()))
            .collect::<Vec<(&Include, &[Value])>>();

        skein_sql::build_includes(&batch.next(), &loads)
    }

    fn graft(&mut self, response: &mut Response, schema: &Schema) -> Result<()> {
        for loader in &self.includes {
            loader.graft(&mut self.items, response, schema)?;
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Box<dyn Any + Send> {
        let EntityReader {
            mode,
            items,
            total_count,
            ..
        } = *self;

        match mode {
            Mode::List => Box::new(items),
            Mode::First => Box::new(items.into_iter().next()),
            Mode::Page { index, size } => Box::new(PagedList {
                items,
                page_index: index,
                page_size: size,
                total_count,
            }),
        }
    }
}

struct CountReader {
    query: stmt::Query,
    count: i64,
}

impl ReaderAfter for CountReader {
    fn statements(&self) -> usize {
        1
    }

    fn compile(&self, batch: &mut Batch<'_>) -> Result<Command> {
        skein_sql::compile_count(&batch.next(), &self.query)
    }

    fn read(&mut self, response: &mut Response, _schema: &Schema) -> Result<()> {
        self.count = read_count(response)?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Box<dyn Any + Send> {
        Box::new(self.count)
    }
}

struct SelectReader<R> {
    query: stmt::Query,
    items: Vec<R>,
}

impl<R: FromRow> ReaderAfter for SelectReader<R> {
    fn statements(&self) -> usize {
        1
    }

    fn compile(&self, batch: &mut Batch<'_>) -> Result<Command> {
        skein_sql::compile_query(&batch.next(), &self.query)
    }

    fn read(&mut self, response: &mut Response, schema: &Schema) -> Result<()> {
        let rows = response.next_rows()?.into_values()?;
        self.items = rows
            .rows()
            .map(|row| R::from_row(row, schema))
            .collect::<Result<_>>()?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Box<dyn Any + Send> {
        Box::new(self.items)
    }
}

fn read_count(response: &mut Response) -> Result<i64> {
    let rows = response.next_rows()?.into_values()?;
    i64::from_value(rows.scalar()?.clone())
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle").field(&self.index).finish()
    }
}

impl fmt::Debug for MultiQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiQuery")
            .field("queries", &self.readers.len())
            .finish()
    }
}

impl fmt::Debug for MultiResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remaining = self.values.iter().filter(|value| value.is_some()).count();
        f.debug_struct("MultiResults")
            .field("results", &self.values.len())
            .field("remaining", &remaining)
            .finish()
    }
}

impl fmt::Debug for MultiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiCommand")
            .field("commands", &self.commands)
            .finish()
    }
}
