mod value;
pub(crate) use value::Value;

use rusqlite::{Batch, Connection as RusqliteConnection};
use skein_core::{
    async_trait,
    driver::{Capability, Driver, Operation, Param, QuerySql, Response, Rows},
    stmt::ResultSet,
    Error, Result,
};
use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};
use url::Url;

#[derive(Debug)]
pub enum Sqlite {
    File(PathBuf),
    InMemory,
}

impl Sqlite {
    /// Create a new SQLite driver from a `sqlite:` connection URL
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url_str = url.into();
        let url = Url::parse(&url_str).map_err(Error::driver_operation_failed)?;

        if url.scheme() != "sqlite" {
            return Err(Error::invalid_argument(format!(
                "connection URL does not have a `sqlite` scheme; url={url_str}"
            )));
        }

        if url.path() == ":memory:" {
            Ok(Self::InMemory)
        } else {
            Ok(Self::File(PathBuf::from(url.path())))
        }
    }

    /// Create an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Open a SQLite database at the specified file path
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }
}

#[async_trait]
impl Driver for Sqlite {
    fn url(&self) -> Cow<'_, str> {
        match self {
            Sqlite::InMemory => Cow::Borrowed("sqlite::memory:"),
            Sqlite::File(path) => Cow::Owned(format!("sqlite:{}", path.display())),
        }
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn skein_core::Connection>> {
        let connection = match self {
            Sqlite::File(path) => Connection::open(path)?,
            Sqlite::InMemory => Connection::in_memory()?,
        };
        Ok(Box::new(connection))
    }
}

#[derive(Debug)]
pub struct Connection {
    connection: RusqliteConnection,
}

impl Connection {
    pub fn in_memory() -> Result<Self> {
        let connection =
            RusqliteConnection::open_in_memory().map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = RusqliteConnection::open(path).map_err(Error::driver_operation_failed)?;
        Ok(Self { connection })
    }

    /// Runs every statement of a batch, binding parameters by name.
    fn query_sql(&mut self, op: &QuerySql) -> Result<Response> {
        tracing::trace!(sql = %op.sql, param_count = op.params.len(), "sqlite exec");

        let mut response = Response::default();
        let mut batch = Batch::new(&self.connection, &op.sql);

        while let Some(mut stmt) = batch.next().map_err(Error::driver_operation_failed)? {
            for index in 1..=stmt.parameter_count() {
                let Some(name) = stmt.parameter_name(index) else {
                    return Err(Error::invalid_argument(format!(
                        "positional parameter #{index} cannot be bound by name"
                    )));
                };
                let value = find_param(&op.params, name)?;
                stmt.raw_bind_parameter(index, Value::from(value.clone()))
                    .map_err(Error::driver_operation_failed)?;
            }

            if stmt.column_count() == 0 {
                let count = stmt.raw_execute().map_err(Error::driver_operation_failed)?;
                response.push(Rows::Count(count as u64));
                continue;
            }

            let columns = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>();
            let width = columns.len();
            let mut set = ResultSet::new(columns);

            let mut rows = stmt.raw_query();
            while let Some(row) = rows.next().map_err(Error::driver_operation_failed)? {
                let mut items = Vec::with_capacity(width);
                for index in 0..width {
                    items.push(Value::from_sql(row, index)?.into_inner());
                }
                set.rows.push(items);
            }

            response.push(Rows::Values(set));
        }

        Ok(response)
    }
}

/// The value bound to a placeholder such as `@name`.
fn find_param<'a>(params: &'a [Param], placeholder: &str) -> Result<&'a skein_core::stmt::Value> {
    let name = placeholder.trim_start_matches(['@', ':', '$']);
    params
        .iter()
        .find(|param| param.name == name)
        .map(|param| &param.value)
        .ok_or_else(|| Error::invalid_argument(format!("no value bound to `{placeholder}`")))
}

#[async_trait]
impl skein_core::driver::Connection for Connection {
    async fn exec(&mut self, op: Operation) -> Result<Response> {
        match op {
            Operation::QuerySql(op) => self.query_sql(&op),
            Operation::Execute(sql) => {
                tracing::trace!(%sql, "sqlite execute");
                self.connection
                    .execute_batch(&sql)
                    .map_err(Error::driver_operation_failed)?;
                Ok(Response::count(0))
            }
        }
    }
}
