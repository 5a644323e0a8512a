use crate::Dialect;
use skein_core::schema::ShardingProvider;
use std::sync::Arc;

/// Everything a compile pass reads besides the statement itself.
#[derive(Debug, Clone)]
pub struct Context {
    pub dialect: Arc<dyn Dialect>,

    pub sharding: Option<Arc<dyn ShardingProvider>>,

    /// Rows per bulk insert round trip and keys per bulk delete statement
    pub bulk_count: usize,

    /// Alias of the first table; later tables count up from it
    pub table_as_start: char,

    /// Position within a multi-statement batch, which suffixes parameter
    /// names with `_m{index}`
    pub command_index: Option<usize>,
}

impl Context {
    pub const DEFAULT_BULK_COUNT: usize = 500;

    pub fn new(dialect: impl Dialect) -> Context {
        Context::from_arc(Arc::new(dialect))
    }

    pub fn from_arc(dialect: Arc<dyn Dialect>) -> Context {
        Context {
            dialect,
            sharding: None,
            bulk_count: Context::DEFAULT_BULK_COUNT,
            table_as_start: 'a',
            command_index: None,
        }
    }

    pub fn with_sharding(mut self, sharding: Arc<dyn ShardingProvider>) -> Context {
        self.sharding = Some(sharding);
        self
    }

    pub fn with_bulk_count(mut self, bulk_count: usize) -> Context {
        self.bulk_count = bulk_count.max(1);
        self
    }

    pub fn with_table_as_start(mut self, start: char) -> Context {
        self.table_as_start = start;
        self
    }

    /// A copy of the context for the `index`-th statement of a batch.
    pub fn for_command(&self, index: usize) -> Context {
        Context {
            command_index: Some(index),
            ..self.clone()
        }
    }

    pub(crate) fn command_suffix(&self) -> String {
        self.command_index
            .map(|index| format!("_m{index}"))
            .unwrap_or_default()
    }

    /// Alias for the table at `position` among all tables visible to a
    /// statement, including enclosing statements.
    pub(crate) fn table_alias(&self, position: usize) -> String {
        let start = self.table_as_start as u32;
        match char::from_u32(start + position as u32) {
            Some(alias) if alias.is_ascii_lowercase() => alias.to_string(),
            _ => format!("{}{position}", self.table_as_start),
        }
    }
}
