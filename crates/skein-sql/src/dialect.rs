mod mysql;
pub use mysql::Mysql;

mod postgresql;
pub use postgresql::Postgresql;

mod sqlite;
pub use sqlite::Sqlite;

use skein_core::stmt::{Type, Value};
use std::fmt::Debug;

/// How the generated key of an insert is read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityFetch {
    /// A second statement appended after the insert
    Statement(String),

    /// A clause appended to the insert itself
    Returning(String),
}

/// Where the extra tables of a multi-table update go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateJoinStyle {
    /// `UPDATE t a INNER JOIN u b ON ... SET a.x=...`
    Join,

    /// `UPDATE t AS a SET x=... FROM u b WHERE ...`
    From,
}

/// The SQL flavor differences the visitors delegate.
///
/// Identifiers never reach the SQL text without passing through
/// [`Dialect::table_name`] or [`Dialect::field_name`].
pub trait Dialect: Debug + Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Quotes an identifier.
    fn quote(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn table_name(&self, name: &str) -> String {
        self.quote(name)
    }

    fn field_name(&self, name: &str) -> String {
        self.quote(name)
    }

    fn parameter_prefix(&self) -> &'static str {
        "@"
    }

    /// Reads back the key generated for `key_field` by the last insert.
    fn identity_sql(&self, key_field: &str) -> IdentityFetch;

    /// Column type used when creating tables.
    fn map_default_type(&self, ty: Type) -> &'static str;

    /// Column definition of an auto-increment key. The flag is true when the
    /// definition already declares the primary key.
    fn auto_increment_column(&self, field: &str, ty: Type) -> (String, bool);

    /// Converts a value right before it is bound.
    fn parameter_value(&self, value: Value) -> Value {
        value
    }

    /// Renders a function call, or `None` when the function has no mapping.
    fn function(&self, name: &str, args: &[String]) -> Option<String> {
        default_function(name, args)
    }

    fn concat(&self, parts: &[String]) -> String {
        parts.join("||")
    }

    /// `LIMIT`/`OFFSET` clause, including its leading space.
    fn paging(&self, offset: Option<u64>, limit: Option<u64>) -> String {
        match (offset, limit) {
            (None, None) => String::new(),
            (None, Some(limit)) => format!(" LIMIT {limit}"),
            (Some(offset), Some(limit)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (Some(offset), None) => format!(" OFFSET {offset}"),
        }
    }

    /// Conflict clause of an upsert, including its leading space.
    fn upsert(&self, conflict_fields: &[String], assignments: &[String]) -> String {
        format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            conflict_fields.join(","),
            assignments.join(",")
        )
    }

    fn update_join_style(&self) -> UpdateJoinStyle {
        UpdateJoinStyle::From
    }

    /// Inline rendering of a numeric constant.
    fn literal(&self, value: &Value) -> Option<String> {
        match value {
            Value::I32(v) => Some(v.to_string()),
            Value::I64(v) => Some(v.to_string()),
            Value::F64(v) if v.is_finite() => Some(format!("{v:?}")),
            _ => None,
        }
    }
}

pub(crate) fn default_function(name: &str, args: &[String]) -> Option<String> {
    let call = |f: &str| format!("{f}({})", args.join(","));

    Some(match name {
        "count" if args.is_empty() => "COUNT(*)".to_string(),
        "count" => call("COUNT"),
        "count_distinct" => format!("COUNT(DISTINCT {})", args.join(",")),
        "sum" => call("SUM"),
        "avg" => call("AVG"),
        "max" => call("MAX"),
        "min" => call("MIN"),
        "upper" => call("UPPER"),
        "lower" => call("LOWER"),
        "length" => call("LENGTH"),
        "trim" => call("TRIM"),
        "coalesce" => call("COALESCE"),
        "abs" => call("ABS"),
        "round" => call("ROUND"),
        _ => return None,
    })
}
