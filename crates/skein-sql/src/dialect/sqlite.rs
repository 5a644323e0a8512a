use super::{Dialect, IdentityFetch};
use skein_core::stmt::{Type, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn identity_sql(&self, _key_field: &str) -> IdentityFetch {
        IdentityFetch::Statement("SELECT last_insert_rowid()".to_string())
    }

    fn map_default_type(&self, ty: Type) -> &'static str {
        match ty {
            Type::Bool | Type::I32 | Type::I64 => "INTEGER",
            Type::F64 => "REAL",
            Type::String | Type::Uuid => "TEXT",
            Type::Bytes => "BLOB",
        }
    }

    fn auto_increment_column(&self, field: &str, _ty: Type) -> (String, bool) {
        (format!("{field} INTEGER PRIMARY KEY AUTOINCREMENT"), true)
    }

    fn parameter_value(&self, value: Value) -> Value {
        match value {
            Value::Uuid(id) => Value::String(id.to_string()),
            value => value,
        }
    }

    fn function(&self, name: &str, args: &[String]) -> Option<String> {
        match name {
            "now" => Some("CURRENT_TIMESTAMP".to_string()),
            "substring" => Some(format!("SUBSTR({})", args.join(","))),
            _ => super::default_function(name, args),
        }
    }

    fn paging(&self, offset: Option<u64>, limit: Option<u64>) -> String {
        match (offset, limit) {
            (Some(offset), None) => format!(" LIMIT -1 OFFSET {offset}"),
            (None, Some(limit)) => format!(" LIMIT {limit}"),
            (Some(offset), Some(limit)) => format!(" LIMIT {limit} OFFSET {offset}"),
            (None, None) => String::new(),
        }
    }
}
