use super::{Dialect, IdentityFetch, UpdateJoinStyle};
use skein_core::stmt::{Type, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct Mysql;

impl Dialect for Mysql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn identity_sql(&self, _key_field: &str) -> IdentityFetch {
        IdentityFetch::Statement("SELECT LAST_INSERT_ID()".to_string())
    }

    fn map_default_type(&self, ty: Type) -> &'static str {
        match ty {
            Type::Bool => "TINYINT(1)",
            Type::I32 => "INT",
            Type::I64 => "BIGINT",
            Type::F64 => "DOUBLE",
            Type::String => "VARCHAR(255)",
            Type::Bytes => "BLOB",
            Type::Uuid => "CHAR(36)",
        }
    }

    fn auto_increment_column(&self, field: &str, ty: Type) -> (String, bool) {
        (
            format!("{field} {} NOT NULL AUTO_INCREMENT", self.map_default_type(ty)),
            false,
        )
    }

    fn parameter_value(&self, value: Value) -> Value {
        match value {
            Value::Uuid(id) => Value::String(id.to_string()),
            value => value,
        }
    }

    fn function(&self, name: &str, args: &[String]) -> Option<String> {
        match name {
            "length" => Some(format!("CHAR_LENGTH({})", args.join(","))),
            "now" => Some("NOW()".to_string()),
            "substring" => Some(format!("SUBSTRING({})", args.join(","))),
            _ => super::default_function(name, args),
        }
    }

    fn concat(&self, parts: &[String]) -> String {
        format!("CONCAT({})", parts.join(","))
    }

    fn paging(&self, offset: Option<u64>, limit: Option<u64>) -> String {
        match (offset, limit) {
            (None, None) => String::new(),
            (None, Some(limit)) => format!(" LIMIT {limit}"),
            (Some(offset), Some(limit)) => format!(" LIMIT {offset},{limit}"),
            (Some(offset), None) => format!(" LIMIT {offset},{}", u64::MAX),
        }
    }

    fn upsert(&self, _conflict_fields: &[String], assignments: &[String]) -> String {
        format!(" ON DUPLICATE KEY UPDATE {}", assignments.join(","))
    }

    fn update_join_style(&self) -> UpdateJoinStyle {
        UpdateJoinStyle::Join
    }
}
