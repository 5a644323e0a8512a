use super::{Dialect, IdentityFetch};
use skein_core::stmt::Type;

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgresql;

impl Dialect for Postgresql {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn identity_sql(&self, key_field: &str) -> IdentityFetch {
        IdentityFetch::Returning(format!(" RETURNING {key_field}"))
    }

    fn map_default_type(&self, ty: Type) -> &'static str {
        match ty {
            Type::Bool => "BOOLEAN",
            Type::I32 => "INTEGER",
            Type::I64 => "BIGINT",
            Type::F64 => "DOUBLE PRECISION",
            Type::String => "TEXT",
            Type::Bytes => "BYTEA",
            Type::Uuid => "UUID",
        }
    }

    fn auto_increment_column(&self, field: &str, ty: Type) -> (String, bool) {
        let serial = if ty == Type::I32 { "SERIAL" } else { "BIGSERIAL" };
        (format!("{field} {serial}"), false)
    }

    fn function(&self, name: &str, args: &[String]) -> Option<String> {
        match name {
            "now" => Some("NOW()".to_string()),
            "substring" => Some(format!("SUBSTRING({})", args.join(","))),
            _ => super::default_function(name, args),
        }
    }
}
