use super::Type;

/// A value bound as a statement parameter or read from a result row.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Bool(bool),

    /// Signed 32-bit integer
    I32(i32),

    /// Signed 64-bit integer
    I64(i64),

    /// 64-bit floating point number
    F64(f64),

    /// String value
    String(String),

    /// Binary value
    Bytes(Vec<u8>),

    /// UUID value
    Uuid(uuid::Uuid),

    /// A list of values, expanded into one parameter per item when bound
    List(Vec<Value>),
}

impl Value {
    pub const fn null() -> Self {
        Self::Null
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// True for integer and floating point values.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::I32(_) | Self::I64(_) | Self::F64(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::I32(v) => Some(v as i64),
            Self::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::I32(v) => Some(v as f64),
            Self::I64(v) => Some(v as f64),
            Self::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            Self::I32(v) => Some(v != 0),
            Self::I64(v) => Some(v != 0),
            _ => None,
        }
    }

    /// The type this value carries, `None` for null and lists.
    pub fn ty(&self) -> Option<Type> {
        Some(match self {
            Self::Bool(_) => Type::Bool,
            Self::I32(_) => Type::I32,
            Self::I64(_) => Type::I64,
            Self::F64(_) => Type::F64,
            Self::String(_) => Type::String,
            Self::Bytes(_) => Type::Bytes,
            Self::Uuid(_) => Type::Uuid,
            Self::Null | Self::List(_) => return None,
        })
    }

    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::I32(_) => "I32",
            Self::I64(_) => "I64",
            Self::F64(_) => "F64",
            Self::String(_) => "String",
            Self::Bytes(_) => "Bytes",
            Self::Uuid(_) => "Uuid",
            Self::List(_) => "List",
        }
    }

    /// Coerces a value read from the database into the member's declared
    /// type. Drivers that store booleans and ids as integers or text rely on
    /// this when materializing rows.
    pub fn cast(self, ty: &Type) -> crate::Result<Value> {
        Ok(match (self, ty) {
            (Value::Null, _) => Value::Null,
            (Value::I64(v), Type::Bool) => Value::Bool(v != 0),
            (Value::I32(v), Type::Bool) => Value::Bool(v != 0),
            (Value::I64(v), Type::I32) => Value::I32(i32::try_from(v)?),
            (Value::I32(v), Type::I64) => Value::I64(v as i64),
            (Value::I64(v), Type::F64) => Value::F64(v as f64),
            (Value::I32(v), Type::F64) => Value::F64(v as f64),
            (Value::String(v), Type::Uuid) => Value::Uuid(v.parse()?),
            (Value::Bytes(v), Type::Uuid) => Value::Uuid(uuid::Uuid::from_slice(&v)?),
            (value, ty) if value.ty().as_ref() == Some(ty) => value,
            (value, _) => return Err(crate::Error::type_conversion(value, ty.name())),
        })
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::F64(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<uuid::Uuid> for Value {
    fn from(value: uuid::Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Self::Null,
        }
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::List(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_integer_to_bool() {
        assert_eq!(Value::I64(1).cast(&Type::Bool).unwrap(), Value::Bool(true));
        assert_eq!(Value::I64(0).cast(&Type::Bool).unwrap(), Value::Bool(false));
    }

    #[test]
    fn cast_narrows_integers() {
        assert_eq!(Value::I64(7).cast(&Type::I32).unwrap(), Value::I32(7));
        assert!(Value::I64(i64::MAX).cast(&Type::I32).is_err());
    }

    #[test]
    fn cast_text_to_uuid() {
        let id = uuid::Uuid::new_v4();
        let value = Value::String(id.to_string()).cast(&Type::Uuid).unwrap();
        assert_eq!(value, Value::Uuid(id));
    }

    #[test]
    fn cast_mismatch_is_type_conversion() {
        let err = Value::String("x".into()).cast(&Type::I64).unwrap_err();
        assert!(err.is_type_conversion());
        assert_eq!(err.to_string(), "cannot convert String to I64");
    }
}
