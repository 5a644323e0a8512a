use super::{Error, ErrorKind};
use crate::stmt::Value;

/// A value whose variant does not fit the requested Rust or SQL type.
#[derive(Debug)]
pub(super) struct ConversionError {
    value: Value,
    target: &'static str,
}

impl std::error::Error for ConversionError {}

impl core::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let source = self.value.variant_name();
        write!(f, "cannot convert {source} to {}", self.target)
    }
}

impl Error {
    /// `to_type` names the target, e.g. a Rust type or `"number"`.
    pub fn type_conversion(value: Value, to_type: &'static str) -> Error {
        Error::from(ErrorKind::Conversion(ConversionError {
            value,
            target: to_type,
        }))
    }

    pub fn is_type_conversion(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conversion(_))
    }
}
