use crate::{stmt::Value, Result};
use std::fmt::Debug;

/// Converts member values to and from their stored representation.
///
/// Attached to a [`MemberMap`](super::MemberMap); invoked whenever a value
/// assigned to, or compared with, that member is bound, and whenever the
/// member is read from a row.
pub trait TypeHandler: Debug + Send + Sync + 'static {
    fn to_db(&self, value: Value) -> Result<Value>;

    fn from_db(&self, value: Value) -> Result<Value>;
}
