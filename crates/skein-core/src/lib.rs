pub mod driver;
pub use driver::{Connection, Driver};

mod error;
pub use error::{Error, IntoError};

pub mod schema;
pub use schema::Schema;

pub mod stmt;

pub use async_trait::async_trait;

pub type Result<T, E = Error> = core::result::Result<T, E>;
