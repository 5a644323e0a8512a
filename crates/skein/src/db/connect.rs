use crate::Result;
use skein_core::{driver::Driver, Error};
use skein_sql::{Dialect, Mysql, Postgresql, Sqlite};
use std::sync::Arc;
use url::Url;

/// The built-in driver for a connection URL.
pub(super) fn driver(url: &str) -> Result<impl Driver> {
    let parsed = parse(url)?;
    match parsed.scheme() {
        "sqlite" => connect_sqlite(url),
        scheme => Err(Error::invalid_argument(format!(
            "unsupported database; scheme={scheme}; url={url}"
        ))),
    }
}

/// The dialect matching a connection URL's scheme.
pub(super) fn dialect(url: &str) -> Result<Arc<dyn Dialect>> {
    match parse(url)?.scheme() {
        "sqlite" => Ok(Arc::new(Sqlite)),
        "postgres" | "postgresql" => Ok(Arc::new(Postgresql)),
        "mysql" => Ok(Arc::new(Mysql)),
        scheme => Err(Error::invalid_argument(format!(
            "no dialect for scheme `{scheme}`; set one on the builder"
        ))),
    }
}

fn parse(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|err| Error::invalid_argument(format!("invalid url `{url}`: {err}")))
}

#[cfg(feature = "sqlite")]
fn connect_sqlite(url: &str) -> Result<skein_driver_sqlite::Sqlite> {
    skein_driver_sqlite::Sqlite::new(url)
}

#[cfg(not(feature = "sqlite"))]
fn connect_sqlite(_url: &str) -> Result<NoDriver> {
    Err(Error::unsupported_feature("`sqlite` feature not enabled"))
}

/// Stands in for a driver whose feature is disabled; never constructed.
#[cfg(not(feature = "sqlite"))]
#[derive(Debug)]
pub(super) enum NoDriver {}

#[cfg(not(feature = "sqlite"))]
#[skein_core::async_trait]
impl Driver for NoDriver {
    fn url(&self) -> std::borrow::Cow<'_, str> {
        match *self {}
    }

    fn capability(&self) -> &'static skein_core::driver::Capability {
        match *self {}
    }

    async fn connect(&self) -> Result<Box<dyn skein_core::Connection>> {
        match *self {}
    }
}
