use super::{Error, ErrorKind};
use std::error::Error as StdError;

/// A failure reported by the database client: opening a connection,
/// preparing or binding a statement, or stepping through rows.
#[derive(Debug)]
pub(super) struct DriverError(Box<dyn StdError + Send + Sync>);

impl StdError for DriverError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.0)
    }
}

/// Client errors often hide the useful part in their sources, so the whole
/// chain is printed.
impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let mut next: Option<&dyn StdError> = Some(&*self.0);
        let mut first = true;
        while let Some(err) = next {
            if !first {
                f.write_str(": ")?;
            }
            write!(f, "{err}")?;
            first = false;
            next = err.source();
        }
        Ok(())
    }
}

impl Error {
    pub fn driver_operation_failed(err: impl StdError + Send + Sync + 'static) -> Error {
        Error::from(ErrorKind::Driver(DriverError(Box::new(err))))
    }

    pub fn is_driver_operation_failed(&self) -> bool {
        matches!(self.kind(), ErrorKind::Driver(_))
    }
}
