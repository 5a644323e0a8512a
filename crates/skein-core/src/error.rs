mod adhoc;
mod conversion;
mod diagnostic;
mod driver;

use adhoc::AdhocError;
use conversion::ConversionError;
use diagnostic::Diagnostic;
use driver::DriverError;
use std::sync::Arc;

/// Returns early with an ad-hoc error built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::from_args(format_args!($($arg)*)))
    };
}

/// Builds an ad-hoc error from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::Error::from_args(format_args!($($arg)*))
    };
}

/// An error that can occur while compiling or executing a statement.
#[derive(Clone)]
pub struct Error {
    inner: Option<Arc<ErrorInner>>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    cause: Option<Error>,
}

impl Error {
    /// Adds context to this error.
    ///
    /// Context is displayed in reverse order: the most recently added context
    /// is shown first, followed by earlier context, ending with the root cause.
    #[inline(always)]
    pub fn context(self, consequent: impl IntoError) -> Error {
        self.context_impl(consequent.into_error())
    }

    #[inline(never)]
    #[cold]
    fn context_impl(self, consequent: Error) -> Error {
        let kind = match consequent.inner.map(Arc::try_unwrap) {
            Some(Ok(inner)) => inner.kind,
            // Shared or empty consequents keep their message but lose identity.
            Some(Err(shared)) => ErrorKind::Adhoc(AdhocError::new(shared.kind.to_string())),
            None => ErrorKind::Unknown,
        };

        Error {
            inner: Some(Arc::new(ErrorInner {
                kind,
                cause: Some(self),
            })),
        }
    }

    /// Creates an ad-hoc error from format arguments.
    pub fn from_args(args: core::fmt::Arguments<'_>) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(args.to_string())))
    }

    /// This error followed by each cause, outermost first.
    fn chain(&self) -> impl Iterator<Item = &Error> {
        core::iter::successors(Some(self), |err| {
            err.inner.as_ref().and_then(|inner| inner.cause.as_ref())
        })
    }

    fn kind(&self) -> &ErrorKind {
        self.inner
            .as_ref()
            .map(|inner| &inner.kind)
            .unwrap_or(&ErrorKind::Unknown)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Driver(err) => Some(err),
            ErrorKind::Anyhow(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        for (depth, err) in self.chain().enumerate() {
            if depth > 0 {
                f.write_str(": ")?;
            }
            core::fmt::Display::fmt(err.kind(), f)?;
        }
        Ok(())
    }
}

/// `{:?}` prints the message chain; `{:#?}` prints the kind tree.
impl core::fmt::Debug for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        if !f.alternate() {
            return core::fmt::Display::fmt(self, f);
        }
        let mut list = f.debug_list();
        for err in self.chain() {
            list.entry(err.kind());
        }
        list.finish()
    }
}

#[derive(Debug)]
enum ErrorKind {
    Anyhow(anyhow::Error),
    Adhoc(AdhocError),
    Conversion(ConversionError),
    Diagnostic(Diagnostic),
    Driver(DriverError),
    Unknown,
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let message: &dyn core::fmt::Display = match self {
            ErrorKind::Anyhow(err) => err,
            ErrorKind::Adhoc(err) => err,
            ErrorKind::Conversion(err) => err,
            ErrorKind::Diagnostic(err) => err,
            ErrorKind::Driver(err) => err,
            ErrorKind::Unknown => &"unknown skein error",
        };
        core::fmt::Display::fmt(message, f)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Some(Arc::new(ErrorInner { kind, cause: None })),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Error {
        Error::from(ErrorKind::Anyhow(err))
    }
}

impl From<std::num::TryFromIntError> for Error {
    fn from(err: std::num::TryFromIntError) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Error {
        Error::from(anyhow::Error::from(err))
    }
}

/// Accepted by [`Error::context`].
pub trait IntoError {
    fn into_error(self) -> Error;
}

impl IntoError for Error {
    #[inline(always)]
    fn into_error(self) -> Error {
        self
    }
}

impl IntoError for &str {
    fn into_error(self) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(self.to_string())))
    }
}

impl IntoError for String {
    fn into_error(self) -> Error {
        Error::from(ErrorKind::Adhoc(AdhocError::new(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_size() {
        assert_eq!(
            core::mem::size_of::<usize>(),
            core::mem::size_of::<Error>()
        );
    }

    #[test]
    fn error_from_args() {
        let err = Error::from_args(format_args!("bad member: {}", "age"));
        assert_eq!(err.to_string(), "bad member: age");
    }

    #[test]
    fn error_chain_display() {
        let err = Error::unsupported_expression("method `format` has no SQL mapping")
            .context(err!("compiling WHERE clause"))
            .context("query for `User`");

        assert_eq!(
            err.to_string(),
            "query for `User`: compiling WHERE clause: unsupported expression: method `format` has no SQL mapping"
        );
        assert!(!err.is_unsupported_expression());
    }

    #[test]
    fn driver_error_prints_its_sources() {
        #[derive(Debug)]
        struct Prepare(std::io::Error);

        impl core::fmt::Display for Prepare {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str("prepare failed")
            }
        }

        impl std::error::Error for Prepare {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Error::driver_operation_failed(Prepare(std::io::Error::other("disk full")));
        assert!(err.is_driver_operation_failed());
        assert_eq!(err.to_string(), "prepare failed: disk full");
    }

    #[test]
    fn alternate_debug_lists_each_layer() {
        let err = Error::invalid_mapping("no key").context("registering `Tag`");
        let debug = format!("{err:#?}");
        assert!(debug.find("Adhoc").unwrap() < debug.find("InvalidMapping").unwrap());
    }

    #[test]
    fn anyhow_bridge() {
        let err: Error = anyhow::anyhow!("socket closed").into();
        assert_eq!(err.to_string(), "socket closed");
    }

    #[test]
    fn invalid_argument() {
        let err = Error::invalid_argument("use bulk insert instead");
        assert!(err.is_invalid_argument());
        assert_eq!(err.to_string(), "invalid argument: use bulk insert instead");
    }

    #[test]
    fn invalid_mapping() {
        let err = Error::invalid_mapping("entity `Tag` has no auto-increment key");
        assert!(err.is_invalid_mapping());
        assert_eq!(
            err.to_string(),
            "invalid mapping: entity `Tag` has no auto-increment key"
        );
    }

    #[test]
    fn type_conversion_error() {
        let err = Error::type_conversion(crate::stmt::Value::I64(42), "String");
        assert!(err.is_type_conversion());
        assert_eq!(err.to_string(), "cannot convert I64 to String");
    }

    #[test]
    fn record_not_found_with_context() {
        let err = Error::record_not_found("table=user key=7");
        assert!(err.is_record_not_found());
        assert_eq!(err.to_string(), "record not found: table=user key=7");
    }

    #[test]
    fn unsupported_feature() {
        let err = Error::unsupported_feature("driver cannot execute multiple statements");
        assert!(err.is_unsupported_feature());
        assert_eq!(
            err.to_string(),
            "unsupported feature: driver cannot execute multiple statements"
        );
    }

    #[test]
    fn invalid_result_error() {
        let err = Error::invalid_result("expected 2 result sets, got 1");
        assert!(err.is_invalid_result());
        assert!(!err.is_record_not_found());
        assert_eq!(
            err.to_string(),
            "invalid result: expected 2 result sets, got 1"
        );
    }

    #[test]
    fn empty_message_shows_category_only() {
        assert_eq!(Error::record_not_found("").to_string(), "record not found");
    }
}
