use super::{Error, ErrorKind};

/// What went wrong, for errors that carry only a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Category {
    /// A builder method received an argument it cannot accept. The builder
    /// is left as it was: a collection where one row is expected, an empty
    /// key list or bulk row set, a paging size of zero.
    InvalidArgument,

    /// Entity metadata lacks something the operation needs, such as an
    /// auto-increment key for an identity read or a declared member.
    InvalidMapping,

    /// A response did not have the shape its statements imply.
    InvalidResult,

    /// A lookup by key or query matched no row.
    RecordNotFound,

    /// An expression has no SQL rendering in the active dialect.
    UnsupportedExpression,

    /// The driver cannot take this code path at all, e.g. batching several
    /// statements into one round trip.
    UnsupportedFeature,
}

impl Category {
    fn label(self) -> &'static str {
        match self {
            Category::InvalidArgument => "invalid argument",
            Category::InvalidMapping => "invalid mapping",
            Category::InvalidResult => "invalid result",
            Category::RecordNotFound => "record not found",
            Category::UnsupportedExpression => "unsupported expression",
            Category::UnsupportedFeature => "unsupported feature",
        }
    }
}

#[derive(Debug)]
pub(super) struct Diagnostic {
    category: Category,
    message: Box<str>,
}

impl std::error::Error for Diagnostic {}

impl core::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.category.label())?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

macro_rules! diagnostics {
    ( $( $(#[$doc:meta])* $category:ident => $new:ident, $is:ident; )* ) => {
        impl Error {
            $(
                $(#[$doc])*
                pub fn $new(message: impl Into<String>) -> Error {
                    Error::diagnostic(Category::$category, message.into())
                }

                pub fn $is(&self) -> bool {
                    self.category() == Some(Category::$category)
                }
            )*
        }
    };
}

diagnostics! {
    InvalidArgument => invalid_argument, is_invalid_argument;
    InvalidMapping => invalid_mapping, is_invalid_mapping;
    /// `message` describes the expected shape and what arrived instead.
    InvalidResult => invalid_result, is_invalid_result;
    /// `message` names the entity and the key or filter that missed.
    RecordNotFound => record_not_found, is_record_not_found;
    UnsupportedExpression => unsupported_expression, is_unsupported_expression;
    UnsupportedFeature => unsupported_feature, is_unsupported_feature;
}

impl Error {
    fn diagnostic(category: Category, message: String) -> Error {
        Error::from(ErrorKind::Diagnostic(Diagnostic {
            category,
            message: message.into(),
        }))
    }

    fn category(&self) -> Option<Category> {
        match self.kind() {
            ErrorKind::Diagnostic(diagnostic) => Some(diagnostic.category),
            _ => None,
        }
    }
}
