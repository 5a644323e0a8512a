use super::Expr;
use skein_core::stmt::{Primitive, Value};

/// Values accepted wherever an expression of type `T` is expected: other
/// expressions, sub-queries, and plain Rust values, which become bound
/// parameters.
pub trait IntoExpr<T: ?Sized> {
    fn into_expr(self) -> Expr<T>;
}

macro_rules! literals {
    ( $( $t:ty ),* ) => {
        $(
            impl IntoExpr<$t> for $t {
                fn into_expr(self) -> Expr<$t> {
                    Expr::from_value(self.into_value())
                }
            }

            impl IntoExpr<$t> for &$t {
                fn into_expr(self) -> Expr<$t> {
                    Expr::from_value(self.clone().into_value())
                }
            }
        )*
    };
}

literals!(bool, i32, i64, f64, String, Vec<u8>, uuid::Uuid);

impl IntoExpr<String> for &str {
    fn into_expr(self) -> Expr<String> {
        Expr::from_value(Value::from(self))
    }
}

impl<T: ?Sized> IntoExpr<T> for Expr<T> {
    fn into_expr(self) -> Self {
        self
    }
}

impl<T: ?Sized> IntoExpr<T> for &Expr<T> {
    fn into_expr(self) -> Expr<T> {
        self.clone()
    }
}

/// `None` binds NULL.
impl<T: Primitive> IntoExpr<Option<T>> for Option<T> {
    fn into_expr(self) -> Expr<Option<T>> {
        Expr::from_value(self.into_value())
    }
}

/// A present value compares against a nullable member without wrapping it
/// in `Some`.
impl<T: Primitive> IntoExpr<Option<T>> for T {
    fn into_expr(self) -> Expr<Option<T>> {
        Expr::from_value(self.into_value())
    }
}
