use super::{IntoExpr, Select};
use skein_core::{
    stmt::{self, BinaryOp, Func, PatternKind, Value},
    Result,
};
use std::{
    marker::PhantomData,
    ops::{Add, BitAnd, BitOr, Div, Mul, Neg, Not, Sub},
};

#[derive(Debug)]
pub struct Expr<T: ?Sized> {
    /// The un-typed expression
    pub(crate) untyped: stmt::Expr,

    /// `T` is the type of the expression
    pub(crate) _p: PhantomData<T>,
}

impl<T: ?Sized> Expr<T> {
    pub(crate) fn from_value(value: Value) -> Self {
        Self::from_untyped(stmt::Expr::Value(value))
    }

    pub fn from_untyped(untyped: impl Into<stmt::Expr>) -> Self {
        Self {
            untyped: untyped.into(),
            _p: PhantomData,
        }
    }

    pub fn cast<U: ?Sized>(self) -> Expr<U> {
        Expr {
            untyped: self.untyped,
            _p: PhantomData,
        }
    }

    pub fn into_untyped(self) -> stmt::Expr {
        self.untyped
    }

    /// A runtime value bound under `name` instead of an anonymous parameter.
    pub fn variable(name: &str, value: impl Into<Value>) -> Self {
        Self::from_untyped(stmt::Expr::variable(name, value))
    }

    pub fn eq(&self, rhs: impl IntoExpr<T>) -> Expr<bool> {
        self.compare(BinaryOp::Eq, rhs)
    }

    pub fn ne(&self, rhs: impl IntoExpr<T>) -> Expr<bool> {
        self.compare(BinaryOp::Ne, rhs)
    }

    pub fn gt(&self, rhs: impl IntoExpr<T>) -> Expr<bool> {
        self.compare(BinaryOp::Gt, rhs)
    }

    pub fn ge(&self, rhs: impl IntoExpr<T>) -> Expr<bool> {
        self.compare(BinaryOp::Ge, rhs)
    }

    pub fn lt(&self, rhs: impl IntoExpr<T>) -> Expr<bool> {
        self.compare(BinaryOp::Lt, rhs)
    }

    pub fn le(&self, rhs: impl IntoExpr<T>) -> Expr<bool> {
        self.compare(BinaryOp::Le, rhs)
    }

    fn compare(&self, op: BinaryOp, rhs: impl IntoExpr<T>) -> Expr<bool> {
        Expr::from_untyped(stmt::Expr::binary_op(
            self.untyped.clone(),
            op,
            rhs.into_expr().untyped,
        ))
    }

    pub fn is_null(&self) -> Expr<bool> {
        Expr::from_untyped(stmt::Expr::is_null(self.untyped.clone()))
    }

    pub fn is_not_null(&self) -> Expr<bool> {
        Expr::from_untyped(stmt::Expr::is_not_null(self.untyped.clone()))
    }

    /// Matches any of `items`. An empty list matches nothing.
    pub fn in_list<I>(&self, items: impl IntoIterator<Item = I>) -> Expr<bool>
    where
        I: Into<Value>,
    {
        let list: Value = items.into_iter().collect();
        Expr::from_untyped(stmt::Expr::in_list(self.untyped.clone(), list))
    }

    pub fn not_in_list<I>(&self, items: impl IntoIterator<Item = I>) -> Expr<bool>
    where
        I: Into<Value>,
    {
        let list: Value = items.into_iter().collect();
        Expr::from_untyped(stmt::Expr::not_in_list(self.untyped.clone(), list))
    }

    /// Matches the values selected by a single-column query.
    pub fn in_query(&self, query: Select<T>) -> Expr<bool>
    where
        T: Sized,
    {
        Expr::from_untyped(stmt::Expr::in_subquery(
            self.untyped.clone(),
            query.into_untyped(),
        ))
    }

    pub fn count(&self) -> Expr<i64> {
        self.func(Func::Count)
    }

    pub fn count_distinct(&self) -> Expr<i64> {
        self.func(Func::CountDistinct)
    }

    pub fn sum(&self) -> Expr<T> {
        self.func(Func::Sum)
    }

    pub fn avg(&self) -> Expr<f64> {
        self.func(Func::Avg)
    }

    pub fn max(&self) -> Expr<T> {
        self.func(Func::Max)
    }

    pub fn min(&self) -> Expr<T> {
        self.func(Func::Min)
    }

    /// The first non-null of this expression and `other`.
    pub fn coalesce(&self, other: impl IntoExpr<T>) -> Expr<T> {
        Expr::from_untyped(stmt::Expr::func(
            Func::Coalesce,
            [self.untyped.clone(), other.into_expr().untyped],
        ))
    }

    fn func<U: ?Sized>(&self, func: Func) -> Expr<U> {
        Expr::from_untyped(stmt::Expr::func(func, [self.untyped.clone()]))
    }
}

impl<T> Expr<T> {
    /// `COUNT(*)`
    pub fn count_all() -> Expr<i64> {
        Expr::from_untyped(stmt::Expr::count_star())
    }

    /// A named function. The dialect renders it when it knows the name;
    /// otherwise constant arguments are evaluated by `eval`.
    pub fn call(
        name: &str,
        args: impl IntoIterator<Item = stmt::Expr>,
        eval: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Expr<T> {
        Expr::from_untyped(stmt::Expr::call_with(name, args, eval))
    }
}

impl Expr<String> {
    pub fn contains(&self, pattern: impl IntoExpr<String>) -> Expr<bool> {
        self.pattern(PatternKind::Contains, pattern)
    }

    pub fn starts_with(&self, pattern: impl IntoExpr<String>) -> Expr<bool> {
        self.pattern(PatternKind::StartsWith, pattern)
    }

    pub fn ends_with(&self, pattern: impl IntoExpr<String>) -> Expr<bool> {
        self.pattern(PatternKind::EndsWith, pattern)
    }

    /// `LIKE` with the pattern used as written.
    pub fn like(&self, pattern: impl IntoExpr<String>) -> Expr<bool> {
        self.pattern(PatternKind::Like, pattern)
    }

    fn pattern(&self, kind: PatternKind, pattern: impl IntoExpr<String>) -> Expr<bool> {
        Expr::from_untyped(stmt::Expr::pattern(
            self.untyped.clone(),
            kind,
            pattern.into_expr().untyped,
        ))
    }

    pub fn upper(&self) -> Expr<String> {
        self.func(Func::Upper)
    }

    pub fn lower(&self) -> Expr<String> {
        self.func(Func::Lower)
    }

    pub fn trim(&self) -> Expr<String> {
        self.func(Func::Trim)
    }

    pub fn length(&self) -> Expr<i64> {
        self.func(Func::Length)
    }
}

impl Expr<bool> {
    pub fn and(self, rhs: impl IntoExpr<bool>) -> Self {
        Self::from_untyped(stmt::Expr::and(self.untyped, rhs.into_expr().untyped))
    }

    pub fn or(self, rhs: impl IntoExpr<bool>) -> Self {
        Self::from_untyped(stmt::Expr::or(self.untyped, rhs.into_expr().untyped))
    }

    /// `EXISTS` over a query, which may read columns of enclosing queries.
    pub fn exists<P: crate::Participants>(query: super::Query<P>) -> Self {
        Self::from_untyped(stmt::Expr::exists(query.into_untyped()))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        !self
    }
}

impl Not for Expr<bool> {
    type Output = Self;

    fn not(self) -> Self {
        Self::from_untyped(stmt::Expr::not(self.untyped))
    }
}

impl<R: IntoExpr<bool>> BitAnd<R> for Expr<bool> {
    type Output = Self;

    fn bitand(self, rhs: R) -> Self {
        self.and(rhs)
    }
}

impl<R: IntoExpr<bool>> BitOr<R> for Expr<bool> {
    type Output = Self;

    fn bitor(self, rhs: R) -> Self {
        self.or(rhs)
    }
}

macro_rules! impl_arithmetic {
    ( $( $trait:ident :: $method:ident => $op:ident ),* ) => {
        $(
            impl<T, R: IntoExpr<T>> $trait<R> for Expr<T> {
                type Output = Expr<T>;

                fn $method(self, rhs: R) -> Expr<T> {
                    Expr::from_untyped(stmt::Expr::binary_op(
                        self.untyped,
                        BinaryOp::$op,
                        rhs.into_expr().untyped,
                    ))
                }
            }

            impl<T, R: IntoExpr<T>> $trait<R> for &Expr<T> {
                type Output = Expr<T>;

                fn $method(self, rhs: R) -> Expr<T> {
                    self.clone().$method(rhs)
                }
            }
        )*
    };
}

impl_arithmetic!(Add::add => Add, Sub::sub => Sub, Mul::mul => Mul, Div::div => Div);

impl<T> Neg for Expr<T> {
    type Output = Expr<T>;

    fn neg(self) -> Expr<T> {
        Expr::from_untyped(stmt::Expr::neg(self.untyped))
    }
}

impl<T: ?Sized> Clone for Expr<T> {
    fn clone(&self) -> Self {
        Self {
            untyped: self.untyped.clone(),
            _p: PhantomData,
        }
    }
}

impl<T: ?Sized> From<Expr<T>> for stmt::Expr {
    fn from(value: Expr<T>) -> Self {
        value.untyped
    }
}
