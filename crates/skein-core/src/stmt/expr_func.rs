use super::{Expr, Value};
use crate::Result;
use std::{fmt, sync::Arc};

/// Functions every dialect maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Count,
    CountDistinct,
    Sum,
    Avg,
    Max,
    Min,
    Upper,
    Lower,
    Length,
    Trim,
    Coalesce,
}

impl Func {
    pub fn name(self) -> &'static str {
        match self {
            Func::Count => "count",
            Func::CountDistinct => "count_distinct",
            Func::Sum => "sum",
            Func::Avg => "avg",
            Func::Max => "max",
            Func::Min => "min",
            Func::Upper => "upper",
            Func::Lower => "lower",
            Func::Length => "length",
            Func::Trim => "trim",
            Func::Coalesce => "coalesce",
        }
    }

    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            Func::Count | Func::CountDistinct | Func::Sum | Func::Avg | Func::Max | Func::Min
        )
    }
}

#[derive(Debug, Clone)]
pub struct ExprFunc {
    pub func: Func,

    /// `Count` with no arguments renders as `COUNT(*)`
    pub args: Vec<Expr>,
}

/// Local evaluator for a call the dialect cannot render.
pub type CallEval = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// A named function call.
///
/// Rendered through the dialect's function map when the name is known there.
/// Otherwise, when every argument is constant, `eval` computes the value once
/// and the result is bound like any other constant.
#[derive(Clone)]
pub struct ExprCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub eval: Option<CallEval>,
}

impl Expr {
    pub fn func(func: Func, args: impl IntoIterator<Item = Expr>) -> Self {
        ExprFunc {
            func,
            args: args.into_iter().collect(),
        }
        .into()
    }

    pub fn count_star() -> Self {
        Self::func(Func::Count, [])
    }

    pub fn call(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        ExprCall {
            name: name.into(),
            args: args.into_iter().collect(),
            eval: None,
        }
        .into()
    }

    pub fn call_with(
        name: impl Into<String>,
        args: impl IntoIterator<Item = Expr>,
        eval: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        ExprCall {
            name: name.into(),
            args: args.into_iter().collect(),
            eval: Some(Arc::new(eval)),
        }
        .into()
    }
}

impl fmt::Debug for ExprCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExprCall")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("eval", &self.eval.is_some())
            .finish()
    }
}

impl From<ExprFunc> for Expr {
    fn from(value: ExprFunc) -> Self {
        Self::Func(value)
    }
}

impl From<ExprCall> for Expr {
    fn from(value: ExprCall) -> Self {
        Self::Call(value)
    }
}
