use super::{Expr, Value};

/// A named runtime value.
///
/// Never folded into the SQL text; always bound as a parameter carrying the
/// variable's name.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprVariable {
    pub name: String,
    pub value: Value,
}

impl Expr {
    pub fn variable(name: impl Into<String>, value: impl Into<Value>) -> Self {
        ExprVariable {
            name: name.into(),
            value: value.into(),
        }
        .into()
    }
}

impl From<ExprVariable> for Expr {
    fn from(value: ExprVariable) -> Self {
        Self::Variable(value)
    }
}
