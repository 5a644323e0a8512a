use super::*;

#[derive(Debug, Clone)]
pub enum Expr {
    /// AND a set of expressions
    And(Vec<Expr>),

    /// Binary expression
    BinaryOp(ExprBinaryOp),

    /// Named function call, mapped by the dialect or evaluated locally
    Call(ExprCall),

    /// References a member of one of the statement's tables
    Column(ExprColumn),

    /// `EXISTS (subquery)`
    Exists(Box<Query>),

    /// Built-in function
    Func(ExprFunc),

    /// In list
    InList(ExprInList),

    /// The expression is contained by the given subquery
    InSubquery(ExprInSubquery),

    /// Whether an expression is (or is not) null. This is different from a
    /// binary expression because of how databases treat null comparisons.
    IsNull(ExprIsNull),

    /// Arithmetic negation
    Neg(Box<Expr>),

    /// Boolean negation
    Not(Box<Expr>),

    /// OR a set of expressions
    Or(Vec<Expr>),

    /// `LIKE` match
    Pattern(ExprPattern),

    /// Member-labelled expressions
    Record(ExprRecord),

    /// Scalar subquery
    Stmt(Box<Query>),

    /// Evaluates to a constant value
    Value(Value),

    /// A named runtime value
    Variable(ExprVariable),
}

#[derive(Debug, Clone)]
pub struct ExprInList {
    pub expr: Box<Expr>,

    /// Either a list value or a variable holding one
    pub list: Box<Expr>,

    pub negate: bool,
}

#[derive(Debug, Clone)]
pub struct ExprInSubquery {
    pub expr: Box<Expr>,
    pub query: Box<Query>,
    pub negate: bool,
}

#[derive(Debug, Clone)]
pub struct ExprIsNull {
    pub expr: Box<Expr>,
    pub negate: bool,
}

impl Expr {
    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    /// Is a value that evaluates to null
    pub fn is_value_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    /// Returns true if the expression is a constant value.
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(..))
    }

    pub fn is_or(&self) -> bool {
        matches!(self, Self::Or(..))
    }

    /// Combines two predicates with AND, flattening nested conjunctions.
    pub fn and(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        let mut operands = vec![];
        for expr in [lhs.into(), rhs.into()] {
            match expr {
                Self::And(nested) => operands.extend(nested),
                expr => operands.push(expr),
            }
        }
        Self::And(operands)
    }

    /// Combines two predicates with OR, flattening nested disjunctions.
    pub fn or(lhs: impl Into<Self>, rhs: impl Into<Self>) -> Self {
        let mut operands = vec![];
        for expr in [lhs.into(), rhs.into()] {
            match expr {
                Self::Or(nested) => operands.extend(nested),
                expr => operands.push(expr),
            }
        }
        Self::Or(operands)
    }

    pub fn not(expr: impl Into<Self>) -> Self {
        Self::Not(Box::new(expr.into()))
    }

    pub fn neg(expr: impl Into<Self>) -> Self {
        Self::Neg(Box::new(expr.into()))
    }

    pub fn is_null(expr: impl Into<Self>) -> Self {
        Self::IsNull(ExprIsNull {
            expr: Box::new(expr.into()),
            negate: false,
        })
    }

    pub fn is_not_null(expr: impl Into<Self>) -> Self {
        Self::IsNull(ExprIsNull {
            expr: Box::new(expr.into()),
            negate: true,
        })
    }

    pub fn in_list(expr: impl Into<Self>, list: impl Into<Self>) -> Self {
        Self::InList(ExprInList {
            expr: Box::new(expr.into()),
            list: Box::new(list.into()),
            negate: false,
        })
    }

    pub fn not_in_list(expr: impl Into<Self>, list: impl Into<Self>) -> Self {
        Self::InList(ExprInList {
            expr: Box::new(expr.into()),
            list: Box::new(list.into()),
            negate: true,
        })
    }

    pub fn in_subquery(expr: impl Into<Self>, query: Query) -> Self {
        Self::InSubquery(ExprInSubquery {
            expr: Box::new(expr.into()),
            query: Box::new(query),
            negate: false,
        })
    }

    pub fn exists(query: Query) -> Self {
        Self::Exists(Box::new(query))
    }

    pub fn stmt(query: Query) -> Self {
        Self::Stmt(Box::new(query))
    }

    pub fn pattern(expr: impl Into<Self>, kind: PatternKind, pattern: impl Into<Self>) -> Self {
        ExprPattern {
            expr: Box::new(expr.into()),
            pattern: Box::new(pattern.into()),
            kind,
        }
        .into()
    }

    /// True when the expression, or anything below it, reads a column.
    pub fn references_column(&self) -> bool {
        let mut found = false;
        self.walk(&mut |expr| found |= expr.is_column());
        found
    }

    /// True when the expression embeds a sub-query anywhere.
    pub fn contains_subquery(&self) -> bool {
        let mut found = false;
        self.walk(&mut |expr| {
            found |= matches!(
                expr,
                Self::Stmt(_) | Self::Exists(_) | Self::InSubquery(_)
            )
        });
        found
    }

    /// Visits this expression and its operands, without entering sub-queries.
    pub fn walk(&self, f: &mut impl FnMut(&Expr)) {
        f(self);

        match self {
            Self::And(operands) | Self::Or(operands) => {
                for operand in operands {
                    operand.walk(f);
                }
            }
            Self::BinaryOp(e) => {
                e.lhs.walk(f);
                e.rhs.walk(f);
            }
            Self::Call(e) => e.args.iter().for_each(|arg| arg.walk(f)),
            Self::Func(e) => e.args.iter().for_each(|arg| arg.walk(f)),
            Self::InList(e) => {
                e.expr.walk(f);
                e.list.walk(f);
            }
            Self::InSubquery(e) => e.expr.walk(f),
            Self::IsNull(e) => e.expr.walk(f),
            Self::Neg(e) | Self::Not(e) => e.walk(f),
            Self::Pattern(e) => {
                e.expr.walk(f);
                e.pattern.walk(f);
            }
            Self::Record(e) => e.fields.iter().for_each(|(_, expr)| expr.walk(f)),
            Self::Column(_) | Self::Exists(_) | Self::Stmt(_) | Self::Value(_) | Self::Variable(_) => {}
        }
    }
}

impl Default for Expr {
    fn default() -> Self {
        Self::Value(Value::default())
    }
}

impl<T: Into<Value>> From<T> for Expr {
    fn from(value: T) -> Self {
        Self::Value(value.into())
    }
}
