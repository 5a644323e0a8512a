use crate::stmt::Value;

#[derive(Debug, Clone)]
pub enum Operation {
    /// Execute SQL with bound parameters
    QuerySql(QuerySql),

    /// Execute SQL with no parameters and no result rows, such as DDL
    Execute(String),
}

/// Parameterized SQL, possibly several `;`-joined statements.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySql {
    pub sql: String,

    /// In placeholder order
    pub params: Vec<Param>,
}

/// A named parameter value.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Name without the dialect prefix
    pub name: String,
    pub value: Value,
}

impl Operation {
    pub fn sql(&self) -> &str {
        match self {
            Operation::QuerySql(op) => &op.sql,
            Operation::Execute(sql) => sql,
        }
    }
}

impl From<QuerySql> for Operation {
    fn from(value: QuerySql) -> Self {
        Self::QuerySql(value)
    }
}
