mod create;
pub use create::Create;

mod delete;
pub use delete::Delete;

mod expr;
pub use expr::Expr;

mod into_expr;
pub use into_expr::IntoExpr;

mod query;
pub(crate) use query::check_page;
pub use query::{Query, Select};

mod record;
pub use record::{Assignment, Record};

mod update;
pub use update::Update;

/// Member name of an expression reading a column.
pub(crate) fn member_of<T>(expr: &Expr<T>) -> skein_core::Result<String> {
    expr.untyped
        .as_column()
        .map(|column| column.member.clone())
        .ok_or_else(|| skein_core::Error::invalid_argument("expected a member of the entity"))
}
