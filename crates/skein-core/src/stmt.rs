mod delete;
pub use delete::Delete;

mod eval;

mod expr;
pub use expr::{Expr, ExprInList, ExprInSubquery, ExprIsNull};

mod expr_binary_op;
pub use expr_binary_op::ExprBinaryOp;

mod expr_column;
pub use expr_column::{ExprColumn, ScopeId};

mod expr_func;
pub use expr_func::{CallEval, ExprCall, ExprFunc, Func};

mod expr_pattern;
pub use expr_pattern::{ExprPattern, PatternKind};

mod expr_record;
pub use expr_record::ExprRecord;

mod expr_variable;
pub use expr_variable::ExprVariable;

mod field_filter;
pub use field_filter::FieldFilter;

mod insert;
pub use insert::{Insert, InsertSource, Upsert};

mod member_values;
pub use member_values::MemberValues;

mod op_binary;
pub use op_binary::BinaryOp;

mod primitive;
pub use primitive::Primitive;

mod query;
pub use query::{
    Cte, Direction, Include, Join, JoinKind, OrderBy, Paging, Query, TableBody, TableSource, Union,
};

mod result_set;
pub use result_set::{ResultSet, Row};

mod segment;
pub use segment::{CommandSegment, Keys};

mod ty;
pub use ty::Type;

mod update;
pub use update::Update;

mod value;
pub use value::Value;
