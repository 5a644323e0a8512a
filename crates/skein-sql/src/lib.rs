#[macro_use]
mod fmt;

mod command;
pub use command::Command;

mod context;
pub use context::Context;

mod ddl;
pub use ddl::create_table;

pub mod dialect;
pub use dialect::{Dialect, Mysql, Postgresql, Sqlite};

mod multi;
pub use multi::{build_multi_command, MultipleCommand};

mod params;
pub use params::Params;

mod segment;
pub use segment::{Connective, FieldRef, SegmentKind, SqlSegment};

mod visitor;
pub use visitor::{
    build_includes, compile_count, compile_delete, compile_insert, compile_query, compile_update,
    SqlVisitor,
};
