pub mod db;
pub use db::Db;

mod entity;
pub use entity::{Entity, FromRow};

mod include;
pub use include::HasMany;

mod multi;
pub use multi::{Handle, MultiCommand, MultiQuery, MultiResults};

mod page;
pub use page::PagedList;

mod participants;
pub use participants::{JoinWith, Participants};

pub mod stmt;
pub use stmt::{Create, Delete, Expr, IntoExpr, Query, Record, Select, Update};

pub use skein_core::{
    driver::Driver,
    schema::{EntityMap, EntityMapBuilder, MemberMap, TypeHandler},
    stmt::{JoinKind, Keys, MemberValues, Value},
    Error, Result,
};
pub use skein_sql::{Command, Dialect, Mysql, Postgresql, Sqlite};

#[doc(hidden)]
pub mod codegen_support {
    pub use crate::{
        entity::{column, member, read_member},
        Entity, EntityMap, EntityMapBuilder, Expr, FromRow, HasMany, MemberValues, Result,
    };
    pub use skein_core::{
        schema::Schema,
        stmt::{Primitive, Row, ScopeId},
    };
    pub use std::{sync::Arc, vec::Vec};
}
