#![allow(dead_code)]

use skein_core::{
    driver::Param,
    schema::{EntityMap, MemberMap, ShardBy, Sharding},
    stmt::{Expr, ScopeId, Type, Value},
};
use skein_sql::{Command, Context, Sqlite};
use std::sync::Arc;

pub fn user() -> Arc<EntityMap> {
    Arc::new(
        EntityMap::builder("User")
            .member(MemberMap::new("id", Type::I64).key().auto_increment())
            .member(MemberMap::new("name", Type::String))
            .member(MemberMap::new("age", Type::I32))
            .build()
            .unwrap(),
    )
}

pub fn post() -> Arc<EntityMap> {
    Arc::new(
        EntityMap::builder("Post")
            .member(MemberMap::new("id", Type::I64).key().auto_increment())
            .member(MemberMap::new("userId", Type::I64))
            .member(MemberMap::new("title", Type::String))
            .build()
            .unwrap(),
    )
}

pub fn comment() -> Arc<EntityMap> {
    Arc::new(
        EntityMap::builder("Comment")
            .member(MemberMap::new("id", Type::I64).key().auto_increment())
            .member(MemberMap::new("postId", Type::I64))
            .member(MemberMap::new("body", Type::String))
            .build()
            .unwrap(),
    )
}

pub fn sqlite() -> Context {
    Context::new(Sqlite)
}

/// SQLite, with `User` rows split into `user_0` and `user_1` by the parity
/// of `member`.
pub fn sharded_by(member: &str) -> Context {
    let sharding = Sharding::new().table(
        "User",
        ShardBy::new([member], |origin, values| {
            Ok(format!("{origin}_{}", values[0].as_i64().unwrap_or(0) % 2))
        }),
    );
    sqlite().with_sharding(Arc::new(sharding))
}

pub fn col(scope: ScopeId, member: &str) -> Expr {
    Expr::column(scope, 0, member)
}

/// Parameter names and values, in binding order.
pub fn params(command: &Command) -> Vec<(&str, &Value)> {
    command
        .params
        .iter()
        .map(|Param { name, value }| (name.as_str(), value))
        .collect()
}

/// Placeholder names in the order they appear in the SQL text.
pub fn placeholders(sql: &str) -> Vec<String> {
    let mut names = vec![];
    let mut rest = sql;
    while let Some(start) = rest.find('@') {
        let tail = &rest[start + 1..];
        let end = tail
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(tail.len());
        names.push(tail[..end].to_string());
        rest = &tail[end..];
    }
    names
}

/// Every placeholder is bound, in text order.
pub fn assert_params_match(command: &Command) {
    let bound: Vec<_> = command.params.iter().map(|p| p.name.clone()).collect();
    assert_eq!(placeholders(&command.sql), bound, "sql: {}", command.sql);
}
