mod support;

use pretty_assertions::assert_eq;
use skein_core::{
    schema::{EntityMap, MemberMap, ShardBy, Sharding},
    stmt::{
        CommandSegment, Expr, ExprRecord, Insert, InsertSource, MemberValues, Query, Type, Upsert,
        Value,
    },
};
use skein_sql::{compile_insert, Context, Mysql, Postgresql};
use std::sync::Arc;
use support::*;

fn bob() -> MemberValues {
    MemberValues::new()
        .with("id", 0i64)
        .with("name", "bob")
        .with("age", 30)
}

fn rows(n: usize) -> Vec<MemberValues> {
    (0..n)
        .map(|i| {
            MemberValues::new()
                .with("name", format!("user{i}"))
                .with("age", i as i32)
        })
        .collect()
}

#[test]
fn insert_skips_auto_increment_key() {
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBy(bob().into()));

    let commands = compile_insert(&sqlite(), &insert).unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(
        commands[0].sql,
        r#"INSERT INTO "user" ("name","age") VALUES (@name,@age)"#
    );
    assert_eq!(
        params(&commands[0]),
        [("name", &Value::from("bob")), ("age", &Value::I32(30))]
    );
}

#[test]
fn insert_returning_identity_appends_the_dialect_fetch() {
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBy(bob().into()));
    insert.return_identity = true;

    let command = &compile_insert(&sqlite(), &insert).unwrap()[0];
    assert_eq!(
        command.sql,
        r#"INSERT INTO "user" ("name","age") VALUES (@name,@age);SELECT last_insert_rowid()"#
    );
    assert_eq!(command.statements, 2);

    let command = &compile_insert(&Context::new(Postgresql), &insert).unwrap()[0];
    assert_eq!(
        command.sql,
        r#"INSERT INTO "user" ("name","age") VALUES (@name,@age) RETURNING "id""#
    );
    assert_eq!(command.statements, 1);
}

#[test]
fn identity_requires_an_auto_increment_key() {
    let mut insert = Insert::new(note());
    insert.segments.push(CommandSegment::WithBy(
        MemberValues::new().with("id", 1i64).with("body", "hi").into(),
    ));
    insert.return_identity = true;

    let err = compile_insert(&sqlite(), &insert).unwrap_err();
    assert!(err.is_invalid_mapping());
}

fn note() -> Arc<EntityMap> {
    Arc::new(
        EntityMap::builder("Note")
            .member(MemberMap::new("id", Type::I64).key())
            .member(MemberMap::new("body", Type::String))
            .build()
            .unwrap(),
    )
}

#[test]
fn single_fields_override_object_values() {
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBy(bob().into()));
    insert.segments.push(CommandSegment::WithByField {
        member: "age".into(),
        value: Expr::variable("years", 41),
    });

    let command = &compile_insert(&sqlite(), &insert).unwrap()[0];
    assert_eq!(
        command.sql,
        r#"INSERT INTO "user" ("name","age") VALUES (@name,@years)"#
    );
}

#[test]
fn field_filter_limits_columns() {
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBy(bob().into()));
    insert.fields.ignore(["age"]);

    let command = &compile_insert(&sqlite(), &insert).unwrap()[0];
    assert_eq!(command.sql, r#"INSERT INTO "user" ("name") VALUES (@name)"#);
}

#[test]
fn collection_passed_as_one_row_is_rejected() {
    let mut insert = Insert::new(user());
    insert
        .segments
        .push(CommandSegment::WithBy(InsertSource::Many(rows(2))));

    let err = compile_insert(&sqlite(), &insert).unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(err.to_string().contains("use bulk insert instead"));
}

#[test]
fn null_values_are_inlined() {
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBy(
        MemberValues::new()
            .with("name", Value::Null)
            .with("age", 3)
            .into(),
    ));

    let command = &compile_insert(&sqlite(), &insert).unwrap()[0];
    assert_eq!(
        command.sql,
        r#"INSERT INTO "user" ("name","age") VALUES (NULL,@age)"#
    );
    assert_params_match(command);
}

#[test]
fn upsert_per_dialect() {
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBy(bob().into()));
    insert.upsert = Some(Upsert::Values(MemberValues::new().with("age", 31)));

    let command = &compile_insert(&sqlite(), &insert).unwrap()[0];
    assert_eq!(
        command.sql,
        r#"INSERT INTO "user" ("name","age") VALUES (@name,@age) ON CONFLICT ("id") DO UPDATE SET "age"=@age_1"#
    );
    assert_params_match(command);

    let command = &compile_insert(&Context::new(Mysql), &insert).unwrap()[0];
    assert!(command
        .sql
        .ends_with(" ON DUPLICATE KEY UPDATE `age`=@age_1"));
}

#[test]
fn insert_from_query() {
    let mut source = Query::new(user());
    let mut record = ExprRecord::new();
    record.push("userId", col(source.scope, "id"));
    record.push("title", col(source.scope, "name"));
    source.select = Some(record.into());

    let mut insert = Insert::new(post());
    insert.from_query = Some(Box::new(source));

    let command = &compile_insert(&sqlite(), &insert).unwrap()[0];
    assert_eq!(
        command.sql,
        r#"INSERT INTO "post" ("user_id","title") SELECT a."id" AS "userId",a."name" AS "title" FROM "user" a"#
    );
}

#[test]
fn bulk_insert_chunks_by_bulk_count() {
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBulk(rows(5)));
    insert.bulk_count = Some(2);

    let commands = compile_insert(&sqlite(), &insert).unwrap();
    assert_eq!(commands.len(), 3);
    assert_eq!(
        commands[0].sql,
        r#"INSERT INTO "user" ("name","age") VALUES (@name_0,@age_0),(@name_1,@age_1)"#
    );
    assert_eq!(
        commands[2].sql,
        r#"INSERT INTO "user" ("name","age") VALUES (@name_4,@age_4)"#
    );
    for command in &commands {
        assert_params_match(command);
    }
}

#[test]
fn bulk_insert_uses_the_context_bulk_count() {
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBulk(rows(1201)));

    let commands = compile_insert(&sqlite(), &insert).unwrap();
    let sizes: Vec<_> = commands.iter().map(|c| c.params.len() / 2).collect();
    assert_eq!(sizes, [500, 500, 201]);
}

#[test]
fn bulk_insert_routes_rows_to_shards() {
    let sharding = Sharding::new().table(
        "User",
        ShardBy::new(["age"], |origin, values| {
            Ok(format!("{origin}_{}", values[0].as_i64().unwrap_or(0) % 2))
        }),
    );
    let cx = sqlite().with_sharding(Arc::new(sharding));

    let rows = [1, 2, 3]
        .into_iter()
        .map(|age| MemberValues::new().with("name", "x").with("age", age))
        .collect();
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBulk(rows));

    let commands = compile_insert(&cx, &insert).unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(
        commands[0].sql,
        r#"INSERT INTO "user_1" ("name","age") VALUES (@name_0,@age_0),(@name_2,@age_2);INSERT INTO "user_0" ("name","age") VALUES (@name_1,@age_1)"#
    );
    assert_eq!(commands[0].statements, 2);
    assert_params_match(&commands[0]);
}

#[test]
fn sharded_single_insert() {
    let sharding = Sharding::new().table(
        "User",
        ShardBy::new(["age"], |origin, values| {
            Ok(format!("{origin}_{}", values[0].as_i64().unwrap_or(0) % 2))
        }),
    );
    let cx = sqlite().with_sharding(Arc::new(sharding));

    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBy(bob().into()));

    let command = &compile_insert(&cx, &insert).unwrap()[0];
    assert!(command.sql.starts_with(r#"INSERT INTO "user_0" "#));
}

#[test]
fn bulk_insert_rejects_identity() {
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBulk(rows(2)));
    insert.return_identity = true;

    assert!(compile_insert(&sqlite(), &insert)
        .unwrap_err()
        .is_invalid_argument());
}

#[test]
fn bulk_rows_must_share_members() {
    let mut rows = rows(2);
    rows[1] = MemberValues::new().with("name", "only");
    let mut insert = Insert::new(user());
    insert.segments.push(CommandSegment::WithBulk(rows));

    let err = compile_insert(&sqlite(), &insert).unwrap_err();
    assert!(err.to_string().contains("bulk row 1 is missing member `age`"));
}
