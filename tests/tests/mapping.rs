use pretty_assertions::assert_eq;
use skein::{MemberMap, TypeHandler, Value};
use skein_core::driver::Operation;
use std::sync::Arc;
use tests::{logged_sql, models::User, setup};

skein::entity! {
    table = "documents",
    fields = DocumentFields,
    key = [id],
    auto_increment = [id],
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Document {
        pub id: i64,
        pub title: String,
        pub secret: String,
        pub version: i64,
        pub cache: String,
    }
}

/// Stores strings reversed.
#[derive(Debug)]
struct Reversed;

impl TypeHandler for Reversed {
    fn to_db(&self, value: Value) -> skein::Result<Value> {
        match value {
            Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
            value => Ok(value),
        }
    }

    fn from_db(&self, value: Value) -> skein::Result<Value> {
        self.to_db(value)
    }
}

async fn setup_documents() -> (skein::Db, tests::OpsLog) {
    setup(|builder| {
        builder.register_with::<Document>(|map| {
            map.configure("title", |member| member.field_name("doc_title"))?
                .configure("secret", |member| member.type_handler(Arc::new(Reversed)))?
                .configure("version", MemberMap::row_version)?
                .configure("cache", MemberMap::ignore)
        });
    })
    .await
}

fn document(title: &str, secret: &str) -> Document {
    Document {
        title: title.to_string(),
        secret: secret.to_string(),
        cache: "not stored".to_string(),
        ..Document::default()
    }
}

#[tokio::test]
async fn type_handler_converts_bound_and_read_values() {
    let (db, ops_log) = setup_documents().await;

    let id = db
        .create::<Document>()
        .unwrap()
        .with(&document("plans", "abc"))
        .exec_identity()
        .await
        .unwrap();

    let stored = match &ops_log.lock().unwrap()[0].operation {
        Operation::QuerySql(op) => op
            .params
            .iter()
            .find(|param| param.name == "secret")
            .map(|param| param.value.clone()),
        Operation::Execute(_) => None,
    };
    assert_eq!(stored, Some(Value::String("cba".to_string())));

    let found = db
        .query::<Document>()
        .unwrap()
        .filter(|d| d.secret.eq("abc"))
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.secret, "abc");
}

#[tokio::test]
async fn members_map_to_configured_columns() {
    let (db, ops_log) = setup_documents().await;

    let id = db
        .create::<Document>()
        .unwrap()
        .with(&document("plans", "abc"))
        .exec_identity()
        .await
        .unwrap();

    let insert = &logged_sql(&ops_log)[0];
    assert!(insert.contains("doc_title"), "{insert}");
    assert!(!insert.contains("cache"), "{insert}");

    let loaded = db.query::<Document>().unwrap().get(id).await.unwrap();
    assert_eq!(loaded.title, "plans");

    // Ignored members read as their default.
    assert_eq!(loaded.cache, "");
}

#[tokio::test]
async fn row_version_guards_stale_updates() {
    let (db, _) = setup_documents().await;

    let id = db
        .create::<Document>()
        .unwrap()
        .with(&document("plans", "abc"))
        .exec_identity()
        .await
        .unwrap();
    let mut loaded = db.query::<Document>().unwrap().get(id).await.unwrap();
    let stale = loaded.clone();

    loaded.title = "revised".to_string();
    let updated = db
        .update::<Document>()
        .unwrap()
        .set_with(&loaded)
        .exec()
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let updated = db
        .update::<Document>()
        .unwrap()
        .set_with(&stale)
        .exec()
        .await
        .unwrap();
    assert_eq!(updated, 0);

    let current = db.query::<Document>().unwrap().get(id).await.unwrap();
    assert_eq!(current.title, "revised");
    assert_eq!(current.version, stale.version + 1);
}

#[tokio::test]
async fn unknown_member_fails_registration() {
    let mut builder = skein::Db::builder();
    builder.register_with::<Document>(|map| map.configure("missing", MemberMap::ignore));

    let err = builder
        .build(skein_driver_sqlite::Sqlite::in_memory())
        .await
        .unwrap_err();
    assert!(err.is_invalid_mapping());
}

#[tokio::test]
async fn table_name_prefix_applies_to_every_statement() {
    let (db, ops_log) = setup(|builder| {
        builder.table_name_prefix("app_").register::<User>();
    })
    .await;

    db.query::<User>().unwrap().count().await.unwrap();
    let sql = &logged_sql(&ops_log)[0];
    assert!(sql.contains("app_users"), "{sql}");
}

#[tokio::test]
async fn connect_picks_the_driver_from_the_url() {
    let db = skein::Db::builder()
        .register::<User>()
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db.push_schema().await.unwrap();

    assert_eq!(db.context().dialect.name(), "sqlite");
    assert_eq!(db.query::<User>().unwrap().count().await.unwrap(), 0);

    let err = skein::Db::builder()
        .connect("oracle://localhost")
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
}
