use pretty_assertions::assert_eq;
use skein::Keys;
use tests::{
    models::{user, User},
    setup_blog,
};

#[tokio::test]
async fn create_returns_generated_key() {
    let (db, _) = setup_blog().await;

    let alice = db.create::<User>().unwrap().with(&user("alice", 30));
    let alice = alice.exec_identity().await.unwrap();
    let bob = db
        .create::<User>()
        .unwrap()
        .with(&user("bob", 25))
        .exec_identity()
        .await
        .unwrap();

    assert_eq!(alice, 1);
    assert_eq!(bob, 2);

    let reloaded = db.query::<User>().unwrap().get(bob).await.unwrap();
    assert_eq!(reloaded.id, bob);
    assert_eq!(reloaded.name, "bob");
    assert_eq!(reloaded.email, None);
    assert_eq!(reloaded.age, 25);
}

#[tokio::test]
async fn identity_runs_in_the_insert_round_trip() {
    let (db, ops_log) = setup_blog().await;

    db.create::<User>()
        .unwrap()
        .with(&user("alice", 30))
        .exec_identity()
        .await
        .unwrap();

    let ops = ops_log.lock().unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].response.len(), 2);
}

#[tokio::test]
async fn clones_share_one_connection() {
    let (db, ops_log) = setup_blog().await;

    let other = db.clone();
    let writer = tokio::spawn(async move {
        other
            .create::<User>()
            .unwrap()
            .with(&user("alice", 30))
            .exec()
            .await
            .unwrap()
    });
    db.create::<User>().unwrap().with(&user("bob", 25)).exec().await.unwrap();
    writer.await.unwrap();

    // Both rows landed in the same in-memory database.
    assert_eq!(db.query::<User>().unwrap().count().await.unwrap(), 2);
    assert!(ops_log.lock().unwrap().iter().all(|op| op.connection == 0));
}

#[tokio::test]
async fn get_missing_key_is_record_not_found() {
    let (db, _) = setup_blog().await;

    let err = db.query::<User>().unwrap().get(42_i64).await.unwrap_err();
    assert!(err.is_record_not_found());
}

#[tokio::test]
async fn set_overrides_with_values() {
    let (db, _) = setup_blog().await;

    let id = db
        .create::<User>()
        .unwrap()
        .with(&user("alice", 30))
        .set(|u| u.email.assign(Some("alice@example.com".to_string())))
        .unwrap()
        .exec_identity()
        .await
        .unwrap();

    let alice = db.query::<User>().unwrap().get(id).await.unwrap();
    assert_eq!(alice.email.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn update_with_filter() {
    let (db, _) = setup_blog().await;
    for (name, age) in [("alice", 30), ("bob", 25), ("carol", 41)] {
        db.create::<User>()
            .unwrap()
            .with(&user(name, age))
            .exec()
            .await
            .unwrap();
    }

    let updated = db
        .update::<User>()
        .unwrap()
        .set(|u| vec![u.age.assign(&u.age + 1)])
        .unwrap()
        .filter(|u| u.age.lt(35))
        .filter(|u| u.name.ne("bob"))
        .exec()
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let ages = db
        .query::<User>()
        .unwrap()
        .order_by(|u| u.name)
        .select(|u| u.age)
        .to_list()
        .await
        .unwrap();
    assert_eq!(ages, vec![31, 25, 41]);
}

#[tokio::test]
async fn set_with_matches_the_key() {
    let (db, _) = setup_blog().await;
    let id = db
        .create::<User>()
        .unwrap()
        .with(&user("alice", 30))
        .exec_identity()
        .await
        .unwrap();

    let mut alice = db.query::<User>().unwrap().get(id).await.unwrap();
    alice.name = "alicia".to_string();
    alice.age = 31;

    let updated = db
        .update::<User>()
        .unwrap()
        .set_with(&alice)
        .exec()
        .await
        .unwrap();
    assert_eq!(updated, 1);

    assert_eq!(db.query::<User>().unwrap().get(id).await.unwrap(), alice);
}

#[tokio::test]
async fn update_only_listed_fields() {
    let (db, _) = setup_blog().await;
    let id = db
        .create::<User>()
        .unwrap()
        .with(&user("alice", 30))
        .exec_identity()
        .await
        .unwrap();

    let mut changed = user("ignored", 99);
    changed.id = id;
    db.update::<User>()
        .unwrap()
        .set_with(&changed)
        .only_fields(["age"])
        .exec()
        .await
        .unwrap();

    let alice = db.query::<User>().unwrap().get(id).await.unwrap();
    assert_eq!(alice.name, "alice");
    assert_eq!(alice.age, 99);
}

#[tokio::test]
async fn update_where_key_without_keys_is_rejected() {
    let (db, _) = setup_blog().await;

    let err = db
        .update::<User>()
        .unwrap()
        .where_key(Keys::List(vec![]))
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn delete_by_key_and_by_row() {
    let (db, _) = setup_blog().await;
    for name in ["alice", "bob", "carol"] {
        db.create::<User>()
            .unwrap()
            .with(&user(name, 20))
            .exec()
            .await
            .unwrap();
    }

    let deleted = db
        .delete::<User>()
        .unwrap()
        .where_key(1_i64)
        .exec()
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let carol = db
        .query::<User>()
        .unwrap()
        .filter(|u| u.name.eq("carol"))
        .first()
        .await
        .unwrap()
        .unwrap();
    let deleted = db
        .delete::<User>()
        .unwrap()
        .remove([&carol])
        .exec()
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let names = db
        .query::<User>()
        .unwrap()
        .select(|u| u.name)
        .to_list()
        .await
        .unwrap();
    assert_eq!(names, vec!["bob".to_string()]);
}

#[tokio::test]
async fn delete_with_filter() {
    let (db, _) = setup_blog().await;
    for (name, age) in [("alice", 30), ("bob", 25), ("carol", 41)] {
        db.create::<User>()
            .unwrap()
            .with(&user(name, age))
            .exec()
            .await
            .unwrap();
    }

    let deleted = db
        .delete::<User>()
        .unwrap()
        .filter(|u| u.age.ge(30))
        .exec()
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(db.query::<User>().unwrap().count().await.unwrap(), 1);
}

#[tokio::test]
async fn explicit_table_name_reaches_every_statement() {
    let (db, _) = setup_blog().await;
    db.exec_raw(
        r#"CREATE TABLE "users_2024" ("id" INTEGER PRIMARY KEY AUTOINCREMENT, "name" TEXT NOT NULL, "email" TEXT, "age" INTEGER NOT NULL)"#,
    )
    .await
    .unwrap();

    let id = db
        .create::<User>()
        .unwrap()
        .with(&user("alice", 30))
        .table_name("users_2024")
        .exec_identity()
        .await
        .unwrap();

    let updated = db
        .update::<User>()
        .unwrap()
        .set(|u| vec![u.age.assign(31)])
        .unwrap()
        .filter(|u| u.name.eq("alice"))
        .table_name("users_2024")
        .exec()
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let archived = db
        .query::<User>()
        .unwrap()
        .table_name("users_2024")
        .get(id)
        .await
        .unwrap();
    assert_eq!(archived.age, 31);
    assert_eq!(db.query::<User>().unwrap().count().await.unwrap(), 0);
}
