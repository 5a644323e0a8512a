use pretty_assertions::assert_eq;
use skein::{Db, Expr};
use skein_core::driver::{Capability, Operation};
use skein_driver_sqlite::Sqlite;
use tests::{
    logged_sql,
    models::{post, user, Post, User},
    setup_blog, LoggingDriver,
};

async fn seed(db: &Db) {
    for (name, age) in [("alice", 30), ("bob", 25), ("carol", 41), ("dave", 19)] {
        db.create::<User>()
            .unwrap()
            .with(&user(name, age))
            .exec()
            .await
            .unwrap();
    }
    for (user_id, title) in [(1, "hello"), (1, "again"), (3, "notes")] {
        db.create::<Post>()
            .unwrap()
            .with(&post(user_id, title))
            .exec()
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn results_are_read_in_registration_order() {
    let (db, ops_log) = setup_blog().await;
    seed(&db).await;
    ops_log.lock().unwrap().clear();

    let mut multi = db.multiple_query();
    let adults = multi.to_list(
        db.query::<User>()
            .unwrap()
            .filter(|u| u.age.ge(21))
            .order_by(|u| u.name),
    );
    let posts = multi.count(db.query::<Post>().unwrap());
    let youngest = multi.first(db.query::<User>().unwrap().order_by(|u| u.age));
    let titles = multi.select(
        db.query::<Post>()
            .unwrap()
            .filter(|p| p.user_id.eq(1_i64))
            .order_by(|p| p.title)
            .select(|p| p.title),
    );

    let mut results = multi.execute().await.unwrap();

    let ops = logged_sql(&ops_log);
    assert_eq!(ops.len(), 1);

    let names = results
        .take(adults)
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["alice", "bob", "carol"]);
    assert_eq!(results.take(posts).unwrap(), 3);
    assert_eq!(results.take(youngest).unwrap().unwrap().name, "dave");
    assert_eq!(results.take(titles).unwrap(), vec!["again", "hello"]);

    assert!(results.take(posts).unwrap_err().is_invalid_argument());
}

#[tokio::test]
async fn batched_parameters_do_not_collide() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    let mut multi = db.multiple_query();
    let alice = multi.to_list(db.query::<User>().unwrap().filter(|u| u.name.eq("alice")));
    let bob = multi.to_list(db.query::<User>().unwrap().filter(|u| u.name.eq("bob")));

    let mut results = multi.execute().await.unwrap();
    assert_eq!(results.take(alice).unwrap()[0].name, "alice");
    assert_eq!(results.take(bob).unwrap()[0].name, "bob");
}

#[tokio::test]
async fn page_list_reads_count_and_page_together() {
    let (db, ops_log) = setup_blog().await;
    seed(&db).await;
    ops_log.lock().unwrap().clear();

    let page = db
        .query::<User>()
        .unwrap()
        .order_by(|u| u.name)
        .to_page_list(2, 3)
        .await
        .unwrap();

    assert_eq!(page.total_count, 4);
    assert_eq!(page.page_index, 2);
    assert_eq!(page.page_size, 3);
    assert_eq!(page.page_count(), 2);
    assert!(!page.has_next());
    assert!(page.has_prev());
    assert_eq!(
        page.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
        vec!["dave"]
    );

    let ops = ops_log.lock().unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].response.len(), 2);
}

#[tokio::test]
async fn page_index_starts_at_one() {
    let (db, _) = setup_blog().await;

    let err = db
        .query::<User>()
        .unwrap()
        .to_page_list(0, 10)
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn page_offset_out_of_range_is_rejected() {
    let (db, _) = setup_blog().await;

    let err = db
        .query::<User>()
        .unwrap()
        .to_page_list(u64::MAX, 2)
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());

    let mut multi = db.multiple_query();
    let err = multi
        .to_page_list(db.query::<User>().unwrap(), 2, u64::MAX)
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn single_statement_driver_rejects_batches() {
    static SINGLE_STATEMENT: Capability = Capability {
        multiple_statements: false,
        ..Capability::SQLITE
    };

    let driver =
        LoggingDriver::new(Box::new(Sqlite::in_memory())).with_capability(&SINGLE_STATEMENT);
    let ops_log = driver.ops_log_handle();
    let mut builder = Db::builder();
    builder.register::<User>();
    let db = builder.build(driver).await.unwrap();
    db.push_schema().await.unwrap();

    // One statement per round trip still works.
    assert_eq!(db.query::<User>().unwrap().count().await.unwrap(), 0);

    let mut multi = db.multiple_query();
    multi.to_list(db.query::<User>().unwrap());
    multi.count(db.query::<User>().unwrap());
    let err = multi.execute().await.unwrap_err();
    assert!(err.is_unsupported_feature());

    let queries = ops_log
        .lock()
        .unwrap()
        .iter()
        .filter(|op| matches!(op.operation, Operation::QuerySql(_)))
        .count();
    assert_eq!(queries, 1);
}

#[tokio::test]
async fn multiple_command_runs_in_one_round_trip() {
    let (db, ops_log) = setup_blog().await;
    seed(&db).await;
    ops_log.lock().unwrap().clear();

    let mut multi = db.multiple_command();
    multi
        .push(db.create::<User>().unwrap().with(&user("erin", 33)))
        .push(
            db.update::<User>()
                .unwrap()
                .set_field(|u| u.age.assign(50))
                .unwrap()
                .filter(|u| u.name.eq("alice")),
        )
        .push(db.delete::<Post>().unwrap().filter(|p| p.user_id.eq(3_i64)));
    assert_eq!(multi.len(), 3);

    let affected = multi.exec().await.unwrap();
    assert_eq!(affected, 3);
    assert_eq!(logged_sql(&ops_log).len(), 1);

    let alice = db
        .query::<User>()
        .unwrap()
        .filter(|u| u.name.eq("alice"))
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alice.age, 50);
    assert_eq!(db.query::<Post>().unwrap().count().await.unwrap(), 2);
    assert_eq!(
        db.query::<User>()
            .unwrap()
            .filter(|u| u.name.eq("erin"))
            .count()
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn scalar_subquery_in_a_filter() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    let oldest = db
        .query::<User>()
        .unwrap()
        .select(|u| u.age.max())
        .into_expr();
    let names = db
        .query::<User>()
        .unwrap()
        .filter(|u| u.age.eq(oldest))
        .select(|u| u.name)
        .to_list()
        .await
        .unwrap();
    assert_eq!(names, vec!["carol"]);

    let with_posts = db
        .query::<User>()
        .unwrap()
        .filter(|u| u.id.in_query(db.query::<Post>().unwrap().select(|p| p.user_id)))
        .order_by(|u| u.id)
        .select(|u| u.name)
        .to_list()
        .await
        .unwrap();
    assert_eq!(with_posts, vec!["alice", "carol"]);

    let total = db
        .query::<User>()
        .unwrap()
        .select(|_| Expr::<i64>::count_all())
        .first()
        .await
        .unwrap();
    assert_eq!(total, Some(4));
}
