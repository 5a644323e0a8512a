use pretty_assertions::assert_eq;
use skein::Keys;
use tests::{
    logged_sql,
    models::{user, User},
    setup_blog,
};

fn users(count: usize) -> Vec<User> {
    (0..count).map(|i| user(&format!("user {i}"), 20)).collect()
}

#[tokio::test]
async fn bulk_insert_chunks_rows_into_round_trips() {
    let (db, ops_log) = setup_blog().await;

    let rows = users(1201);
    let inserted = db
        .create::<User>()
        .unwrap()
        .bulk(&rows)
        .unwrap()
        .bulk_count(500)
        .unwrap()
        .exec()
        .await
        .unwrap();
    assert_eq!(inserted, 1201);

    let counts = ops_log
        .lock()
        .unwrap()
        .iter()
        .map(|op| op.response.total_count())
        .collect::<Vec<_>>();
    assert_eq!(counts, vec![500, 500, 201]);

    assert_eq!(db.query::<User>().unwrap().count().await.unwrap(), 1201);
}

#[tokio::test]
async fn bulk_insert_uses_the_handle_bulk_count() {
    let (db, ops_log) = tests::setup(|builder| {
        builder.register::<User>().bulk_count(2);
    })
    .await;

    db.create::<User>()
        .unwrap()
        .bulk(&users(5))
        .unwrap()
        .exec()
        .await
        .unwrap();

    assert_eq!(logged_sql(&ops_log).len(), 3);
}

#[tokio::test]
async fn empty_bulk_insert_is_rejected() {
    let (db, _) = setup_blog().await;

    let err = db.create::<User>().unwrap().bulk(&[]).unwrap_err();
    assert!(err.is_invalid_argument());

    let err = db.create::<User>().unwrap().bulk_count(0).unwrap_err();
    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn bulk_delete_chunks_keys() {
    let (db, ops_log) = setup_blog().await;
    db.create::<User>()
        .unwrap()
        .bulk(&users(10))
        .unwrap()
        .exec()
        .await
        .unwrap();
    ops_log.lock().unwrap().clear();

    let deleted = db
        .delete::<User>()
        .unwrap()
        .where_key(Keys::list(1_i64..=7))
        .bulk_count(3)
        .unwrap()
        .exec()
        .await
        .unwrap();
    assert_eq!(deleted, 7);
    assert_eq!(logged_sql(&ops_log).len(), 3);

    assert_eq!(db.query::<User>().unwrap().count().await.unwrap(), 3);
}

#[tokio::test]
async fn bulk_update_runs_one_round_trip() {
    let (db, ops_log) = setup_blog().await;
    db.create::<User>()
        .unwrap()
        .bulk(&users(3))
        .unwrap()
        .exec()
        .await
        .unwrap();

    let mut rows = db.query::<User>().unwrap().to_list().await.unwrap();
    for row in &mut rows {
        row.age += row.id as i32;
    }
    ops_log.lock().unwrap().clear();

    let updated = db
        .update::<User>()
        .unwrap()
        .bulk(&rows)
        .unwrap()
        .exec()
        .await
        .unwrap();
    assert_eq!(updated, 3);

    let ops = ops_log.lock().unwrap().clone();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].response.len(), 3);

    let ages = db
        .query::<User>()
        .unwrap()
        .order_by(|u| u.id)
        .select(|u| u.age)
        .to_list()
        .await
        .unwrap();
    assert_eq!(ages, vec![21, 22, 23]);
}
