use tests::{
    models::{user, User},
    setup_blog,
};

fn assert_sync_send<T: Send>(val: T) -> T {
    val
}

#[tokio::test]
async fn futures_can_be_spawned() {
    let (db, _) = setup_blog().await;

    let create = db.create::<User>().unwrap().with(&user("alice", 30));
    let id = tokio::spawn(create.exec_identity()).await.unwrap().unwrap();

    let query = db.query::<User>().unwrap().include(User::posts()).unwrap();
    let res = assert_sync_send(query.get(id)).await.unwrap();
    assert_eq!(res.name, "alice");

    let handle = db.clone();
    let count = tokio::spawn(async move { handle.query::<User>().unwrap().count().await })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(count, 1);
}
