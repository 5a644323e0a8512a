use pretty_assertions::assert_eq;
use skein::Db;
use tests::{
    logged_sql,
    models::{post, user, Comment, Post, User},
    setup_blog,
};

async fn seed(db: &Db) {
    for name in ["alice", "bob", "carol"] {
        db.create::<User>()
            .unwrap()
            .with(&user(name, 30))
            .exec()
            .await
            .unwrap();
    }
    for (user_id, title) in [(1, "first"), (1, "second"), (3, "third")] {
        db.create::<Post>()
            .unwrap()
            .with(&post(user_id, title))
            .exec()
            .await
            .unwrap();
    }
    for (post_id, body) in [(1, "nice"), (1, "agreed"), (3, "hmm")] {
        db.create::<Comment>()
            .unwrap()
            .with(&Comment {
                post_id,
                body: body.to_string(),
                ..Comment::default()
            })
            .exec()
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn children_are_grafted_onto_parents() {
    let (db, ops_log) = setup_blog().await;
    seed(&db).await;
    ops_log.lock().unwrap().clear();

    let users = db
        .query::<User>()
        .unwrap()
        .include(User::posts())
        .unwrap()
        .order_by(|u| u.id)
        .to_list()
        .await
        .unwrap();

    // The rows, then the children of every row
    assert_eq!(logged_sql(&ops_log).len(), 2);

    let titles = users
        .iter()
        .map(|u| u.posts.iter().map(|p| p.title.as_str()).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec![vec!["first", "second"], vec![], vec!["third"]]);
}

#[tokio::test]
async fn repeated_parents_each_receive_their_children() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    // alice joins both of her posts, so she appears twice
    let users = db
        .query::<User>()
        .unwrap()
        .include(User::posts())
        .unwrap()
        .inner_join::<Post>(|(u, p)| u.id.eq(&p.user_id))
        .unwrap()
        .filter(|(u, _)| u.name.eq("alice"))
        .to_list()
        .await
        .unwrap();

    let counts = users.iter().map(|u| u.posts.len()).collect::<Vec<_>>();
    assert_eq!(counts, vec![2, 2]);
}

#[tokio::test]
async fn nested_includes_load_in_the_same_round_trip() {
    let (db, ops_log) = setup_blog().await;
    seed(&db).await;
    ops_log.lock().unwrap().clear();

    let alice = db
        .query::<User>()
        .unwrap()
        .include(User::posts().then(Post::comments()))
        .unwrap()
        .filter(|u| u.name.eq("alice"))
        .first()
        .await
        .unwrap()
        .unwrap();

    let ops = ops_log.lock().unwrap().clone();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[1].response.len(), 2);

    assert_eq!(alice.posts.len(), 2);
    let mut bodies = alice.posts[0]
        .comments
        .iter()
        .map(|c| c.body.clone())
        .collect::<Vec<_>>();
    bodies.sort();
    assert_eq!(bodies, vec!["agreed", "nice"]);
    assert!(alice.posts[1].comments.is_empty());
}

#[tokio::test]
async fn includes_are_skipped_without_rows() {
    let (db, ops_log) = setup_blog().await;
    seed(&db).await;
    ops_log.lock().unwrap().clear();

    let users = db
        .query::<User>()
        .unwrap()
        .include(User::posts())
        .unwrap()
        .filter(|u| u.name.eq("nobody"))
        .to_list()
        .await
        .unwrap();

    assert!(users.is_empty());
    assert_eq!(logged_sql(&ops_log).len(), 1);
}

#[tokio::test]
async fn includes_of_several_queries_share_a_round_trip() {
    let (db, ops_log) = setup_blog().await;
    seed(&db).await;
    ops_log.lock().unwrap().clear();

    let mut multi = db.multiple_query();
    let alice = multi.first(
        db.query::<User>()
            .unwrap()
            .include(User::posts())
            .unwrap()
            .filter(|u| u.name.eq("alice")),
    );
    let posts = multi.to_list(
        db.query::<Post>()
            .unwrap()
            .include(Post::comments())
            .unwrap()
            .order_by(|p| p.id),
    );
    let mut results = multi.execute().await.unwrap();

    assert_eq!(logged_sql(&ops_log).len(), 2);
    assert_eq!(results.take(alice).unwrap().unwrap().posts.len(), 2);

    let comment_counts = results
        .take(posts)
        .unwrap()
        .iter()
        .map(|p| p.comments.len())
        .collect::<Vec<_>>();
    assert_eq!(comment_counts, vec![2, 0, 1]);
}
