use pretty_assertions::assert_eq;
use skein::{Db, JoinKind, Record};
use tests::{
    models::{post, user, Post, User},
    setup_blog,
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
    for (user_id, title, views) in [(1, "hello", 10), (1, "again", 5), (3, "notes", 7)] {
        db.create::<Post>()
            .unwrap()
            .with(&Post {
                views,
                ..post(user_id, title)
            })
            .exec()
            .await
            .unwrap();
    }
}

async fn names(query: skein::Select<String>) -> Vec<String> {
    query.to_list().await.unwrap()
}

#[tokio::test]
async fn filter_order_and_paging() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    let query = db
        .query::<User>()
        .unwrap()
        .filter(|u| u.age.gt(20) & u.name.ne("carol"))
        .order_by_desc(|u| u.age);
    assert_eq!(names(query.select(|u| u.name)).await, vec!["alice", "bob"]);

    let query = db
        .query::<User>()
        .unwrap()
        .order_by(|u| u.name)
        .skip(1)
        .take(2);
    assert_eq!(names(query.select(|u| u.name)).await, vec!["bob", "carol"]);

    let query = db
        .query::<User>()
        .unwrap()
        .filter(|u| u.age.lt(20) | u.age.gt(40))
        .order_by(|u| u.name);
    assert_eq!(names(query.select(|u| u.name)).await, vec!["carol", "dave"]);

    let query = db
        .query::<User>()
        .unwrap()
        .filter(|u| !u.age.in_list([25, 30]))
        .order_by(|u| u.name);
    assert_eq!(names(query.select(|u| u.name)).await, vec!["carol", "dave"]);
}

#[tokio::test]
async fn string_functions() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    let query = db.query::<User>().unwrap().filter(|u| u.name.contains("ar"));
    assert_eq!(names(query.select(|u| u.name)).await, vec!["carol"]);

    let query = db.query::<User>().unwrap().filter(|u| u.name.starts_with("da"));
    assert_eq!(names(query.select(|u| u.name.upper())).await, vec!["DAVE"]);

    let query = db.query::<User>().unwrap().filter(|u| u.name.ends_with("ce"));
    assert_eq!(names(query.select(|u| u.name)).await, vec!["alice"]);

    let lengths = db
        .query::<User>()
        .unwrap()
        .order_by(|u| u.name)
        .select(|u| u.name.length())
        .to_list()
        .await
        .unwrap();
    assert_eq!(lengths, vec![5, 3, 5, 4]);
}

#[tokio::test]
async fn null_checks_and_coalesce() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    db.update::<User>()
        .unwrap()
        .set_field(|u| u.email.assign(Some("bob@example.com".to_string())))
        .unwrap()
        .filter(|u| u.name.eq("bob"))
        .exec()
        .await
        .unwrap();

    let query = db.query::<User>().unwrap().filter(|u| u.email.is_not_null());
    assert_eq!(names(query.select(|u| u.name)).await, vec!["bob"]);
    assert_eq!(
        db.query::<User>()
            .unwrap()
            .filter(|u| u.email.is_null())
            .count()
            .await
            .unwrap(),
        3
    );

    let emails = db
        .query::<User>()
        .unwrap()
        .filter(|u| u.age.lt(26))
        .order_by(|u| u.name)
        .select(|u| u.email.coalesce(Some("none".to_string())))
        .to_list()
        .await
        .unwrap();
    assert_eq!(
        emails,
        vec![Some("bob@example.com".to_string()), Some("none".to_string())]
    );
}

#[tokio::test]
async fn joins_read_the_root_entity() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    let titles = db
        .query::<User>()
        .unwrap()
        .inner_join::<Post>(|(u, p)| u.id.eq(&p.user_id))
        .unwrap()
        .filter(|(u, _)| u.name.eq("alice"))
        .order_by(|(_, p)| p.title)
        .select(|(_, p)| p.title)
        .to_list()
        .await
        .unwrap();
    assert_eq!(titles, vec!["again", "hello"]);

    let authors = db
        .query::<User>()
        .unwrap()
        .inner_join::<Post>(|(u, p)| u.id.eq(&p.user_id))
        .unwrap()
        .filter(|(_, p)| p.views.ge(7))
        .order_by(|(u, _)| u.name)
        .to_list()
        .await
        .unwrap();
    let authors = authors.into_iter().map(|u| u.name).collect::<Vec<_>>();
    assert_eq!(authors, vec!["alice", "carol"]);

    let without_posts = db
        .query::<User>()
        .unwrap()
        .left_join::<Post>(|(u, p)| u.id.eq(&p.user_id))
        .unwrap()
        .filter(|(_, p)| p.id.is_null())
        .order_by(|(u, _)| u.name)
        .select(|(u, _)| u.name)
        .to_list()
        .await
        .unwrap();
    assert_eq!(without_posts, vec!["bob", "dave"]);
}

#[tokio::test]
async fn aggregates_with_group_by() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    let prolific = db
        .query::<Post>()
        .unwrap()
        .group_by(|p| p.user_id)
        .having(|p| p.id.count().gt(1_i64))
        .select(|p| p.user_id)
        .to_list()
        .await
        .unwrap();
    assert_eq!(prolific, vec![1]);

    let views = db
        .query::<Post>()
        .unwrap()
        .select(|p| p.views.sum())
        .first()
        .await
        .unwrap();
    assert_eq!(views, Some(22));

    let authors = db
        .query::<Post>()
        .unwrap()
        .select(|p| p.user_id.count_distinct())
        .first()
        .await
        .unwrap();
    assert_eq!(authors, Some(2));

    let mut distinct = db
        .query::<Post>()
        .unwrap()
        .select(|p| p.user_id)
        .distinct()
        .to_list()
        .await
        .unwrap();
    distinct.sort();
    assert_eq!(distinct, vec![1, 3]);
}

#[tokio::test]
async fn union_and_common_table_expression() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    let young = db.query::<User>().unwrap().filter(|u| u.age.lt(20));
    let old = db.query::<User>().unwrap().filter(|u| u.age.gt(40));
    let mut both = young
        .union(old)
        .to_list()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect::<Vec<_>>();
    both.sort();
    assert_eq!(both, vec!["carol", "dave"]);

    let grown = db
        .query::<User>()
        .unwrap()
        .filter(|u| u.age.ge(25))
        .from_with("grown")
        .filter(|u| u.age.lt(35))
        .order_by(|u| u.name);
    assert_eq!(names(grown.select(|u| u.name)).await, vec!["alice", "bob"]);
}

#[tokio::test]
async fn insert_from_query() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    let inserted = db
        .create::<Post>()
        .unwrap()
        .from_query(
            db.query::<User>()
                .unwrap()
                .filter(|u| u.age.gt(40))
                .select_record::<Post>(|u| {
                    Record::new()
                        .field("user_id", u.id)
                        .field("title", u.name)
                        .field("views", u.age)
                }),
        )
        .exec()
        .await
        .unwrap();
    assert_eq!(inserted, 1);

    let post = db
        .query::<Post>()
        .unwrap()
        .filter(|p| p.title.eq("carol"))
        .first()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(post.user_id, 3);
    assert_eq!(post.views, 41);
}

#[tokio::test]
async fn update_from_a_joined_table() {
    let (db, _) = setup_blog().await;
    seed(&db).await;

    let updated = db
        .update::<Post>()
        .unwrap()
        .join::<User>(JoinKind::Inner, |(p, u)| p.user_id.eq(&u.id))
        .unwrap()
        .set(|(p, u)| vec![p.views.assign(u.age)])
        .unwrap()
        .filter(|(_, u)| u.name.eq("carol"))
        .exec()
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let views = db
        .query::<Post>()
        .unwrap()
        .filter(|p| p.title.eq("notes"))
        .select(|p| p.views)
        .first()
        .await
        .unwrap();
    assert_eq!(views, Some(41));
}
