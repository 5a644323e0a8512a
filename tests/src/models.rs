skein::entity! {
    table = "users",
    fields = UserFields,
    key = [id],
    auto_increment = [id],
    has_many = [posts: Post [id => user_id]],
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct User {
        pub id: i64,
        pub name: String,
        pub email: Option<String>,
        pub age: i32,
    }
}

skein::entity! {
    table = "posts",
    fields = PostFields,
    key = [id],
    auto_increment = [id],
    has_many = [comments: Comment [id => post_id]],
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Post {
        pub id: i64,
        pub user_id: i64,
        pub title: String,
        pub views: i32,
    }
}

skein::entity! {
    table = "comments",
    fields = CommentFields,
    key = [id],
    auto_increment = [id],
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Comment {
        pub id: i64,
        pub post_id: i64,
        pub body: String,
    }
}

/// A user with every member but the generated key set.
pub fn user(name: &str, age: i32) -> User {
    User {
        name: name.to_string(),
        age,
        ..User::default()
    }
}

pub fn post(user_id: i64, title: &str) -> Post {
    Post {
        user_id,
        title: title.to_string(),
        ..Post::default()
    }
}
