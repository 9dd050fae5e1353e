use quill_db::models::{CategoryRow, UserRow};
use quill_db::queries::{NewComment, NewPost, PostFilter, PostSort, UpdatedPost};
use quill_db::{Database, foreign_key_violation, unique_violation};
use quill_types::models::{CommentStatus, PostStatus};
use uuid::Uuid;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn seed_user(db: &Database, username: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.create_user(&UserRow {
        id: id.clone(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "argon2-hash-placeholder".to_string(),
        role: "user".to_string(),
        created_at: now(),
    })
    .unwrap();
    id
}

fn seed_category(db: &Database, name: &str, slug: &str) -> String {
    let id = Uuid::new_v4().to_string();
    db.create_category(&CategoryRow {
        id: id.clone(),
        name: name.to_string(),
        description: None,
        slug: slug.to_string(),
        created_at: now(),
    })
    .unwrap();
    id
}

fn insert_post(
    db: &Database,
    title: &str,
    base_slug: &str,
    author_id: &str,
    category_id: &str,
    status: PostStatus,
) -> (String, String) {
    let id = Uuid::new_v4().to_string();
    let created_at = now();
    let slug = db
        .create_post(&NewPost {
            id: &id,
            title,
            content: "body text",
            excerpt: "body text...",
            base_slug,
            author_id,
            category_id,
            tags: "",
            status,
            featured_image: "",
            created_at: &created_at,
        })
        .unwrap();
    (id, slug)
}

fn insert_comment(
    db: &Database,
    content: &str,
    author_id: &str,
    post_id: &str,
    parent: Option<&str>,
    created_at: &str,
) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    db.create_comment(&NewComment {
        id: &id,
        content,
        author_id,
        post_id,
        parent_comment_id: parent,
        status: CommentStatus::Approved,
        created_at,
    })?;
    Ok(id)
}

#[test]
fn slug_collision_appends_numeric_suffixes() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");

    let (_, s0) = insert_post(&db, "My Post", "my-post", &author, &category, PostStatus::Draft);
    let (_, s1) = insert_post(&db, "My Post!", "my-post", &author, &category, PostStatus::Draft);
    let (_, s2) = insert_post(&db, "My Post!!", "my-post", &author, &category, PostStatus::Draft);

    assert_eq!(s0, "my-post");
    assert_eq!(s1, "my-post-1");
    assert_eq!(s2, "my-post-2");
}

#[test]
fn duplicate_title_fails_on_unique_index() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");

    insert_post(&db, "Same Title", "same-title", &author, &category, PostStatus::Draft);

    let id = Uuid::new_v4().to_string();
    let created_at = now();
    let err = db
        .create_post(&NewPost {
            id: &id,
            title: "Same Title",
            content: "other body",
            excerpt: "other body...",
            base_slug: "same-title-again",
            author_id: &author,
            category_id: &category,
            tags: "",
            status: PostStatus::Published,
            featured_image: "",
            created_at: &created_at,
        })
        .unwrap_err();

    assert_eq!(unique_violation(&err), Some("posts.title"));
}

#[test]
fn view_increment_bumps_by_exactly_one() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");
    let (id, slug) =
        insert_post(&db, "Counted", "counted", &author, &category, PostStatus::Published);

    let before = db.get_post_by_slug(&slug).unwrap().unwrap();
    assert_eq!(before.views, 0);
    assert_eq!(before.title, "Counted");
    assert_eq!(before.content, "body text");
    assert_eq!(before.category_slug, "tech");
    assert_eq!(before.author_username, "alice");

    assert!(db.increment_views(&id).unwrap());
    let after = db.get_post_by_slug(&slug).unwrap().unwrap();
    assert_eq!(after.views, before.views + 1);

    // The increment touches nothing else.
    assert_eq!(after.updated_at, before.updated_at);

    assert!(db.get_post_by_slug("no-such-slug").unwrap().is_none());
    assert!(!db.increment_views("no-such-id").unwrap());
}

#[test]
fn unrelated_update_leaves_slug_untouched() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");
    let (id, slug) =
        insert_post(&db, "Stable", "stable", &author, &category, PostStatus::Draft);

    let updated_at = now();
    assert!(
        db.update_post(&UpdatedPost {
            id: &id,
            title: "Stable",
            content: "revised body",
            excerpt: "revised body...",
            category_id: &category,
            tags: "rust,sqlite",
            status: PostStatus::Published,
            featured_image: "",
            reslug: None,
            updated_at: &updated_at,
        })
        .unwrap()
    );

    let row = db.get_post_by_id(&id).unwrap().unwrap();
    assert_eq!(row.slug, slug);
    assert_eq!(row.content, "revised body");
    assert_eq!(row.status, "published");
}

#[test]
fn reslug_on_title_change_resolves_collisions() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");
    insert_post(&db, "Taken", "taken", &author, &category, PostStatus::Draft);
    let (id, _) = insert_post(&db, "Original", "original", &author, &category, PostStatus::Draft);

    let updated_at = now();
    db.update_post(&UpdatedPost {
        id: &id,
        title: "Taken!",
        content: "body text",
        excerpt: "body text...",
        category_id: &category,
        tags: "",
        status: PostStatus::Draft,
        featured_image: "",
        reslug: Some("taken"),
        updated_at: &updated_at,
    })
    .unwrap();

    let row = db.get_post_by_id(&id).unwrap().unwrap();
    assert_eq!(row.slug, "taken-1");
}

#[test]
fn duplicate_comment_suppressed_per_post_only() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");
    let (post_a, _) = insert_post(&db, "First", "first", &author, &category, PostStatus::Published);
    let (post_b, _) = insert_post(&db, "Second", "second", &author, &category, PostStatus::Published);

    let ts = now();
    insert_comment(&db, "nice read", &author, &post_a, None, &ts).unwrap();

    let err = insert_comment(&db, "nice read", &author, &post_a, None, &ts).unwrap_err();
    assert!(unique_violation(&err).is_some_and(|cols| cols.starts_with("comments.")));

    // Same content on a different post is fine.
    insert_comment(&db, "nice read", &author, &post_b, None, &ts).unwrap();
}

#[test]
fn deleting_a_root_cascades_to_its_replies() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let replier = seed_user(&db, "bob");
    let category = seed_category(&db, "Tech", "tech");
    let (post, _) = insert_post(&db, "Thread", "thread", &author, &category, PostStatus::Published);

    let root = insert_comment(&db, "root", &author, &post, None, "2026-01-01T00:00:00+00:00").unwrap();
    let r1 = insert_comment(&db, "reply one", &replier, &post, Some(&root), "2026-01-01T00:00:01+00:00").unwrap();
    let r2 = insert_comment(&db, "reply two", &author, &post, Some(&root), "2026-01-01T00:00:02+00:00").unwrap();

    assert!(db.delete_comment_cascade(&root).unwrap());

    assert!(db.get_comment(&root).unwrap().is_none());
    assert!(db.get_comment(&r1).unwrap().is_none());
    assert!(db.get_comment(&r2).unwrap().is_none());

    let (roots, total) = db.list_root_comments(&post, 10, 0).unwrap();
    assert!(roots.is_empty());
    assert_eq!(total, 0);
}

#[test]
fn thread_listing_orders_roots_desc_replies_asc() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");
    let (post, _) = insert_post(&db, "Thread", "thread", &author, &category, PostStatus::Published);

    let old_root =
        insert_comment(&db, "old root", &author, &post, None, "2026-01-01T00:00:00+00:00").unwrap();
    insert_comment(&db, "new root", &author, &post, None, "2026-01-02T00:00:00+00:00").unwrap();
    insert_comment(&db, "late reply", &author, &post, Some(&old_root), "2026-01-03T00:00:00+00:00")
        .unwrap();
    insert_comment(&db, "early reply", &author, &post, Some(&old_root), "2026-01-01T12:00:00+00:00")
        .unwrap();

    let (roots, total) = db.list_root_comments(&post, 10, 0).unwrap();
    assert_eq!(total, 2);
    assert_eq!(roots[0].content, "new root");
    assert_eq!(roots[1].content, "old root");

    let replies = db.list_replies(&[old_root]).unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].content, "early reply");
    assert_eq!(replies[1].content, "late reply");
}

#[test]
fn rejected_comments_hidden_from_public_listing() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");
    let (post, _) = insert_post(&db, "Thread", "thread", &author, &category, PostStatus::Published);

    let root = insert_comment(&db, "visible", &author, &post, None, "2026-01-01T00:00:00+00:00").unwrap();
    assert!(db.set_comment_status(&root, CommentStatus::Rejected).unwrap());

    let (roots, total) = db.list_root_comments(&post, 10, 0).unwrap();
    assert!(roots.is_empty());
    assert_eq!(total, 0);

    // The moderation queue still sees it.
    let (all, all_total) = db.list_comments_admin(None, 10, 0).unwrap();
    assert_eq!(all_total, 1);
    assert_eq!(all[0].status, "rejected");

    let (rejected, _) = db
        .list_comments_admin(Some(CommentStatus::Rejected), 10, 0)
        .unwrap();
    assert_eq!(rejected.len(), 1);

    let (approved, approved_total) = db
        .list_comments_admin(Some(CommentStatus::Approved), 10, 0)
        .unwrap();
    assert!(approved.is_empty());
    assert_eq!(approved_total, 0);
}

#[test]
fn category_slug_collision_is_not_auto_resolved() {
    let db = Database::open_in_memory().unwrap();
    seed_category(&db, "Rust & Go", "rust-go");

    let err = db
        .create_category(&CategoryRow {
            id: Uuid::new_v4().to_string(),
            name: "Rust Go".to_string(),
            description: None,
            slug: "rust-go".to_string(),
            created_at: now(),
        })
        .unwrap_err();

    assert_eq!(unique_violation(&err), Some("categories.slug"));
}

#[test]
fn deleting_category_with_posts_is_restricted() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");
    insert_post(&db, "Keeps ref", "keeps-ref", &author, &category, PostStatus::Draft);

    let err = db.delete_category(&category).unwrap_err();
    assert!(foreign_key_violation(&err));
}

#[test]
fn deleting_post_removes_its_comments() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Tech", "tech");
    let (post, _) = insert_post(&db, "Doomed", "doomed", &author, &category, PostStatus::Published);
    let root = insert_comment(&db, "gone soon", &author, &post, None, &now()).unwrap();

    assert!(db.delete_post(&post).unwrap());
    assert!(db.get_comment(&root).unwrap().is_none());
}

#[test]
fn listing_filters_sorts_and_paginates() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let tech = seed_category(&db, "Tech", "tech");
    let travel = seed_category(&db, "Travel", "travel");

    for (title, slug, category, status) in [
        ("Rust Patterns", "rust-patterns", &tech, PostStatus::Published),
        ("Going Async", "going-async", &tech, PostStatus::Published),
        ("Hidden Draft", "hidden-draft", &tech, PostStatus::Draft),
        ("Packing Light", "packing-light", &travel, PostStatus::Published),
    ] {
        insert_post(&db, title, slug, &author, category, status);
    }

    let published = PostFilter {
        search: None,
        category_id: None,
        status: Some("published"),
        sort: PostSort::Title,
        descending: false,
        limit: 10,
        offset: 0,
    };
    let (rows, total) = db.list_posts(&published).unwrap();
    assert_eq!(total, 3);
    let titles: Vec<_> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["Going Async", "Packing Light", "Rust Patterns"]);

    // "all" drops the status filter.
    let all = PostFilter { status: None, ..published };
    let (_, total_all) = db.list_posts(&all).unwrap();
    assert_eq!(total_all, 4);

    let tech_only = PostFilter {
        category_id: Some(&tech),
        status: Some("published"),
        ..published
    };
    let (rows, total) = db.list_posts(&tech_only).unwrap();
    assert_eq!(total, 2);
    assert!(rows.iter().all(|r| r.category_slug == "tech"));

    let searched = PostFilter {
        search: Some("rust"),
        status: Some("published"),
        ..published
    };
    let (rows, total) = db.list_posts(&searched).unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].title, "Rust Patterns");

    let page_two = PostFilter {
        limit: 2,
        offset: 2,
        status: Some("published"),
        ..published
    };
    let (rows, total) = db.list_posts(&page_two).unwrap();
    assert_eq!(total, 3);
    assert_eq!(rows.len(), 1);
}

#[test]
fn search_treats_like_metacharacters_literally() {
    let db = Database::open_in_memory().unwrap();
    let author = seed_user(&db, "alice");
    let category = seed_category(&db, "Deals", "deals");
    insert_post(&db, "100% Rust", "100-rust", &author, &category, PostStatus::Published);
    insert_post(&db, "1000 Rusts", "1000-rusts", &author, &category, PostStatus::Published);

    let filter = PostFilter {
        search: Some("100%"),
        category_id: None,
        status: Some("published"),
        sort: PostSort::CreatedAt,
        descending: true,
        limit: 10,
        offset: 0,
    };
    let (rows, total) = db.list_posts(&filter).unwrap();
    assert_eq!(total, 1);
    assert_eq!(rows[0].title, "100% Rust");
}
