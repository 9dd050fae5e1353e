/// Database row types — these map directly to SQLite rows.
/// Distinct from quill-types API models to keep the DB layer independent;
/// rows carry the JOINed reference fields (author username, category
/// name/slug, post title/slug) the API layer populates responses with.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub slug: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub slug: String,
    pub author_id: String,
    pub author_username: String,
    pub category_id: String,
    pub category_name: String,
    pub category_slug: String,
    pub tags: String,
    pub status: String,
    pub featured_image: String,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub author_username: String,
    pub post_id: String,
    pub post_title: String,
    pub post_slug: String,
    pub parent_comment_id: Option<String>,
    pub status: String,
    pub created_at: String,
}
