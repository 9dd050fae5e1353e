use anyhow::Result;
use rusqlite::Connection;

use quill_types::models::PostStatus;

use crate::Database;
use crate::models::PostRow;
use crate::queries::{OptionalExt, escape_like};

pub struct NewPost<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub excerpt: &'a str,
    pub base_slug: &'a str,
    pub author_id: &'a str,
    pub category_id: &'a str,
    pub tags: &'a str,
    pub status: PostStatus,
    pub featured_image: &'a str,
    pub created_at: &'a str,
}

pub struct UpdatedPost<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub excerpt: &'a str,
    pub category_id: &'a str,
    pub tags: &'a str,
    pub status: PostStatus,
    pub featured_image: &'a str,
    /// New base slug when the title changed; `None` leaves the slug as is.
    pub reslug: Option<&'a str>,
    pub updated_at: &'a str,
}

/// Whitelisted sort fields for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSort {
    CreatedAt,
    UpdatedAt,
    Title,
    Views,
}

impl PostSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(PostSort::CreatedAt),
            "updated_at" => Some(PostSort::UpdatedAt),
            "title" => Some(PostSort::Title),
            "views" => Some(PostSort::Views),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            PostSort::CreatedAt => "p.created_at",
            PostSort::UpdatedAt => "p.updated_at",
            PostSort::Title => "p.title",
            PostSort::Views => "p.views",
        }
    }
}

pub struct PostFilter<'a> {
    /// Case-insensitive substring match over title, content and tags.
    pub search: Option<&'a str>,
    pub category_id: Option<&'a str>,
    /// `None` disables status filtering (admin "all").
    pub status: Option<&'a str>,
    pub sort: PostSort,
    pub descending: bool,
    pub limit: u32,
    pub offset: u32,
}

const POST_COLS: &str = "p.id, p.title, p.content, p.excerpt, p.slug, \
     p.author_id, u.username, p.category_id, c.name, c.slug, \
     p.tags, p.status, p.featured_image, p.views, p.created_at, p.updated_at";

const POST_JOINS: &str = "FROM posts p \
     LEFT JOIN users u ON p.author_id = u.id \
     LEFT JOIN categories c ON p.category_id = c.id";

impl Database {
    /// Insert a post, resolving the slug from `base_slug` by appending
    /// `-1`, `-2`, … until free. The probe loop is an optimization; the
    /// UNIQUE index on `posts.slug` is the safety mechanism — an insert
    /// that loses a race re-enters the loop with the next suffix.
    ///
    /// Returns the resolved slug.
    pub fn create_post(&self, post: &NewPost<'_>) -> Result<String> {
        self.with_conn(|conn| {
            let mut counter: u32 = 0;
            loop {
                let slug = candidate_slug(post.base_slug, counter);
                if slug_taken(conn, &slug, post.id)? {
                    counter += 1;
                    continue;
                }
                match conn.execute(
                    "INSERT INTO posts (id, title, content, excerpt, slug, author_id,
                                        category_id, tags, status, featured_image,
                                        views, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11, ?11)",
                    rusqlite::params![
                        post.id,
                        post.title,
                        post.content,
                        post.excerpt,
                        slug,
                        post.author_id,
                        post.category_id,
                        post.tags,
                        post.status.as_str(),
                        post.featured_image,
                        post.created_at
                    ],
                ) {
                    Ok(_) => return Ok(slug),
                    Err(e) if is_slug_conflict(&e) => counter += 1,
                    Err(e) => return Err(e.into()),
                }
            }
        })
    }

    /// Full-row overwrite after the caller has merged the partial update.
    /// Re-slugs (with the same suffix resolution as inserts) only when
    /// `reslug` carries a new base.
    pub fn update_post(&self, post: &UpdatedPost<'_>) -> Result<bool> {
        self.with_conn(|conn| {
            let Some(base_slug) = post.reslug else {
                let changed = conn.execute(
                    "UPDATE posts SET title = ?1, content = ?2, excerpt = ?3,
                            category_id = ?4, tags = ?5, status = ?6,
                            featured_image = ?7, updated_at = ?8
                     WHERE id = ?9",
                    rusqlite::params![
                        post.title,
                        post.content,
                        post.excerpt,
                        post.category_id,
                        post.tags,
                        post.status.as_str(),
                        post.featured_image,
                        post.updated_at,
                        post.id
                    ],
                )?;
                return Ok(changed > 0);
            };

            let mut counter: u32 = 0;
            loop {
                let slug = candidate_slug(base_slug, counter);
                if slug_taken(conn, &slug, post.id)? {
                    counter += 1;
                    continue;
                }
                match conn.execute(
                    "UPDATE posts SET title = ?1, content = ?2, excerpt = ?3, slug = ?4,
                            category_id = ?5, tags = ?6, status = ?7,
                            featured_image = ?8, updated_at = ?9
                     WHERE id = ?10",
                    rusqlite::params![
                        post.title,
                        post.content,
                        post.excerpt,
                        slug,
                        post.category_id,
                        post.tags,
                        post.status.as_str(),
                        post.featured_image,
                        post.updated_at,
                        post.id
                    ],
                ) {
                    Ok(changed) => return Ok(changed > 0),
                    Err(e) if is_slug_conflict(&e) => counter += 1,
                    Err(e) => return Err(e.into()),
                }
            }
        })
    }

    pub fn get_post_by_id(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, "p.id = ?1", id))
    }

    pub fn get_post_by_slug(&self, slug: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, "p.slug = ?1", slug))
    }

    /// Best-effort view counter: a single atomic UPDATE touching nothing
    /// but `views`. Lost increments under concurrent reads are tolerated.
    pub fn increment_views(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET views = views + 1 WHERE id = ?1",
                [id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Comments on the post go with it (storage-level cascade).
    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Filtered, sorted, paginated listing. Returns the page of rows plus
    /// the total match count.
    pub fn list_posts(&self, filter: &PostFilter<'_>) -> Result<(Vec<PostRow>, u64)> {
        self.with_conn(|conn| {
            let mut clauses: Vec<String> = Vec::new();
            let mut owned: Vec<String> = Vec::new();

            if let Some(status) = filter.status {
                owned.push(status.to_string());
                clauses.push(format!("p.status = ?{}", owned.len()));
            }
            if let Some(category_id) = filter.category_id {
                owned.push(category_id.to_string());
                clauses.push(format!("p.category_id = ?{}", owned.len()));
            }
            if let Some(search) = filter.search {
                let pattern = format!("%{}%", escape_like(search));
                owned.push(pattern.clone());
                owned.push(pattern.clone());
                owned.push(pattern);
                let n = owned.len();
                clauses.push(format!(
                    "(p.title LIKE ?{} ESCAPE '\\' OR p.content LIKE ?{} ESCAPE '\\' \
                      OR p.tags LIKE ?{} ESCAPE '\\')",
                    n - 2,
                    n - 1,
                    n
                ));
            }

            let where_sql = if clauses.is_empty() {
                String::new()
            } else {
                format!(" WHERE {}", clauses.join(" AND "))
            };

            let params: Vec<&dyn rusqlite::types::ToSql> = owned
                .iter()
                .map(|s| s as &dyn rusqlite::types::ToSql)
                .collect();

            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM posts p{}", where_sql),
                params.as_slice(),
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT {} {}{} ORDER BY {} {} LIMIT {} OFFSET {}",
                POST_COLS,
                POST_JOINS,
                where_sql,
                filter.sort.column(),
                if filter.descending { "DESC" } else { "ASC" },
                filter.limit,
                filter.offset
            );
            let mut stmt = conn.prepare(&sql)?;

            let rows = stmt
                .query_map(params.as_slice(), map_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total as u64))
        })
    }
}

fn candidate_slug(base: &str, counter: u32) -> String {
    if counter == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, counter)
    }
}

fn slug_taken(conn: &Connection, slug: &str, exclude_id: &str) -> Result<bool> {
    let hit: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM posts WHERE slug = ?1 AND id != ?2 LIMIT 1",
            rusqlite::params![slug, exclude_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(hit.is_some())
}

fn is_slug_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("posts.slug")
    )
}

fn query_post(conn: &Connection, predicate: &str, value: &str) -> Result<Option<PostRow>> {
    let sql = format!(
        "SELECT {} {} WHERE {}",
        POST_COLS, POST_JOINS, predicate
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt.query_row([value], map_post_row).optional()?;

    Ok(row)
}

fn map_post_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        excerpt: row.get(3)?,
        slug: row.get(4)?,
        author_id: row.get(5)?,
        author_username: row
            .get::<_, Option<String>>(6)?
            .unwrap_or_else(|| "unknown".to_string()),
        category_id: row.get(7)?,
        category_name: row
            .get::<_, Option<String>>(8)?
            .unwrap_or_default(),
        category_slug: row
            .get::<_, Option<String>>(9)?
            .unwrap_or_default(),
        tags: row.get(10)?,
        status: row.get(11)?,
        featured_image: row.get(12)?,
        views: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}
