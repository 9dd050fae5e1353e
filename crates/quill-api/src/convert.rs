//! Row → response conversion. Stored fields are parsed defensively: a
//! corrupt value is logged and replaced with a default rather than
//! failing the whole response.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use quill_db::models::{CategoryRow, CommentRow, PostRow};
use quill_types::api::{
    AuthorRef, CategoryRef, CategoryResponse, CommentResponse, PostRef, PostResponse,
};
use quill_types::models::{CommentStatus, PostStatus};

pub(crate) fn parse_uuid(value: &str, what: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, value, e);
        Uuid::default()
    })
}

pub(crate) fn parse_ts(value: &str, what: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite can hand back "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt {} '{}': {}", what, value, e);
            DateTime::default()
        })
}

/// Split a raw comma-delimited tag string into trimmed, non-empty tags.
pub(crate) fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn post_response(row: PostRow) -> PostResponse {
    PostResponse {
        id: parse_uuid(&row.id, "post id"),
        title: row.title,
        content: row.content,
        excerpt: row.excerpt,
        slug: row.slug,
        author: AuthorRef {
            id: parse_uuid(&row.author_id, "author id"),
            username: row.author_username,
        },
        category: CategoryRef {
            id: parse_uuid(&row.category_id, "category id"),
            name: row.category_name,
            slug: row.category_slug,
        },
        tags: split_tags(&row.tags),
        status: PostStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt post status '{}' on post '{}'", row.status, row.id);
            PostStatus::Draft
        }),
        featured_image: row.featured_image,
        views: row.views,
        created_at: parse_ts(&row.created_at, "post created_at"),
        updated_at: parse_ts(&row.updated_at, "post updated_at"),
    }
}

pub(crate) fn category_response(row: CategoryRow) -> CategoryResponse {
    CategoryResponse {
        id: parse_uuid(&row.id, "category id"),
        name: row.name,
        description: row.description,
        slug: row.slug,
        created_at: parse_ts(&row.created_at, "category created_at"),
    }
}

pub(crate) fn comment_response(row: CommentRow, replies: Vec<CommentResponse>) -> CommentResponse {
    CommentResponse {
        id: parse_uuid(&row.id, "comment id"),
        content: row.content,
        author: AuthorRef {
            id: parse_uuid(&row.author_id, "author id"),
            username: row.author_username,
        },
        post: PostRef {
            id: parse_uuid(&row.post_id, "post id"),
            title: row.post_title,
            slug: row.post_slug,
        },
        parent_comment_id: row
            .parent_comment_id
            .as_deref()
            .map(|id| parse_uuid(id, "parent comment id")),
        status: CommentStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt comment status '{}' on comment '{}'", row.status, row.id);
            CommentStatus::Pending
        }),
        created_at: parse_ts(&row.created_at, "comment created_at"),
        replies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_tags() {
        assert_eq!(split_tags("rust, web ,  sqlite"), ["rust", "web", "sqlite"]);
        assert_eq!(split_tags(""), Vec::<String>::new());
        assert_eq!(split_tags("solo"), ["solo"]);
        assert_eq!(split_tags("a,,b, "), ["a", "b"]);
    }

    #[test]
    fn parses_sqlite_naive_timestamps() {
        let ts = parse_ts("2026-03-01 10:30:00", "test ts");
        assert_eq!(ts.to_rfc3339(), "2026-03-01T10:30:00+00:00");

        let rfc = parse_ts("2026-03-01T10:30:00+00:00", "test ts");
        assert_eq!(rfc, ts);
    }
}
