use anyhow::Result;

use quill_types::models::CommentStatus;

use crate::Database;
use crate::models::CommentRow;
use crate::queries::OptionalExt;

pub struct NewComment<'a> {
    pub id: &'a str,
    pub content: &'a str,
    pub author_id: &'a str,
    pub post_id: &'a str,
    pub parent_comment_id: Option<&'a str>,
    pub status: CommentStatus,
    pub created_at: &'a str,
}

const COMMENT_COLS: &str = "cm.id, cm.content, cm.author_id, u.username, \
     cm.post_id, p.title, p.slug, cm.parent_comment_id, cm.status, cm.created_at";

const COMMENT_JOINS: &str = "FROM comments cm \
     LEFT JOIN users u ON cm.author_id = u.id \
     LEFT JOIN posts p ON cm.post_id = p.id";

impl Database {
    /// A duplicate (author, post, content) insert fails on the UNIQUE
    /// index — the storage constraint, not a pre-check, settles races.
    pub fn create_comment(&self, comment: &NewComment<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, content, author_id, post_id,
                                       parent_comment_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    comment.id,
                    comment.content,
                    comment.author_id,
                    comment.post_id,
                    comment.parent_comment_id,
                    comment.status.as_str(),
                    comment.created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} {} WHERE cm.id = ?1",
                COMMENT_COLS, COMMENT_JOINS
            );
            let mut stmt = conn.prepare(&sql)?;

            let row = stmt.query_row([id], map_comment_row).optional()?;

            Ok(row)
        })
    }

    /// Approved root comments of a post, newest first, plus the total
    /// root count for pagination.
    pub fn list_root_comments(
        &self,
        post_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<CommentRow>, u64)> {
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM comments
                 WHERE post_id = ?1 AND status = 'approved' AND parent_comment_id IS NULL",
                [post_id],
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT {} {}
                 WHERE cm.post_id = ?1 AND cm.status = 'approved'
                       AND cm.parent_comment_id IS NULL
                 ORDER BY cm.created_at DESC
                 LIMIT {} OFFSET {}",
                COMMENT_COLS, COMMENT_JOINS, limit, offset
            );
            let mut stmt = conn.prepare(&sql)?;

            let rows = stmt
                .query_map([post_id], map_comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total as u64))
        })
    }

    /// Batch-fetch approved replies for a set of root comment IDs, oldest
    /// first.
    pub fn list_replies(&self, root_ids: &[String]) -> Result<Vec<CommentRow>> {
        if root_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=root_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT {} {}
                 WHERE cm.parent_comment_id IN ({}) AND cm.status = 'approved'
                 ORDER BY cm.created_at ASC",
                COMMENT_COLS,
                COMMENT_JOINS,
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = root_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), map_comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Unfiltered (or status-filtered) listing across all posts, newest
    /// first — the moderation queue.
    pub fn list_comments_admin(
        &self,
        status: Option<CommentStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<(Vec<CommentRow>, u64)> {
        self.with_conn(|conn| {
            let status_str = status.as_ref().map(|s| s.as_str());
            let (where_sql, params): (&str, Vec<&dyn rusqlite::types::ToSql>) = match &status_str {
                Some(s) => (" WHERE cm.status = ?1", vec![s as &dyn rusqlite::types::ToSql]),
                None => ("", vec![]),
            };

            let total: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM comments cm{}",
                    where_sql
                ),
                params.as_slice(),
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT {} {}{} ORDER BY cm.created_at DESC LIMIT {} OFFSET {}",
                COMMENT_COLS, COMMENT_JOINS, where_sql, limit, offset
            );
            let mut stmt = conn.prepare(&sql)?;

            let rows = stmt
                .query_map(params.as_slice(), map_comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total as u64))
        })
    }

    /// Editing into content the author already posted on the same post
    /// trips the duplicate constraint, same as on create.
    pub fn update_comment_content(&self, id: &str, content: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET content = ?1 WHERE id = ?2",
                rusqlite::params![content, id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_comment_status(&self, id: &str, status: CommentStatus) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE comments SET status = ?1 WHERE id = ?2",
                rusqlite::params![status.as_str(), id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Single-statement delete; replies go with the root through the
    /// ON DELETE CASCADE rule on `parent_comment_id`.
    pub fn delete_comment_cascade(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn map_comment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        content: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "unknown".to_string()),
        post_id: row.get(4)?,
        post_title: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        post_slug: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        parent_comment_id: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
    })
}
