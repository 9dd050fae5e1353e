use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'user',
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS categories (
            id          TEXT PRIMARY KEY,
            name        TEXT NOT NULL UNIQUE,
            description TEXT,
            slug        TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS posts (
            id              TEXT PRIMARY KEY,
            title           TEXT NOT NULL UNIQUE,
            content         TEXT NOT NULL,
            excerpt         TEXT NOT NULL DEFAULT '',
            slug            TEXT NOT NULL UNIQUE,
            author_id       TEXT NOT NULL REFERENCES users(id),
            category_id     TEXT NOT NULL REFERENCES categories(id),
            tags            TEXT NOT NULL DEFAULT '',
            status          TEXT NOT NULL DEFAULT 'draft',
            featured_image  TEXT NOT NULL DEFAULT '',
            views           INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_status
            ON posts(status, created_at);
        CREATE INDEX IF NOT EXISTS idx_posts_category
            ON posts(category_id, status, created_at);

        -- (author, post, content) unique: a user cannot post byte-identical
        -- content twice on the same post.
        CREATE TABLE IF NOT EXISTS comments (
            id                 TEXT PRIMARY KEY,
            content            TEXT NOT NULL,
            author_id          TEXT NOT NULL REFERENCES users(id),
            post_id            TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            parent_comment_id  TEXT REFERENCES comments(id) ON DELETE CASCADE,
            status             TEXT NOT NULL DEFAULT 'approved',
            created_at         TEXT NOT NULL,
            UNIQUE(author_id, post_id, content)
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON comments(post_id, status, created_at);
        CREATE INDEX IF NOT EXISTS idx_comments_parent
            ON comments(parent_comment_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
