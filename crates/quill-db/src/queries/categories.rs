use anyhow::Result;
use rusqlite::Connection;

use crate::Database;
use crate::models::CategoryRow;
use crate::queries::OptionalExt;

impl Database {
    /// Category slugs are not auto-resolved: a colliding slug (or name)
    /// surfaces as a UNIQUE constraint failure.
    pub fn create_category(&self, category: &CategoryRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO categories (id, name, description, slug, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    category.id,
                    category.name,
                    category.description,
                    category.slug,
                    category.created_at
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, slug, created_at
                 FROM categories ORDER BY name",
            )?;

            let rows = stmt
                .query_map([], map_category_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_category_by_id(&self, id: &str) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| query_category(conn, "id = ?1", id))
    }

    pub fn get_category_by_slug(&self, slug: &str) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| query_category(conn, "slug = ?1", slug))
    }

    pub fn update_category(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        slug: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE categories SET name = ?1, description = ?2, slug = ?3 WHERE id = ?4",
                rusqlite::params![name, description, slug, id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Fails with a FOREIGN KEY violation while posts still reference the
    /// category.
    pub fn delete_category(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM categories WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn query_category(conn: &Connection, predicate: &str, value: &str) -> Result<Option<CategoryRow>> {
    let sql = format!(
        "SELECT id, name, description, slug, created_at FROM categories WHERE {}",
        predicate
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt.query_row([value], map_category_row).optional()?;

    Ok(row)
}

fn map_category_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        slug: row.get(3)?,
        created_at: row.get(4)?,
    })
}
