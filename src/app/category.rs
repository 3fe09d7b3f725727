//! Category listing. Categories are seeded and read-only.

use crate::error::AppError;
use crate::infra::get_connection;
use crate::infra::DbPool;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: i64,
    pub slug: String,
    pub name_zh: String,
    pub name_en: String,
    pub description: String,
    /// Posts whose category string matches this slug.
    pub post_count: i64,
}

pub fn category_list(pool: &DbPool, include_unpublished: bool) -> Result<Vec<CategoryDto>, AppError> {
    let conn = get_connection(pool);
    let mut stmt = conn.prepare(
        "SELECT c.id, c.slug, c.name_zh, c.name_en, c.description, \
         (SELECT COUNT(*) FROM posts p WHERE p.category = c.slug AND (?1 = 1 OR p.published = 1)) \
         FROM categories c ORDER BY c.sort_order, c.id",
    )?;
    let rows = stmt.query_map([include_unpublished as i32], |r| {
        Ok(CategoryDto {
            id: r.get(0)?,
            slug: r.get(1)?,
            name_zh: r.get(2)?,
            name_en: r.get(3)?,
            description: r.get(4)?,
            post_count: r.get(5)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
