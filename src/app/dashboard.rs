//! Dashboard counters for the admin console.

use crate::error::AppError;
use crate::infra::get_connection;
use crate::infra::DbPool;
use serde::Serialize;

const RECENT_POSTS: i64 = 5;

#[derive(Debug, Serialize)]
pub struct RecentPostDto {
    pub id: i64,
    pub title_zh: String,
    pub title_en: String,
    pub published: bool,
    pub updated_at: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_posts: i64,
    pub published_posts: i64,
    pub draft_posts: i64,
    pub total_views: i64,
    pub total_categories: i64,
    pub total_media: i64,
    pub media_bytes: i64,
    pub recent_posts: Vec<RecentPostDto>,
}

pub fn dashboard_stats(pool: &DbPool) -> Result<DashboardStats, AppError> {
    let conn = get_connection(pool);

    let (total_posts, published_posts, total_views): (i64, i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(published), 0), COALESCE(SUM(views), 0) FROM posts",
        [],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )?;
    let total_categories: i64 =
        conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    let (total_media, media_bytes): (i64, i64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM media",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT id, title_zh, title_en, published, updated_at FROM posts ORDER BY updated_at DESC, id DESC LIMIT ?1",
    )?;
    let recent_posts = stmt
        .query_map([RECENT_POSTS], |r| {
            Ok(RecentPostDto {
                id: r.get(0)?,
                title_zh: r.get(1)?,
                title_en: r.get(2)?,
                published: r.get::<_, i32>(3)? != 0,
                updated_at: r.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DashboardStats {
        total_posts,
        published_posts,
        draft_posts: total_posts - published_posts,
        total_views,
        total_categories,
        total_media,
        media_bytes,
        recent_posts,
    })
}
