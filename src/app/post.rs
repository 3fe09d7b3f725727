//! Post use cases: list, get, create, update, delete.

use crate::app::pagination::{PageParams, Pagination};
use crate::app::slug::slugify;
use crate::error::{AppError, MSG_SLUG_TAKEN};
use crate::infra::get_connection;
use crate::infra::DbPool;
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

const POST_COLUMNS: &str = "p.id, p.title_zh, p.title_en, p.slug_zh, p.slug_en, p.content_zh, p.content_en, \
     p.excerpt_zh, p.excerpt_en, p.category, p.tags, p.cover_image, p.published, p.featured, \
     p.author_id, p.views, p.created_at, p.updated_at, p.published_at";

#[derive(Debug, Clone, Serialize)]
pub struct PostDto {
    pub id: i64,
    pub title_zh: String,
    pub title_en: String,
    pub slug_zh: String,
    pub slug_en: String,
    pub content_zh: String,
    pub content_en: String,
    pub excerpt_zh: String,
    pub excerpt_en: String,
    pub category: String,
    pub tags: Vec<String>,
    pub cover_image: Option<String>,
    pub published: bool,
    pub featured: bool,
    pub author_id: Option<i64>,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
    pub published_at: Option<String>,
}

/// Body of both create and update: updates replace every field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostReq {
    #[serde(default)]
    pub title_zh: String,
    #[serde(default)]
    pub title_en: String,
    pub slug_zh: Option<String>,
    pub slug_en: Option<String>,
    #[serde(default)]
    pub content_zh: String,
    #[serde(default)]
    pub content_en: String,
    pub excerpt_zh: Option<String>,
    pub excerpt_en: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover_image: Option<String>,
    pub published: Option<bool>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostListReq {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub category: Option<String>,
    pub published: Option<bool>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostListPage {
    pub posts: Vec<PostDto>,
    pub pagination: Pagination,
}

/// Validated and normalised post fields, ready to bind.
struct PostFields {
    title_zh: String,
    title_en: String,
    slug_zh: String,
    slug_en: String,
    content_zh: String,
    content_en: String,
    excerpt_zh: String,
    excerpt_en: String,
    category: String,
    tags_json: String,
    cover_image: Option<String>,
    published: bool,
    featured: bool,
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(v.to_string())
}

fn slug_or_title(slug: Option<&str>, title: &str, field: &str) -> Result<String, AppError> {
    let source = slug.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(title);
    let slug = slugify(source);
    if slug.is_empty() {
        return Err(AppError::Validation(format!("{} cannot be derived", field)));
    }
    Ok(slug)
}

fn normalize(req: PostReq) -> Result<PostFields, AppError> {
    let title_zh = required(&req.title_zh, "title_zh")?;
    let title_en = required(&req.title_en, "title_en")?;
    let content_zh = required(&req.content_zh, "content_zh")?;
    let content_en = required(&req.content_en, "content_en")?;
    let slug_zh = slug_or_title(req.slug_zh.as_deref(), &title_zh, "slug_zh")?;
    let slug_en = slug_or_title(req.slug_en.as_deref(), &title_en, "slug_en")?;

    let mut tags: Vec<String> = Vec::new();
    for tag in req.tags.unwrap_or_default() {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    let tags_json =
        serde_json::to_string(&tags).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(PostFields {
        title_zh,
        title_en,
        slug_zh,
        slug_en,
        content_zh,
        content_en,
        excerpt_zh: req.excerpt_zh.unwrap_or_default().trim().to_string(),
        excerpt_en: req.excerpt_en.unwrap_or_default().trim().to_string(),
        category: req.category.unwrap_or_default().trim().to_string(),
        tags_json,
        cover_image: req.cover_image.filter(|s| !s.trim().is_empty()),
        published: req.published.unwrap_or(false),
        featured: req.featured.unwrap_or(false),
    })
}

fn row_to_post(r: &Row<'_>) -> rusqlite::Result<PostDto> {
    let tags_json: String = r.get(10)?;
    Ok(PostDto {
        id: r.get(0)?,
        title_zh: r.get(1)?,
        title_en: r.get(2)?,
        slug_zh: r.get(3)?,
        slug_en: r.get(4)?,
        content_zh: r.get(5)?,
        content_en: r.get(6)?,
        excerpt_zh: r.get(7)?,
        excerpt_en: r.get(8)?,
        category: r.get(9)?,
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        cover_image: r.get(11)?,
        published: r.get::<_, i32>(12)? != 0,
        featured: r.get::<_, i32>(13)? != 0,
        author_id: r.get(14)?,
        views: r.get(15)?,
        created_at: r.get(16)?,
        updated_at: r.get(17)?,
        published_at: r.get(18)?,
    })
}

/// A slug may not be used by another post in either language column.
fn ensure_slugs_free(
    conn: &Connection,
    fields: &PostFields,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let clash: Option<i64> = conn
        .query_row(
            "SELECT id FROM posts WHERE (slug_zh IN (?1, ?2) OR slug_en IN (?1, ?2)) AND id <> ?3 LIMIT 1",
            params![&fields.slug_zh, &fields.slug_en, exclude_id.unwrap_or(-1)],
            |r| r.get(0),
        )
        .optional()?;
    match clash {
        Some(other) => {
            log::warn!(
                "slug clash with post {}: {} / {}",
                other,
                fields.slug_zh,
                fields.slug_en
            );
            Err(AppError::Conflict(MSG_SLUG_TAKEN.into()))
        }
        None => Ok(()),
    }
}

/// UNIQUE violations that slip past the pre-check still surface as a conflict.
fn map_write_err(e: rusqlite::Error) -> AppError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            AppError::Conflict(MSG_SLUG_TAKEN.into())
        }
        other => AppError::Db(other.to_string()),
    }
}

pub fn post_create(pool: &DbPool, req: PostReq, author_id: Option<i64>) -> Result<PostDto, AppError> {
    let fields = normalize(req)?;
    let now = Utc::now().to_rfc3339();
    let published_at = fields.published.then(|| now.clone());

    let id = {
        let conn = get_connection(pool);
        ensure_slugs_free(&conn, &fields, None)?;
        conn.execute(
            "INSERT INTO posts (title_zh, title_en, slug_zh, slug_en, content_zh, content_en, excerpt_zh, excerpt_en, category, tags, cover_image, published, featured, author_id, views, created_at, updated_at, published_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0, ?15, ?15, ?16)",
            params![
                &fields.title_zh,
                &fields.title_en,
                &fields.slug_zh,
                &fields.slug_en,
                &fields.content_zh,
                &fields.content_en,
                &fields.excerpt_zh,
                &fields.excerpt_en,
                &fields.category,
                &fields.tags_json,
                &fields.cover_image,
                fields.published as i32,
                fields.featured as i32,
                author_id,
                &now,
                published_at,
            ],
        )
        .map_err(map_write_err)?;
        conn.last_insert_rowid()
    }; // release conn before post_get

    log::info!("post {} created ({})", id, fields.slug_en);
    post_get(pool, id, true)
}

/// Unpublished posts are hidden from anonymous callers.
pub fn post_get(pool: &DbPool, id: i64, include_unpublished: bool) -> Result<PostDto, AppError> {
    let conn = get_connection(pool);
    let sql = format!("SELECT {} FROM posts p WHERE p.id = ?1", POST_COLUMNS);
    let post = conn
        .query_row(&sql, [id], row_to_post)
        .optional()?
        .filter(|p| include_unpublished || p.published);
    post.ok_or_else(|| AppError::NotFound(format!("post {}", id)))
}

/// Public lookup by either language's slug; counts a view.
pub fn post_get_by_slug(pool: &DbPool, slug: &str) -> Result<PostDto, AppError> {
    let conn = get_connection(pool);
    let changed = conn.execute(
        "UPDATE posts SET views = views + 1 WHERE (slug_zh = ?1 OR slug_en = ?1) AND published = 1",
        [slug],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("post {}", slug)));
    }
    let sql = format!(
        "SELECT {} FROM posts p WHERE (p.slug_zh = ?1 OR p.slug_en = ?1) AND p.published = 1",
        POST_COLUMNS
    );
    Ok(conn.query_row(&sql, [slug], row_to_post)?)
}

pub fn post_update(pool: &DbPool, id: i64, req: PostReq) -> Result<PostDto, AppError> {
    let fields = normalize(req)?;
    let now = Utc::now().to_rfc3339();

    {
        let conn = get_connection(pool);
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE id = ?1)",
            [id],
            |r| r.get(0),
        )?;
        if !exists {
            return Err(AppError::NotFound(format!("post {}", id)));
        }
        ensure_slugs_free(&conn, &fields, Some(id))?;
        conn.execute(
            "UPDATE posts SET title_zh = ?1, title_en = ?2, slug_zh = ?3, slug_en = ?4, content_zh = ?5, content_en = ?6, \
             excerpt_zh = ?7, excerpt_en = ?8, category = ?9, tags = ?10, cover_image = ?11, published = ?12, featured = ?13, \
             updated_at = ?14, published_at = CASE WHEN ?12 = 1 THEN COALESCE(published_at, ?14) ELSE published_at END \
             WHERE id = ?15",
            params![
                &fields.title_zh,
                &fields.title_en,
                &fields.slug_zh,
                &fields.slug_en,
                &fields.content_zh,
                &fields.content_en,
                &fields.excerpt_zh,
                &fields.excerpt_en,
                &fields.category,
                &fields.tags_json,
                &fields.cover_image,
                fields.published as i32,
                fields.featured as i32,
                &now,
                id,
            ],
        )
        .map_err(map_write_err)?;
    }

    log::info!("post {} updated", id);
    post_get(pool, id, true)
}

pub fn post_delete(pool: &DbPool, id: i64) -> Result<(), AppError> {
    let conn = get_connection(pool);
    let n = conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
    if n == 0 {
        return Err(AppError::NotFound(format!("post {}", id)));
    }
    log::info!("post {} deleted", id);
    Ok(())
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub fn post_list(
    pool: &DbPool,
    req: PostListReq,
    include_unpublished: bool,
) -> Result<PostListPage, AppError> {
    let page = PageParams::new(req.page, req.limit);

    // --- build dynamic WHERE clauses ---
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();

    let published = if include_unpublished {
        req.published
    } else {
        Some(true)
    };
    if let Some(p) = published {
        conditions.push("p.published = ?".to_string());
        bind_values.push(Value::Integer(p as i64));
    }

    if let Some(category) = req.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("p.category = ?".to_string());
        bind_values.push(Value::Text(category.to_string()));
    }

    if let Some(tag) = req.tag.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push("EXISTS (SELECT 1 FROM json_each(p.tags) WHERE json_each.value = ?)".to_string());
        bind_values.push(Value::Text(tag.to_string()));
    }

    if let Some(term) = req.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let cols = [
            "p.title_zh",
            "p.title_en",
            "p.excerpt_zh",
            "p.excerpt_en",
            "p.content_zh",
            "p.content_en",
        ];
        let ors: Vec<String> = cols
            .iter()
            .map(|c| format!("{} LIKE ? ESCAPE '\\'", c))
            .collect();
        conditions.push(format!("({})", ors.join(" OR ")));
        let pattern = like_pattern(term);
        for _ in cols {
            bind_values.push(Value::Text(pattern.clone()));
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let conn = get_connection(pool);

    // --- COUNT total ---
    let count_sql = format!("SELECT COUNT(*) FROM posts p{}", where_clause);
    let total: i64 = conn.query_row(
        &count_sql,
        rusqlite::params_from_iter(bind_values.iter()),
        |r| r.get(0),
    )?;

    // --- page ---
    let data_sql = format!(
        "SELECT {} FROM posts p{} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        POST_COLUMNS, where_clause
    );
    let mut all_params = bind_values;
    all_params.push(Value::Integer(page.limit));
    all_params.push(Value::Integer(page.offset()));

    let mut stmt = conn.prepare(&data_sql)?;
    let posts = stmt
        .query_map(rusqlite::params_from_iter(all_params.iter()), row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PostListPage {
        posts,
        pagination: page.with_total(total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn normalize_derives_slugs_and_dedups_tags() {
        let fields = normalize(PostReq {
            title_zh: "你好 世界".into(),
            title_en: " Hello World ".into(),
            content_zh: "内容".into(),
            content_en: "body".into(),
            tags: Some(vec!["rust".into(), " rust ".into(), "".into(), "web".into()]),
            ..PostReq::default()
        })
        .unwrap();
        assert_eq!(fields.slug_zh, "你好-世界");
        assert_eq!(fields.slug_en, "hello-world");
        assert_eq!(fields.title_en, "Hello World");
        assert_eq!(fields.tags_json, r#"["rust","web"]"#);
    }

    #[test]
    fn normalize_requires_both_languages() {
        let err = normalize(PostReq {
            title_zh: "标题".into(),
            content_zh: "内容".into(),
            content_en: "body".into(),
            ..PostReq::default()
        })
        .err()
        .unwrap();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("title_en"));
    }
}
