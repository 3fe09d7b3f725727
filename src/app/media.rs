//! Media use cases: validated upload, listing, deletion.

use crate::app::pagination::{PageParams, Pagination};
use crate::error::AppError;
use crate::infra::get_connection;
use crate::infra::{DbPool, MediaStore};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

/// MIME type and the extensions accepted for it.
const ALLOWED_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/gif", &["gif"]),
    ("image/webp", &["webp"]),
    ("image/svg+xml", &["svg"]),
    ("application/pdf", &["pdf"]),
];

#[derive(Debug)]
pub struct MediaUpload {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaDto {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub uploaded_by: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct MediaListReq {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MediaListPage {
    pub media: Vec<MediaDto>,
    pub pagination: Pagination,
}

/// Resolve the stored MIME type and extension, or reject the file.
///
/// The extension must be on the allow-list; a declared content type must agree
/// with it. `application/octet-stream` or no declared type takes the type the
/// extension maps to.
pub fn check_file_type(
    original_name: &str,
    content_type: Option<&str>,
) -> Result<(&'static str, String), AppError> {
    let ext = std::path::Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| AppError::UnsupportedMedia(format!("不支持的文件类型: {}", original_name)))?;

    let &(mime, _) = ALLOWED_TYPES
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .ok_or_else(|| AppError::UnsupportedMedia(format!("不支持的文件类型: .{}", ext)))?;

    let declared = content_type
        .map(|c| c.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .filter(|c| !c.is_empty() && c != "application/octet-stream");
    let declared = match declared {
        Some(c) => c,
        None => mime.to_string(),
    };
    if declared != mime {
        return Err(AppError::UnsupportedMedia(format!(
            "文件类型与扩展名不匹配: {} / .{}",
            declared, ext
        )));
    }
    Ok((mime, ext))
}

pub fn media_upload(
    pool: &DbPool,
    store: &MediaStore,
    upload: MediaUpload,
    uploaded_by: Option<i64>,
) -> Result<MediaDto, AppError> {
    if upload.bytes.is_empty() {
        return Err(AppError::Validation("请选择要上传的文件".into()));
    }
    if upload.bytes.len() > store.max_bytes() {
        return Err(AppError::PayloadTooLarge);
    }
    let original_name = upload.original_name.trim().to_string();
    let (mime, ext) = check_file_type(&original_name, upload.content_type.as_deref())?;

    let stored = store.save(&ext, &upload.bytes)?;
    let now = Utc::now().to_rfc3339();
    let size = upload.bytes.len() as i64;

    let inserted = {
        let conn = get_connection(pool);
        conn.execute(
            "INSERT INTO media (filename, original_name, mime_type, size, path, uploaded_by, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![&stored.filename, &original_name, mime, size, &stored.public_path, uploaded_by, &now],
        )
        .map(|_| conn.last_insert_rowid())
    };
    let id = match inserted {
        Ok(id) => id,
        Err(e) => {
            // Do not leave an orphan file behind a failed insert.
            if let Err(cleanup) = store.remove(&stored.filename) {
                log::error!("failed to remove orphan upload {}: {}", stored.filename, cleanup);
            }
            return Err(e.into());
        }
    };

    log::info!("media {} stored as {} ({} bytes)", id, stored.filename, size);
    Ok(MediaDto {
        id,
        filename: stored.filename,
        original_name,
        mime_type: mime.to_string(),
        size,
        path: stored.public_path,
        uploaded_by,
        created_at: now,
    })
}

pub fn media_list(pool: &DbPool, req: MediaListReq) -> Result<MediaListPage, AppError> {
    let page = PageParams::new(req.page, req.limit);
    let conn = get_connection(pool);
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM media", [], |r| r.get(0))?;
    let mut stmt = conn.prepare(
        "SELECT id, filename, original_name, mime_type, size, path, uploaded_by, created_at FROM media ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
    )?;
    let rows = stmt.query_map(params![page.limit, page.offset()], |r| {
        Ok(MediaDto {
            id: r.get(0)?,
            filename: r.get(1)?,
            original_name: r.get(2)?,
            mime_type: r.get(3)?,
            size: r.get(4)?,
            path: r.get(5)?,
            uploaded_by: r.get(6)?,
            created_at: r.get(7)?,
        })
    })?;
    let media = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(MediaListPage {
        media,
        pagination: page.with_total(total),
    })
}

/// Remove the row, then the file on disk.
pub fn media_delete(pool: &DbPool, store: &MediaStore, id: i64) -> Result<(), AppError> {
    let filename: String = {
        let conn = get_connection(pool);
        let filename: Option<String> = conn
            .query_row("SELECT filename FROM media WHERE id = ?1", [id], |r| r.get(0))
            .optional()?;
        let filename = filename.ok_or_else(|| AppError::NotFound(format!("media {}", id)))?;
        conn.execute("DELETE FROM media WHERE id = ?1", [id])?;
        filename
    };
    store.remove(&filename)?;
    log::info!("media {} deleted ({})", id, filename);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_extension_and_matching_type() {
        let (mime, ext) = check_file_type("Photo.JPG", Some("image/jpeg")).unwrap();
        assert_eq!(mime, "image/jpeg");
        assert_eq!(ext, "jpg");
    }

    #[test]
    fn missing_or_generic_type_is_guessed() {
        assert_eq!(check_file_type("a.png", None).unwrap().0, "image/png");
        assert_eq!(
            check_file_type("a.webp", Some("application/octet-stream")).unwrap().0,
            "image/webp"
        );
    }

    #[test]
    fn disallowed_extension_rejected() {
        let err = check_file_type("run.exe", Some("image/png")).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_MEDIA_TYPE");
        assert!(check_file_type("noext", None).is_err());
    }

    #[test]
    fn mismatched_type_rejected() {
        let err = check_file_type("a.png", Some("text/html")).unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_MEDIA_TYPE");
    }
}
