use crate::app::{media_delete, media_list, media_upload, MediaListPage, MediaListReq, MediaUpload};
use crate::error::AppError;
use crate::routes::extract::AuthUser;
use crate::routes::MessageResp;
use crate::server::AppState;
use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpResponse, Scope};
use futures::StreamExt;

const FILE_FIELD: &str = "file";

/// Read the single `file` field into memory, giving up as soon as it
/// crosses `max_bytes` so nothing oversized ever reaches the disk.
async fn read_file_field(mut payload: Multipart, max_bytes: usize) -> Result<MediaUpload, AppError> {
    while let Some(field_result) = payload.next().await {
        let mut field = field_result.map_err(|e| {
            log::warn!("failed to read multipart field: {}", e);
            AppError::Validation(format!("invalid multipart body: {}", e))
        })?;

        let (name, original_name) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().unwrap_or_default().to_string(),
            ),
            None => continue,
        };
        if name != FILE_FIELD {
            continue;
        }
        let content_type = field.content_type().map(|m| m.essence_str().to_string());

        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk_result) = field.next().await {
            let chunk = chunk_result.map_err(|e| {
                log::warn!("failed to read multipart chunk: {}", e);
                AppError::Validation(format!("invalid multipart body: {}", e))
            })?;
            if bytes.len() + chunk.len() > max_bytes {
                log::warn!("upload '{}' rejected: over {} bytes", original_name, max_bytes);
                return Err(AppError::PayloadTooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(MediaUpload {
            original_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation("请选择要上传的文件".into()))
}

#[post("/upload")]
pub async fn media_upload_file(
    state: web::Data<AppState>,
    user: AuthUser,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let upload = read_file_field(payload, state.media.max_bytes()).await?;
    let uploaded_by = Some(user.0.sub);
    let dto = web::block(move || media_upload(&state.pool, &state.media, upload, uploaded_by)).await??;
    Ok(HttpResponse::Created().json(dto))
}

#[get("")]
pub async fn media_list_files(
    state: web::Data<AppState>,
    _user: AuthUser,
    query: web::Query<MediaListReq>,
) -> Result<web::Json<MediaListPage>, AppError> {
    let req = query.into_inner();
    let page = web::block(move || media_list(&state.pool, req)).await??;
    Ok(web::Json(page))
}

#[delete("/{id}")]
pub async fn media_delete_file(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<i64>,
) -> Result<web::Json<MessageResp>, AppError> {
    let id = path.into_inner();
    web::block(move || media_delete(&state.pool, &state.media, id)).await??;
    Ok(web::Json(MessageResp::new("文件已删除")))
}

pub fn routes() -> Scope {
    web::scope("/media")
        .service(media_upload_file)
        .service(media_list_files)
        .service(media_delete_file)
}
