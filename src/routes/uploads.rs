//! Serves stored uploads back by filename.

use crate::error::AppError;
use crate::infra::storage::PUBLIC_PREFIX;
use crate::server::AppState;
use actix_web::http::header;
use actix_web::{get, web, HttpResponse, Scope};

const SVG_CSP: &str = "default-src 'none'; style-src 'unsafe-inline'; sandbox";

#[get("/{filename}")]
pub async fn uploads_get(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let filename = path.into_inner();
    let file_path = state.media.resolve(&filename)?;
    let bytes = match tokio::fs::read(&file_path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("file {}", filename)))
        }
        Err(e) => return Err(e.into()),
    };
    let mime = mime_guess::from_path(&file_path).first_or_octet_stream();
    let mut resp = HttpResponse::Ok();
    resp.insert_header((header::CONTENT_TYPE, mime.essence_str().to_string()))
        .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"));
    if mime.essence_str() == "image/svg+xml" {
        // SVG can carry script; never let it run on this origin.
        resp.insert_header((header::CONTENT_SECURITY_POLICY, SVG_CSP));
    }
    Ok(resp.body(bytes))
}

pub fn routes() -> Scope {
    web::scope(PUBLIC_PREFIX).service(uploads_get)
}
