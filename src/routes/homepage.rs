use crate::app::{homepage_get, homepage_save, HomepageContent, HomepageDto};
use crate::error::AppError;
use crate::routes::extract::AuthUser;
use crate::server::AppState;
use actix_web::{get, post, web, Scope};

#[get("")]
pub async fn homepage_read(state: web::Data<AppState>) -> Result<web::Json<HomepageDto>, AppError> {
    let dto = web::block(move || homepage_get(&state.pool)).await??;
    Ok(web::Json(dto))
}

/// Accepts the current typed document or the legacy flat blob.
#[post("")]
pub async fn homepage_write(
    state: web::Data<AppState>,
    _user: AuthUser,
    body: web::Json<serde_json::Value>,
) -> Result<web::Json<HomepageDto>, AppError> {
    let content = HomepageContent::from_json(body.into_inner())?;
    let dto = web::block(move || homepage_save(&state.pool, content)).await??;
    Ok(web::Json(dto))
}

pub fn routes() -> Scope {
    web::scope("/homepage")
        .service(homepage_read)
        .service(homepage_write)
}
