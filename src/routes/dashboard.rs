use crate::app::{dashboard_stats, DashboardStats};
use crate::error::AppError;
use crate::routes::extract::AuthUser;
use crate::server::AppState;
use actix_web::{get, web, Scope};

#[get("/stats")]
pub async fn dashboard_get_stats(
    state: web::Data<AppState>,
    _user: AuthUser,
) -> Result<web::Json<DashboardStats>, AppError> {
    let stats = web::block(move || dashboard_stats(&state.pool)).await??;
    Ok(web::Json(stats))
}

pub fn routes() -> Scope {
    web::scope("/dashboard").service(dashboard_get_stats)
}
