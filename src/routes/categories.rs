use crate::app::{category_list, CategoryDto};
use crate::error::AppError;
use crate::routes::extract::MaybeAuthUser;
use crate::server::AppState;
use actix_web::{get, web, Scope};

#[get("")]
pub async fn categories_list(
    state: web::Data<AppState>,
    viewer: MaybeAuthUser,
) -> Result<web::Json<Vec<CategoryDto>>, AppError> {
    let include_unpublished = viewer.is_admin();
    let list = web::block(move || category_list(&state.pool, include_unpublished)).await??;
    Ok(web::Json(list))
}

pub fn routes() -> Scope {
    web::scope("/categories").service(categories_list)
}
