use crate::app::{login, user_get, LoginReq, LoginResp, UserDto};
use crate::error::AppError;
use crate::routes::extract::AuthUser;
use crate::server::AppState;
use actix_web::{get, post, web, Scope};

#[post("/login")]
pub async fn auth_login(
    state: web::Data<AppState>,
    req: Option<web::Json<LoginReq>>,
) -> Result<web::Json<LoginResp>, AppError> {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    let resp = web::block(move || login(&state.pool, &state.tokens, req)).await??;
    Ok(web::Json(resp))
}

#[get("/me")]
pub async fn auth_me(
    state: web::Data<AppState>,
    user: AuthUser,
) -> Result<web::Json<UserDto>, AppError> {
    let id = user.0.sub;
    let dto = web::block(move || user_get(&state.pool, id)).await??;
    Ok(web::Json(dto))
}

pub fn routes() -> Scope {
    web::scope("/auth").service(auth_login).service(auth_me)
}
