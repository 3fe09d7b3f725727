use crate::app::{
    post_create, post_delete, post_get, post_get_by_slug, post_list, post_update, PostDto,
    PostListPage, PostListReq, PostReq,
};
use crate::error::AppError;
use crate::routes::extract::{AuthUser, MaybeAuthUser};
use crate::routes::MessageResp;
use crate::server::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Scope};

/// Anonymous callers only ever see published posts.
#[get("")]
pub async fn posts_list(
    state: web::Data<AppState>,
    viewer: MaybeAuthUser,
    query: web::Query<PostListReq>,
) -> Result<web::Json<PostListPage>, AppError> {
    let include_unpublished = viewer.is_admin();
    let req = query.into_inner();
    let page = web::block(move || post_list(&state.pool, req, include_unpublished)).await??;
    Ok(web::Json(page))
}

#[get("/slug/{slug}")]
pub async fn posts_get_by_slug(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<web::Json<PostDto>, AppError> {
    let slug = path.into_inner();
    let dto = web::block(move || post_get_by_slug(&state.pool, &slug)).await??;
    Ok(web::Json(dto))
}

#[get("/{id}")]
pub async fn posts_get(
    state: web::Data<AppState>,
    viewer: MaybeAuthUser,
    path: web::Path<i64>,
) -> Result<web::Json<PostDto>, AppError> {
    let id = path.into_inner();
    let include_unpublished = viewer.is_admin();
    let dto = web::block(move || post_get(&state.pool, id, include_unpublished)).await??;
    Ok(web::Json(dto))
}

#[post("")]
pub async fn posts_create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<PostReq>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let author = Some(user.0.sub);
    let dto = web::block(move || post_create(&state.pool, req, author)).await??;
    Ok(HttpResponse::Created().json(dto))
}

#[put("/{id}")]
pub async fn posts_update(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<i64>,
    body: web::Json<PostReq>,
) -> Result<web::Json<PostDto>, AppError> {
    let id = path.into_inner();
    let req = body.into_inner();
    let dto = web::block(move || post_update(&state.pool, id, req)).await??;
    Ok(web::Json(dto))
}

#[delete("/{id}")]
pub async fn posts_delete(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<i64>,
) -> Result<web::Json<MessageResp>, AppError> {
    let id = path.into_inner();
    web::block(move || post_delete(&state.pool, id)).await??;
    Ok(web::Json(MessageResp::new("文章已删除")))
}

pub fn routes() -> Scope {
    web::scope("/posts")
        .service(posts_list)
        .service(posts_get_by_slug)
        .service(posts_get)
        .service(posts_create)
        .service(posts_update)
        .service(posts_delete)
}
