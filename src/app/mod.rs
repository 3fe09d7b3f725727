//! Application use cases.

mod auth;
mod category;
mod dashboard;
mod homepage;
mod media;
pub mod pagination;
mod post;
pub mod slug;

pub use auth::{login, user_get, LoginReq, LoginResp, UserDto};
pub use category::{category_list, CategoryDto};
pub use dashboard::{dashboard_stats, DashboardStats, RecentPostDto};
pub use homepage::{
    homepage_get, homepage_save, AboutSection, ContactSection, FooterSection, HeroSection,
    Highlight, HomepageContent, HomepageDto, Localized, HOMEPAGE_SCHEMA_VERSION,
};
pub use media::{
    check_file_type, media_delete, media_list, media_upload, MediaDto, MediaListPage,
    MediaListReq, MediaUpload,
};
pub use pagination::{PageParams, Pagination};
pub use post::{
    post_create, post_delete, post_get, post_get_by_slug, post_list, post_update, PostDto,
    PostListPage, PostListReq, PostReq,
};
