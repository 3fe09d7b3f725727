//! Post CRUD, slug uniqueness and pagination integration tests

use app_lib::app::{
    post_create, post_delete, post_get, post_get_by_slug, post_list, post_update, PostListReq,
    PostReq,
};
use app_lib::infra::{init_test_db, DbPool};

// ──────────────────────── Helper ────────────────────────

fn make_req(n: &str) -> PostReq {
    PostReq {
        title_zh: format!("标题 {}", n),
        title_en: format!("Title {}", n),
        content_zh: "正文".to_string(),
        content_en: "Body text".to_string(),
        excerpt_en: Some("Short".to_string()),
        category: Some("tech".to_string()),
        tags: Some(vec!["rust".to_string()]),
        published: Some(true),
        ..PostReq::default()
    }
}

fn seed_posts(pool: &DbPool, count: usize, published: bool) {
    for i in 0..count {
        let mut req = make_req(&format!("{}-{}", published, i));
        req.published = Some(published);
        post_create(pool, req, Some(1)).unwrap();
    }
}

// ══════════════════════════════════════════════════════════
//  post_create
// ══════════════════════════════════════════════════════════

#[test]
fn create_post_returns_full_dto() {
    let pool = init_test_db();
    let post = post_create(&pool, make_req("one"), Some(1)).unwrap();
    assert!(post.id > 0);
    assert_eq!(post.title_en, "Title one");
    assert_eq!(post.slug_en, "title-one");
    assert_eq!(post.slug_zh, "标题-one");
    assert_eq!(post.category, "tech");
    assert_eq!(post.tags, vec!["rust".to_string()]);
    assert!(post.published);
    assert!(post.published_at.is_some());
    assert_eq!(post.author_id, Some(1));
    assert_eq!(post.views, 0);
}

#[test]
fn create_draft_has_no_published_at() {
    let pool = init_test_db();
    let mut req = make_req("draft");
    req.published = None;
    let post = post_create(&pool, req, None).unwrap();
    assert!(!post.published);
    assert!(post.published_at.is_none());
}

#[test]
fn create_post_uses_explicit_slugs() {
    let pool = init_test_db();
    let mut req = make_req("x");
    req.slug_en = Some("My Custom Slug".to_string());
    req.slug_zh = Some("zi-ding-yi".to_string());
    let post = post_create(&pool, req, None).unwrap();
    assert_eq!(post.slug_en, "my-custom-slug");
    assert_eq!(post.slug_zh, "zi-ding-yi");
}

#[test]
fn create_post_missing_bilingual_field_fails() {
    let pool = init_test_db();
    for strip in ["title_zh", "title_en", "content_zh", "content_en"] {
        let mut req = make_req(strip);
        match strip {
            "title_zh" => req.title_zh = "  ".into(),
            "title_en" => req.title_en = String::new(),
            "content_zh" => req.content_zh = String::new(),
            _ => req.content_en = " ".into(),
        }
        let err = post_create(&pool, req, None).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR", "{}", strip);
    }
}

#[test]
fn create_post_duplicate_slug_same_language_conflicts() {
    let pool = init_test_db();
    post_create(&pool, make_req("dup"), None).unwrap();
    let mut req = make_req("other");
    req.slug_en = Some("title-dup".to_string());
    let err = post_create(&pool, req, None).unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
    assert_eq!(err.to_string(), "文章链接已存在");
}

#[test]
fn create_post_duplicate_slug_across_languages_conflicts() {
    let pool = init_test_db();
    let first = post_create(&pool, make_req("cross"), None).unwrap();
    let mut req = make_req("fresh");
    // reuse the English slug of the first post as a Chinese slug
    req.slug_zh = Some(first.slug_en.clone());
    let err = post_create(&pool, req, None).unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
}

#[test]
fn create_post_same_slug_in_both_languages_of_one_post_is_allowed() {
    let pool = init_test_db();
    let mut req = make_req("same");
    req.slug_zh = Some("same-slug".to_string());
    req.slug_en = Some("same-slug".to_string());
    let post = post_create(&pool, req, None).unwrap();
    assert_eq!(post.slug_zh, post.slug_en);
}

// ══════════════════════════════════════════════════════════
//  post_get / post_get_by_slug
// ══════════════════════════════════════════════════════════

#[test]
fn get_post_by_id() {
    let pool = init_test_db();
    let created = post_create(&pool, make_req("get"), None).unwrap();
    let fetched = post_get(&pool, created.id, false).unwrap();
    assert_eq!(fetched.id, created.id);
}

#[test]
fn get_unpublished_post_hidden_from_anonymous() {
    let pool = init_test_db();
    let mut req = make_req("hidden");
    req.published = Some(false);
    let created = post_create(&pool, req, None).unwrap();
    assert_eq!(post_get(&pool, created.id, false).unwrap_err().code(), "NOT_FOUND");
    assert!(post_get(&pool, created.id, true).is_ok());
}

#[test]
fn get_post_not_found() {
    let pool = init_test_db();
    assert_eq!(post_get(&pool, 404, true).unwrap_err().code(), "NOT_FOUND");
}

#[test]
fn get_by_slug_matches_either_language_and_counts_views() {
    let pool = init_test_db();
    let created = post_create(&pool, make_req("slug"), None).unwrap();
    let a = post_get_by_slug(&pool, &created.slug_en).unwrap();
    let b = post_get_by_slug(&pool, &created.slug_zh).unwrap();
    assert_eq!(a.id, created.id);
    assert_eq!(a.views, 1);
    assert_eq!(b.views, 2);
}

#[test]
fn get_by_slug_ignores_drafts() {
    let pool = init_test_db();
    let mut req = make_req("draft-slug");
    req.published = Some(false);
    let created = post_create(&pool, req, None).unwrap();
    let err = post_get_by_slug(&pool, &created.slug_en).unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

// ══════════════════════════════════════════════════════════
//  post_update
// ══════════════════════════════════════════════════════════

#[test]
fn update_post_replaces_fields() {
    let pool = init_test_db();
    let created = post_create(&pool, make_req("upd"), None).unwrap();
    let mut req = make_req("upd");
    req.title_en = "Renamed".to_string();
    req.slug_en = Some(created.slug_en.clone());
    req.tags = Some(vec!["web".to_string(), "api".to_string()]);
    req.category = None;
    let updated = post_update(&pool, created.id, req).unwrap();
    assert_eq!(updated.title_en, "Renamed");
    assert_eq!(updated.slug_en, created.slug_en);
    assert_eq!(updated.tags, vec!["web".to_string(), "api".to_string()]);
    assert_eq!(updated.category, "");
    assert_eq!(updated.created_at, created.created_at);
}

#[test]
fn update_post_keeping_own_slug_is_not_a_conflict() {
    let pool = init_test_db();
    let created = post_create(&pool, make_req("keep"), None).unwrap();
    assert!(post_update(&pool, created.id, make_req("keep")).is_ok());
}

#[test]
fn update_post_to_taken_slug_conflicts() {
    let pool = init_test_db();
    let a = post_create(&pool, make_req("a"), None).unwrap();
    let b = post_create(&pool, make_req("b"), None).unwrap();
    let mut req = make_req("b");
    req.slug_en = Some(a.slug_en.clone());
    let err = post_update(&pool, b.id, req).unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
}

#[test]
fn update_post_not_found() {
    let pool = init_test_db();
    let err = post_update(&pool, 77, make_req("ghost")).unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn publishing_a_draft_stamps_published_at_once() {
    let pool = init_test_db();
    let mut req = make_req("pub");
    req.published = Some(false);
    let draft = post_create(&pool, req, None).unwrap();
    assert!(draft.published_at.is_none());

    let published = post_update(&pool, draft.id, make_req("pub")).unwrap();
    let stamp = published.published_at.clone().unwrap();

    let again = post_update(&pool, draft.id, make_req("pub")).unwrap();
    assert_eq!(again.published_at, Some(stamp));
}

#[test]
fn concurrent_edits_last_write_wins() {
    let pool = init_test_db();
    let created = post_create(&pool, make_req("lww"), None).unwrap();
    let mut first = make_req("lww");
    first.excerpt_en = Some("first".into());
    let mut second = make_req("lww");
    second.excerpt_en = Some("second".into());
    post_update(&pool, created.id, first).unwrap();
    post_update(&pool, created.id, second).unwrap();
    assert_eq!(post_get(&pool, created.id, true).unwrap().excerpt_en, "second");
}

// ══════════════════════════════════════════════════════════
//  post_delete
// ══════════════════════════════════════════════════════════

#[test]
fn delete_post_removes_row() {
    let pool = init_test_db();
    let created = post_create(&pool, make_req("del"), None).unwrap();
    post_delete(&pool, created.id).unwrap();
    assert_eq!(post_get(&pool, created.id, true).unwrap_err().code(), "NOT_FOUND");
    assert_eq!(post_delete(&pool, created.id).unwrap_err().code(), "NOT_FOUND");
}

#[test]
fn deleted_slug_can_be_reused() {
    let pool = init_test_db();
    let created = post_create(&pool, make_req("reuse"), None).unwrap();
    post_delete(&pool, created.id).unwrap();
    assert!(post_create(&pool, make_req("reuse"), None).is_ok());
}

// ══════════════════════════════════════════════════════════
//  post_list
// ══════════════════════════════════════════════════════════

#[test]
fn list_paginates_with_ceiling_page_count() {
    let pool = init_test_db();
    seed_posts(&pool, 23, true);
    for limit in [1_i64, 5, 10, 23, 50] {
        for page in 1..=4 {
            let res = post_list(
                &pool,
                PostListReq {
                    page: Some(page),
                    limit: Some(limit),
                    ..PostListReq::default()
                },
                true,
            )
            .unwrap();
            assert!(res.posts.len() as i64 <= limit);
            assert_eq!(res.pagination.total, 23);
            assert_eq!(res.pagination.pages, (23 + limit - 1) / limit);
            let expected = (23 - (page - 1) * limit).clamp(0, limit);
            assert_eq!(res.posts.len() as i64, expected, "page {} limit {}", page, limit);
        }
    }
}

#[test]
fn list_pages_do_not_overlap() {
    let pool = init_test_db();
    seed_posts(&pool, 7, true);
    let mut seen = std::collections::HashSet::new();
    for page in 1..=3 {
        let res = post_list(
            &pool,
            PostListReq {
                page: Some(page),
                limit: Some(3),
                ..PostListReq::default()
            },
            true,
        )
        .unwrap();
        for p in res.posts {
            assert!(seen.insert(p.id));
        }
    }
    assert_eq!(seen.len(), 7);
}

#[test]
fn list_defaults_and_clamps_limit() {
    let pool = init_test_db();
    seed_posts(&pool, 12, true);
    let res = post_list(&pool, PostListReq::default(), true).unwrap();
    assert_eq!(res.pagination.page, 1);
    assert_eq!(res.pagination.limit, 10);
    assert_eq!(res.posts.len(), 10);

    let res = post_list(
        &pool,
        PostListReq {
            limit: Some(0),
            page: Some(0),
            ..PostListReq::default()
        },
        true,
    )
    .unwrap();
    assert_eq!(res.pagination.limit, 1);
    assert_eq!(res.pagination.page, 1);
}

#[test]
fn list_empty_has_zero_pages() {
    let pool = init_test_db();
    let res = post_list(&pool, PostListReq::default(), true).unwrap();
    assert_eq!(res.pagination.total, 0);
    assert_eq!(res.pagination.pages, 0);
    assert!(res.posts.is_empty());
}

#[test]
fn list_anonymous_sees_only_published() {
    let pool = init_test_db();
    seed_posts(&pool, 3, true);
    seed_posts(&pool, 2, false);
    let anon = post_list(
        &pool,
        PostListReq {
            published: Some(false),
            ..PostListReq::default()
        },
        false,
    )
    .unwrap();
    assert_eq!(anon.pagination.total, 3);
    assert!(anon.posts.iter().all(|p| p.published));

    let drafts = post_list(
        &pool,
        PostListReq {
            published: Some(false),
            ..PostListReq::default()
        },
        true,
    )
    .unwrap();
    assert_eq!(drafts.pagination.total, 2);

    let all = post_list(&pool, PostListReq::default(), true).unwrap();
    assert_eq!(all.pagination.total, 5);
}

#[test]
fn list_filters_by_category_tag_and_search() {
    let pool = init_test_db();
    let mut a = make_req("alpha");
    a.category = Some("life".into());
    a.tags = Some(vec!["travel".into(), "food".into()]);
    a.content_en = "A trip to Kyoto".into();
    post_create(&pool, a, None).unwrap();
    post_create(&pool, make_req("beta"), None).unwrap();

    let by_cat = post_list(
        &pool,
        PostListReq {
            category: Some("life".into()),
            ..PostListReq::default()
        },
        true,
    )
    .unwrap();
    assert_eq!(by_cat.pagination.total, 1);

    let by_tag = post_list(
        &pool,
        PostListReq {
            tag: Some("food".into()),
            ..PostListReq::default()
        },
        true,
    )
    .unwrap();
    assert_eq!(by_tag.pagination.total, 1);
    assert_eq!(by_tag.posts[0].title_en, "Title alpha");

    let by_search = post_list(
        &pool,
        PostListReq {
            search: Some("kyoto".into()),
            ..PostListReq::default()
        },
        true,
    )
    .unwrap();
    assert_eq!(by_search.pagination.total, 1);

    let by_zh = post_list(
        &pool,
        PostListReq {
            search: Some("标题".into()),
            ..PostListReq::default()
        },
        true,
    )
    .unwrap();
    assert_eq!(by_zh.pagination.total, 2);
}

#[test]
fn list_search_treats_wildcards_literally() {
    let pool = init_test_db();
    let mut a = make_req("pct");
    a.title_en = "100% Rust".into();
    post_create(&pool, a, None).unwrap();
    post_create(&pool, make_req("plain"), None).unwrap();
    let res = post_list(
        &pool,
        PostListReq {
            search: Some("%".into()),
            ..PostListReq::default()
        },
        true,
    )
    .unwrap();
    assert_eq!(res.pagination.total, 1);
}

#[test]
fn list_is_newest_first() {
    let pool = init_test_db();
    let first = post_create(&pool, make_req("old"), None).unwrap();
    let second = post_create(&pool, make_req("new"), None).unwrap();
    let res = post_list(&pool, PostListReq::default(), true).unwrap();
    let ids: Vec<i64> = res.posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
