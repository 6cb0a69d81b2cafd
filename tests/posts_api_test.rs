use axum::http::StatusCode;
use serde_json::json;
use std::collections::HashSet;

mod common;
use common::{
    admin_token, create_post, get, register_and_login, send, setup_test_app,
};

#[tokio::test]
async fn test_create_post_generates_slug_from_title() {
    let app = setup_test_app().await;
    let (author_id, token) = register_and_login(&app.router, "alice").await;

    let (status, body) = create_post(
        &app.router,
        &token,
        json!({"title": "Hello World", "content": "First post"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "hello-world");
    assert_eq!(body["author_id"], author_id.to_string());
    assert_eq!(body["version"], 1);
}

#[tokio::test]
async fn test_colliding_titles_get_numbered_suffixes() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;

    let mut slugs = Vec::new();
    for _ in 0..3 {
        let (status, body) = create_post(
            &app.router,
            &token,
            json!({"title": "Hello World", "content": "again"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        slugs.push(body["slug"].as_str().unwrap().to_string());
    }

    assert_eq!(slugs, vec!["hello-world", "hello-world-1", "hello-world-2"]);
}

#[tokio::test]
async fn test_accented_title_is_transliterated() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;

    let (status, body) = create_post(
        &app.router,
        &token,
        json!({"title": "Canción del Año & más", "content": "música"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "cancion-del-ano-and-mas");
}

#[tokio::test]
async fn test_title_without_letters_is_rejected() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;

    let (status, body) =
        create_post(&app.router, &token, json!({"title": "!!!", "content": "x"})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Validation failed");
}

#[tokio::test]
async fn test_explicit_slug_is_validated_and_unique() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;

    let (status, body) = create_post(
        &app.router,
        &token,
        json!({"title": "Anything", "content": "x", "slug": "my-custom-slug"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "my-custom-slug");

    let (status, _) = create_post(
        &app.router,
        &token,
        json!({"title": "Other", "content": "x", "slug": "my-custom-slug"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = create_post(
        &app.router,
        &token,
        json!({"title": "Other", "content": "x", "slug": "Not A Slug"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;

    let (status, body) =
        create_post(&app.router, &token, json!({"title": "  ", "content": ""})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_writes_require_a_token() {
    let app = setup_test_app().await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/posts",
        None,
        Some(json!({"title": "Hello", "content": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/posts",
        Some("not-a-jwt"),
        Some(json!({"title": "Hello", "content": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reads_are_public() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;
    create_post(&app.router, &token, json!({"title": "Public Post", "content": "x"})).await;

    let (status, body) = get(&app.router, "/api/posts/public-post", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Public Post");

    let (status, body) = get(&app.router, "/api/posts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = get(&app.router, "/api/posts/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Post 'missing' not found");
}

#[tokio::test]
async fn test_title_change_regenerates_slug() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;
    create_post(&app.router, &token, json!({"title": "Taken Title", "content": "x"})).await;
    create_post(&app.router, &token, json!({"title": "Draft", "content": "x"})).await;

    let (status, body) = send(
        &app.router,
        "PUT",
        "/api/posts/draft",
        Some(&token),
        Some(json!({"title": "Taken Title"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "taken-title-1");
    assert_eq!(body["content"], "x");
    assert_eq!(body["version"], 2);

    let (status, _) = get(&app.router, "/api/posts/draft", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_retitle_to_same_slug_keeps_it() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;
    create_post(&app.router, &token, json!({"title": "Hello World", "content": "x"})).await;

    let (status, body) = send(
        &app.router,
        "PUT",
        "/api/posts/hello-world",
        Some(&token),
        Some(json!({"title": "Hello, World!"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "hello-world");
    assert_eq!(body["title"], "Hello, World!");
}

#[tokio::test]
async fn test_explicit_slug_on_update() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;
    create_post(&app.router, &token, json!({"title": "One", "content": "x"})).await;
    create_post(&app.router, &token, json!({"title": "Two", "content": "x"})).await;

    let (status, _) = send(
        &app.router,
        "PUT",
        "/api/posts/two",
        Some(&token),
        Some(json!({"slug": "one"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app.router,
        "PUT",
        "/api/posts/two",
        Some(&token),
        Some(json!({"title": "Renamed", "slug": "second"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "second");
}

#[tokio::test]
async fn test_only_author_or_admin_may_modify() {
    let app = setup_test_app().await;
    let (_, author) = register_and_login(&app.router, "alice").await;
    let (_, stranger) = register_and_login(&app.router, "mallory").await;
    let (_, admin) = admin_token(&app, "root").await;
    create_post(&app.router, &author, json!({"title": "Mine", "content": "x"})).await;

    let (status, _) = send(
        &app.router,
        "PUT",
        "/api/posts/mine",
        Some(&stranger),
        Some(json!({"content": "defaced"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app.router, "DELETE", "/api/posts/mine", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app.router,
        "PUT",
        "/api/posts/mine",
        Some(&admin),
        Some(json!({"content": "moderated"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "moderated");
}

#[tokio::test]
async fn test_delete_post() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;
    create_post(&app.router, &token, json!({"title": "Short Lived", "content": "x"})).await;

    let (status, body) =
        send(&app.router, "DELETE", "/api/posts/short-lived", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post deleted successfully");

    let (status, _) = get(&app.router, "/api/posts/short-lived", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_slugs() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;
    let body = json!({"title": "Race", "content": "x"});

    let (a, b, c) = tokio::join!(
        create_post(&app.router, &token, body.clone()),
        create_post(&app.router, &token, body.clone()),
        create_post(&app.router, &token, body.clone()),
    );

    let mut slugs = HashSet::new();
    for (status, body) in [a, b, c] {
        assert_eq!(status, StatusCode::CREATED, "{body}");
        slugs.insert(body["slug"].as_str().unwrap().to_string());
    }
    let expected: HashSet<String> = ["race", "race-1", "race-2"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(slugs, expected);
}

#[tokio::test]
async fn test_concurrent_updates_never_lose_a_version() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;
    create_post(&app.router, &token, json!({"title": "Shared", "content": "x"})).await;

    let update = |content: &'static str| {
        send(
            &app.router,
            "PUT",
            "/api/posts/shared",
            Some(&token),
            Some(json!({"content": content})),
        )
    };
    let (first, second) = tokio::join!(update("first"), update("second"));

    let mut applied = 0;
    for (status, body) in [first, second] {
        match status {
            StatusCode::OK => applied += 1,
            StatusCode::CONFLICT => {}
            other => panic!("unexpected status {other}: {body}"),
        }
    }
    assert!(applied >= 1);

    let (_, body) = get(&app.router, "/api/posts/shared", None).await;
    assert_eq!(body["version"], 1 + applied);
}
