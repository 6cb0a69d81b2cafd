use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{get, register_and_login, role_id, send, setup_test_app};

#[tokio::test]
async fn test_roles_require_a_token() {
    let app = setup_test_app().await;

    let (status, body) = get(&app.router, "/api/roles", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_default_roles_are_seeded_and_sorted_by_name() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;

    let (status, body) = get(&app.router, "/api/roles", Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|role| role["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["admin", "editor", "user"]);
}

#[tokio::test]
async fn test_role_crud() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;

    let (status, created) = send(
        &app.router,
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({"name": "moderator", "description": "Keeps the peace"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/roles/{}", created["id"].as_str().unwrap());

    let (status, body) = get(&app.router, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Keeps the peace");

    let (status, body) = send(
        &app.router,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({"description": "Reviews reports"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "moderator");
    assert_eq!(body["description"], "Reviews reports");

    let (status, body) = send(&app.router, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Role deleted successfully");

    let (status, _) = get(&app.router, &uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_role_name_conflicts() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({"name": "editor"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Role 'editor' already exists");
}

#[tokio::test]
async fn test_role_in_use_cannot_be_deleted() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;
    let user_role = role_id(&app.db, "user").await;

    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/roles/{user_role}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_blank_role_name_is_rejected() {
    let app = setup_test_app().await;
    let (_, token) = register_and_login(&app.router, "alice").await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/roles",
        Some(&token),
        Some(json!({"name": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
