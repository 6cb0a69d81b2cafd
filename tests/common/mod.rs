#![allow(dead_code)]

use argon2::Params;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use inkpress::{
    AppConfig, AppState, build_router,
    auth::PasswordHasher,
    entities::{role, user},
    migrations::Migrator,
    response::ResponseFlags,
    seed::seed_roles,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "Str0ng!pass";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    // One connection, otherwise every pooled connection gets its own empty in-memory database
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;
    seed_roles(&db).await?;

    Ok(db)
}

pub fn test_config(flags: ResponseFlags) -> AppConfig {
    AppConfig {
        jwt_secret_key: "integration-test-secret".to_string(),
        show_metadata: flags.show_metadata,
        show_pagination: flags.show_pagination,
        ..AppConfig::default()
    }
}

pub async fn setup_test_app_with(flags: ResponseFlags) -> TestApp {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let mut state = AppState::new(db.clone(), test_config(flags));
    // Cheap parameters keep registration fast in debug builds
    state.passwords = PasswordHasher::new(Params::new(1024, 1, 1, None).unwrap());

    TestApp {
        router: build_router(state),
        db,
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(ResponseFlags::default()).await
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get(router: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(router, "GET", uri, token, None).await
}

/// Register `username` with the shared test password and return its id.
pub async fn register(router: &Router, username: &str) -> Uuid {
    let (status, body) = send(
        router,
        "POST",
        "/api/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

pub async fn login(router: &Router, username: &str) -> String {
    let (status, body) = send(
        router,
        "POST",
        "/api/login",
        None,
        Some(json!({
            "email": format!("{username}@example.com"),
            "password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

/// Register and log in, returning the user id and a bearer token.
pub async fn register_and_login(router: &Router, username: &str) -> (Uuid, String) {
    let id = register(router, username).await;
    let token = login(router, username).await;
    (id, token)
}

pub async fn role_id(db: &DatabaseConnection, name: &str) -> Uuid {
    role::Entity::find()
        .filter(role::Column::Name.eq(name))
        .one(db)
        .await
        .unwrap()
        .expect("seeded role")
        .id
}

/// Move a user into the admin role directly in the database.
pub async fn promote_to_admin(db: &DatabaseConnection, user_id: Uuid) {
    let admin = role_id(db, "admin").await;
    let mut active = user::Entity::find_by_id(user_id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .into_active_model();
    active.role_id = Set(admin);
    active.update(db).await.unwrap();
}

/// Register, promote and log in an admin account.
pub async fn admin_token(app: &TestApp, username: &str) -> (Uuid, String) {
    let id = register(&app.router, username).await;
    promote_to_admin(&app.db, id).await;
    let token = login(&app.router, username).await;
    (id, token)
}

pub async fn create_post(router: &Router, token: &str, body: Value) -> (StatusCode, Value) {
    send(router, "POST", "/api/posts", Some(token), Some(body)).await
}
