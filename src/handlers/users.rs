use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    middleware,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, require_admin, require_auth};
use crate::core::list_resources;
use crate::errors::{ApiError, ErrorResponse};
use crate::filtering::{ListParams, ListQuery};
use crate::resources::user::{
    self as resource, LoginRequest, LoginResponse, RegisterRequest, User, UserUpdate,
};
use crate::response::{DataResponse, ListResponse, MessageResponse};
use crate::state::AppState;

pub const TAG: &str = "users";
pub const AUTH_TAG: &str = "auth";

/// `/register` and `/login`, both public.
pub fn auth_router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
}

/// Bearer token for everything, admin role for deletes.
pub fn router(state: &AppState) -> OpenApiRouter<AppState> {
    let admin = OpenApiRouter::new()
        .routes(routes!(delete_user))
        .route_layer(middleware::from_fn(require_admin));

    OpenApiRouter::new()
        .routes(routes!(list_users))
        .routes(routes!(get_user, update_user))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = AUTH_TAG,
    request_body = RegisterRequest,
    responses(
        (status = StatusCode::CREATED, description = "Account created", body = DataResponse<User>),
        (status = StatusCode::BAD_REQUEST, description = "Unknown role", body = ErrorResponse),
        (status = StatusCode::FORBIDDEN, description = "Admin role requested", body = ErrorResponse),
        (status = StatusCode::CONFLICT, description = "Username or email taken", body = ErrorResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid input", body = ErrorResponse)
    ),
    summary = "Register a new account"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<DataResponse<User>>), ApiError> {
    let user = resource::register(&state.db, &state.passwords, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("User registered successfully", user)),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_TAG,
    request_body = LoginRequest,
    responses(
        (status = StatusCode::OK, description = "Token issued", body = LoginResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Invalid credentials", body = ErrorResponse)
    ),
    summary = "Log in and receive a bearer token"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    resource::login(&state.db, &state.passwords, &state.tokens, input)
        .await
        .map(Json)
}

#[utoipa::path(
    get,
    path = "/",
    tag = TAG,
    params(ListParams),
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "Page of users", body = ListResponse<User>),
        (status = StatusCode::BAD_REQUEST, description = "Field or operator not allowed", body = ErrorResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse)
    ),
    summary = "List users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    query: ListQuery,
) -> Result<Json<ListResponse<User>>, ApiError> {
    list_resources::<User>(&state.db, &query, state.response_flags())
        .await
        .map(Json)
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "The user", body = User),
        (status = StatusCode::NOT_FOUND, description = "User not found", body = ErrorResponse)
    ),
    summary = "Get a user"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    resource::get_user(&state.db, id).await.map(Json)
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UserUpdate,
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "User updated", body = User),
        (status = StatusCode::FORBIDDEN, description = "Not your account", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "User not found", body = ErrorResponse),
        (status = StatusCode::CONFLICT, description = "Username or email taken", body = ErrorResponse)
    ),
    summary = "Update a user"
)]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
    resource::update_user(&state.db, &caller, id, input)
        .await
        .map(Json)
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "User deleted", body = MessageResponse),
        (status = StatusCode::FORBIDDEN, description = "Admin role required", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "User not found", body = ErrorResponse)
    ),
    summary = "Delete a user and their posts"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    resource::delete_user(&state.db, id).await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
