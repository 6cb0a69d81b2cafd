use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    middleware,
};
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::auth::require_auth;
use crate::core::list_resources;
use crate::errors::{ApiError, ErrorResponse};
use crate::filtering::{ListParams, ListQuery};
use crate::resources::role::{self as resource, Role, RoleCreate, RoleUpdate};
use crate::response::{ListResponse, MessageResponse};
use crate::state::AppState;

pub const TAG: &str = "roles";

/// Every role route needs a bearer token.
pub fn router(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_roles, create_role))
        .routes(routes!(get_role, update_role, delete_role))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

#[utoipa::path(
    get,
    path = "/",
    tag = TAG,
    params(ListParams),
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "Page of roles", body = ListResponse<Role>),
        (status = StatusCode::BAD_REQUEST, description = "Field or operator not allowed", body = ErrorResponse),
        (status = StatusCode::UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse)
    ),
    summary = "List roles"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    query: ListQuery,
) -> Result<Json<ListResponse<Role>>, ApiError> {
    list_resources::<Role>(&state.db, &query, state.response_flags())
        .await
        .map(Json)
}

#[utoipa::path(
    post,
    path = "/",
    tag = TAG,
    request_body = RoleCreate,
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::CREATED, description = "Role created", body = Role),
        (status = StatusCode::CONFLICT, description = "Name already in use", body = ErrorResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid input", body = ErrorResponse)
    ),
    summary = "Create a role"
)]
pub async fn create_role(
    State(state): State<AppState>,
    Json(input): Json<RoleCreate>,
) -> Result<(StatusCode, Json<Role>), ApiError> {
    let created = resource::create_role(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Role id")),
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "The role", body = Role),
        (status = StatusCode::NOT_FOUND, description = "Role not found", body = ErrorResponse)
    ),
    summary = "Get a role"
)]
pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Role>, ApiError> {
    resource::get_role(&state.db, id).await.map(Json)
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = RoleUpdate,
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "Role updated", body = Role),
        (status = StatusCode::NOT_FOUND, description = "Role not found", body = ErrorResponse),
        (status = StatusCode::CONFLICT, description = "Name already in use", body = ErrorResponse)
    ),
    summary = "Update a role"
)]
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<RoleUpdate>,
) -> Result<Json<Role>, ApiError> {
    resource::update_role(&state.db, id, input).await.map(Json)
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(("id" = Uuid, Path, description = "Role id")),
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "Role deleted", body = MessageResponse),
        (status = StatusCode::NOT_FOUND, description = "Role not found", body = ErrorResponse),
        (status = StatusCode::CONFLICT, description = "Role still assigned to users", body = ErrorResponse)
    ),
    summary = "Delete a role"
)]
pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    resource::delete_role(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Role deleted successfully")))
}
