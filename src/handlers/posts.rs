use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    middleware,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::auth::{AuthenticatedUser, require_auth};
use crate::core::list_resources;
use crate::errors::{ApiError, ErrorResponse};
use crate::filtering::{ListParams, ListQuery};
use crate::resources::post::{self as resource, Post, PostCreate, PostUpdate};
use crate::response::{ListResponse, MessageResponse};
use crate::state::AppState;

pub const TAG: &str = "posts";

/// Reads are public, writes need a bearer token.
pub fn router(state: &AppState) -> OpenApiRouter<AppState> {
    let public = OpenApiRouter::new()
        .routes(routes!(list_posts))
        .routes(routes!(get_post));

    let protected = OpenApiRouter::new()
        .routes(routes!(create_post))
        .routes(routes!(update_post, delete_post))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public.merge(protected)
}

#[utoipa::path(
    get,
    path = "/",
    tag = TAG,
    params(ListParams),
    responses(
        (status = StatusCode::OK, description = "Page of posts", body = ListResponse<Post>),
        (status = StatusCode::BAD_REQUEST, description = "Field or operator not allowed", body = ErrorResponse)
    ),
    summary = "List posts",
    description = "Filter with `search=field:operator:value` and order with `sort=field:direction`. \
                   Searchable: title, slug, author_id, created_at. Sortable: title, created_at, updated_at."
)]
pub async fn list_posts(
    State(state): State<AppState>,
    query: ListQuery,
) -> Result<Json<ListResponse<Post>>, ApiError> {
    list_resources::<Post>(&state.db, &query, state.response_flags())
        .await
        .map(Json)
}

#[utoipa::path(
    get,
    path = "/{slug}",
    tag = TAG,
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = StatusCode::OK, description = "The post", body = Post),
        (status = StatusCode::NOT_FOUND, description = "No post with this slug", body = ErrorResponse)
    ),
    summary = "Get a post by slug"
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    resource::get_post(&state.db, &slug).await.map(Json)
}

#[utoipa::path(
    post,
    path = "/",
    tag = TAG,
    request_body = PostCreate,
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::CREATED, description = "Post created", body = Post),
        (status = StatusCode::UNAUTHORIZED, description = "Missing or invalid token", body = ErrorResponse),
        (status = StatusCode::CONFLICT, description = "Slug already in use", body = ErrorResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid input", body = ErrorResponse)
    ),
    summary = "Create a post",
    description = "The slug is derived from the title unless one is supplied. \
                   Generated slugs get a numeric suffix when the base is taken."
)]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(input): Json<PostCreate>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let created = resource::create_post(&state.db, &user, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/{slug}",
    tag = TAG,
    params(("slug" = String, Path, description = "Current post slug")),
    request_body = PostUpdate,
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "Post updated", body = Post),
        (status = StatusCode::FORBIDDEN, description = "Not the author", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "No post with this slug", body = ErrorResponse),
        (status = StatusCode::CONFLICT, description = "Slug taken or concurrent update", body = ErrorResponse),
        (status = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid input", body = ErrorResponse)
    ),
    summary = "Update a post"
)]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
    Json(input): Json<PostUpdate>,
) -> Result<Json<Post>, ApiError> {
    resource::update_post(&state.db, &user, &slug, input)
        .await
        .map(Json)
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = TAG,
    params(("slug" = String, Path, description = "Post slug")),
    security(("bearer_auth" = [])),
    responses(
        (status = StatusCode::OK, description = "Post deleted", body = MessageResponse),
        (status = StatusCode::FORBIDDEN, description = "Not the author", body = ErrorResponse),
        (status = StatusCode::NOT_FOUND, description = "No post with this slug", body = ErrorResponse)
    ),
    summary = "Delete a post"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(slug): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    resource::delete_post(&state.db, &user, &slug).await?;
    Ok(Json(MessageResponse::new("Post deleted successfully")))
}
