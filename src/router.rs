use axum::{Json, Router, routing::get};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::handlers::{posts, roles, users};
use crate::openapi::{ApiDoc, DOCS_PATH};
use crate::state::AppState;

/// Assemble every route under `/api`, plus the OpenAPI document.
pub fn build_router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", users::auth_router())
        .nest("/api/users", users::router(&state))
        .nest("/api/posts", posts::router(&state))
        .nest("/api/roles", roles::router(&state))
        .split_for_parts();

    let api = Arc::new(api);
    router
        .route(
            DOCS_PATH,
            get(move || {
                let api = Arc::clone(&api);
                async move { Json(api.as_ref().clone()) }
            }),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
