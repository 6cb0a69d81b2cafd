//! OpenAPI document assembled from the handler annotations.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::handlers::{posts, roles, users};

pub const DOCS_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inkpress API",
        description = "Users, posts and roles with query-string filtering, sorting and pagination"
    ),
    modifiers(&BearerAuth),
    tags(
        (name = users::AUTH_TAG, description = "Registration and login"),
        (name = users::TAG, description = "User accounts"),
        (name = posts::TAG, description = "Posts addressed by slug"),
        (name = roles::TAG, description = "Roles")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected operations.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
