//! OpenAPI document for the HTTP surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::models::auth::{AuthResponse, LoginRequest, SignupRequest};
use crate::api::models::repos::{RepositoryCreateRequest, RepositoryResponse};
use crate::api::models::reviews::{PrNumber, ReviewRequest, ReviewResponse};
use crate::api::models::users::UserResponse;
use crate::review::SecurityRisk;
use crate::upstream::ChatMessage;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::auth::signup,
        crate::api::handlers::auth::login,
        crate::api::handlers::repos::list_repositories,
        crate::api::handlers::repos::create_repository,
        crate::api::handlers::repos::regenerate_api_key,
        crate::api::handlers::reviews::submit_review,
        crate::api::handlers::reviews::list_reviews,
        crate::api::handlers::proxy::chat_completions,
    ),
    components(schemas(
        SignupRequest,
        LoginRequest,
        AuthResponse,
        UserResponse,
        RepositoryCreateRequest,
        RepositoryResponse,
        ReviewRequest,
        ReviewResponse,
        PrNumber,
        SecurityRisk,
        ChatMessage,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Account signup and login"),
        (name = "repos", description = "Repository registration and API keys"),
        (name = "reviews", description = "AI review pipeline and history"),
        (name = "proxy", description = "Pass-through chat completions"),
    ),
    info(
        title = "reviewd API",
        description = "AI code-review gateway: proxied chat completions plus persisted per-repository review results."
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}
