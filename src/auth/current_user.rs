//! Bearer-token extractor for authenticated dashboard users.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::instrument;

use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    errors::{Error, Result},
};

/// Extract the bearer token from an `Authorization` header.
///
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(token)): Bearer token present
/// - Some(Err(error)): Header present but not valid UTF-8
fn bearer_token(parts: &Parts) -> Option<Result<&str>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    auth_str.strip_prefix("Bearer ").map(Ok)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = match bearer_token(parts) {
            Some(Ok(token)) => token,
            Some(Err(e)) => return Err(e),
            None => {
                return Err(Error::Unauthenticated {
                    message: Some("Missing bearer token".to_string()),
                });
            }
        };

        session::verify_session_token(token, &state.config)
    }
}
