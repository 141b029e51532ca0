//! API-key extractor for review submissions.
//!
//! Review submissions carry an optional repository API key, read from the
//! `X-Api-Key` header or the `apiKey` query parameter (header wins). The
//! three outcomes are deliberately distinct: no key at all still produces a
//! review (just not a persisted one), while a key that resolves to nothing
//! is rejected outright.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument};

use crate::{
    AppState,
    db::errors::DbError,
    db::handlers::Repos,
    db::models::repos::RepositoryDBResponse,
    errors::{Error, Result},
    types::abbrev_uuid,
};

/// Authentication outcome for a review submission.
#[derive(Debug, Clone)]
pub enum ReviewAuth {
    /// No API key supplied: the review runs but nothing is persisted.
    Anonymous,
    /// A valid key resolved to this repository.
    Repository(RepositoryDBResponse),
}

fn api_key_from_parts(parts: &Parts) -> Option<String> {
    if let Some(key) = parts.headers.get("x-api-key").and_then(|h| h.to_str().ok()) {
        return Some(key.to_string());
    }

    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "apiKey")
        .map(|(_, value)| value.into_owned())
}

impl FromRequestParts<AppState> for ReviewAuth {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(key) = api_key_from_parts(parts) else {
            return Ok(ReviewAuth::Anonymous);
        };

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(DbError::from(e)))?;
        let mut repos = Repos::new(&mut conn);

        match repos.get_by_api_key(&key).await? {
            Some(repository) => {
                debug!("Review authenticated for repository {}", abbrev_uuid(&repository.id));
                Ok(ReviewAuth::Repository(repository))
            }
            None => Err(Error::Unauthenticated {
                message: Some("Invalid API key provided".to_string()),
            }),
        }
    }
}
