use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::repos::RepositoryDBResponse;
use crate::types::RepositoryId;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RepositoryCreateRequest {
    /// Display name for the repository
    pub name: String,
    /// Source URL, e.g. the GitHub repository URL
    pub url: String,
}

/// Full repository record, including the plaintext API key the owner pastes
/// into their CI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RepositoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RepositoryId,
    pub name: String,
    pub url: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

impl From<RepositoryDBResponse> for RepositoryResponse {
    fn from(repo: RepositoryDBResponse) -> Self {
        Self {
            id: repo.id,
            name: repo.name,
            url: repo.source_url,
            api_key: repo.api_key,
            created_at: repo.created_at,
        }
    }
}
