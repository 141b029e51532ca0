use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::{RepositoryId, UserId};

/// Data required to insert a new repository row.
#[derive(Debug, Clone)]
pub struct RepositoryCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
    pub source_url: String,
    pub api_key: String,
}

/// A repository row as stored. The api_key is the plaintext key handed to CI
/// integrations.
#[derive(Debug, Clone, FromRow)]
pub struct RepositoryDBResponse {
    pub id: RepositoryId,
    pub user_id: UserId,
    pub name: String,
    pub source_url: String,
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}
