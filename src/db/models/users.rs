use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::UserId;

/// Data required to insert a new user row.
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// A user row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
