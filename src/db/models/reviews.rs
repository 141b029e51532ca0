use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::review::SecurityRisk;
use crate::types::{RepositoryId, ReviewId};

/// Data required to insert a new review row.
#[derive(Debug, Clone)]
pub struct ReviewCreateDBRequest {
    pub repository_id: RepositoryId,
    pub pr_number: String,
    pub diff_summary: String,
    pub ai_review: String,
    pub quality_score: i32,
    pub security_risk: SecurityRisk,
}

/// A review row as stored. Review rows are immutable once written.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewDBResponse {
    pub id: ReviewId,
    pub repository_id: RepositoryId,
    pub pr_number: String,
    pub diff_summary: String,
    pub ai_review: String,
    pub quality_score: i32,
    pub security_risk: String,
    pub created_at: DateTime<Utc>,
}

/// A review row joined with its repository's name, for listing.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewListDBResponse {
    pub id: ReviewId,
    pub repository_id: RepositoryId,
    pub repository_name: String,
    pub pr_number: String,
    pub diff_summary: String,
    pub ai_review: String,
    pub quality_score: i32,
    pub security_risk: String,
    pub created_at: DateTime<Utc>,
}
