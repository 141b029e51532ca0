use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::models::reviews::ReviewListDBResponse;
use crate::types::{RepositoryId, ReviewId};

/// A pull-request identifier as submitted by CI: either a number or a string.
/// Stored as text.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PrNumber {
    Number(i64),
    Text(String),
}

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrNumber::Number(n) => write!(f, "{n}"),
            PrNumber::Text(s) => f.write_str(s),
        }
    }
}

/// Body of a review submission. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// The unified diff to review. Required and non-empty.
    pub diff: Option<String>,
    /// Optional custom system prompt replacing the default reviewer persona
    pub prompt: Option<String>,
    /// Optional pull-request identifier, recorded alongside the review
    #[serde(rename = "prNumber")]
    pub pr_number: Option<PrNumber>,
}

/// Query parameters for listing reviews.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ListReviewsQuery {
    /// Restrict results to a single repository (must be owned by the caller)
    #[serde(rename = "repositoryId")]
    #[param(value_type = Option<String>, format = "uuid")]
    pub repository_id: Option<RepositoryId>,
}

/// A persisted review, annotated with the repository name.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ReviewId,
    #[schema(value_type = String, format = "uuid")]
    pub repository_id: RepositoryId,
    pub repository_name: String,
    pub pr_number: String,
    pub diff_summary: String,
    pub ai_review: String,
    pub quality_score: i32,
    pub security_risk: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewListDBResponse> for ReviewResponse {
    fn from(review: ReviewListDBResponse) -> Self {
        Self {
            id: review.id,
            repository_id: review.repository_id,
            repository_name: review.repository_name,
            pr_number: review.pr_number,
            diff_summary: review.diff_summary,
            ai_review: review.ai_review,
            quality_score: review.quality_score,
            security_risk: review.security_risk,
            created_at: review.created_at,
        }
    }
}
