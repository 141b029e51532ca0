use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::Result;
use crate::db::handlers::Repository;
use crate::db::models::reviews::{ReviewCreateDBRequest, ReviewDBResponse, ReviewListDBResponse};
use crate::types::{RepositoryId, ReviewId};

/// Data access for persisted reviews.
pub struct Reviews<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Reviews<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Reviews for the given repositories, newest first, each annotated with
    /// its repository's name. An empty id list yields an empty result.
    #[instrument(skip(self, repository_ids), err)]
    pub async fn list_for_repositories(&mut self, repository_ids: &[RepositoryId]) -> Result<Vec<ReviewListDBResponse>> {
        let reviews = sqlx::query_as::<_, ReviewListDBResponse>(
            "SELECT r.id, r.repository_id, p.name AS repository_name, r.pr_number,
                    r.diff_summary, r.ai_review, r.quality_score, r.security_risk, r.created_at
             FROM reviews r
             INNER JOIN repositories p ON r.repository_id = p.id
             WHERE r.repository_id = ANY($1)
             ORDER BY r.created_at DESC",
        )
        .bind(repository_ids)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(reviews)
    }
}

#[async_trait]
impl Repository for Reviews<'_> {
    type CreateRequest = ReviewCreateDBRequest;
    type Response = ReviewDBResponse;
    type Id = ReviewId;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let review = sqlx::query_as::<_, ReviewDBResponse>(
            "INSERT INTO reviews (repository_id, pr_number, diff_summary, ai_review, quality_score, security_risk)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, repository_id, pr_number, diff_summary, ai_review, quality_score, security_risk, created_at",
        )
        .bind(request.repository_id)
        .bind(&request.pr_number)
        .bind(&request.diff_summary)
        .bind(&request.ai_review)
        .bind(request.quality_score)
        .bind(request.security_risk.as_str())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(review)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let review = sqlx::query_as::<_, ReviewDBResponse>(
            "SELECT id, repository_id, pr_number, diff_summary, ai_review, quality_score, security_risk, created_at
             FROM reviews
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(review)
    }
}
