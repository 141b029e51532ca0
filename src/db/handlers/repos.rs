use async_trait::async_trait;
use sqlx::PgConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::Repository;
use crate::db::models::repos::{RepositoryCreateDBRequest, RepositoryDBResponse};
use crate::types::{RepositoryId, UserId};

/// Data access for registered repositories.
pub struct Repos<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Repos<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Resolve an API key to its repository. Exact match only.
    #[instrument(skip(self, api_key), err)]
    pub async fn get_by_api_key(&mut self, api_key: &str) -> Result<Option<RepositoryDBResponse>> {
        let repo = sqlx::query_as::<_, RepositoryDBResponse>(
            "SELECT id, user_id, name, source_url, api_key, created_at
             FROM repositories
             WHERE api_key = $1",
        )
        .bind(api_key)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(repo)
    }

    /// All repositories owned by `user_id`, newest first.
    #[instrument(skip(self), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<RepositoryDBResponse>> {
        let repos = sqlx::query_as::<_, RepositoryDBResponse>(
            "SELECT id, user_id, name, source_url, api_key, created_at
             FROM repositories
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(repos)
    }

    /// Ids of every repository owned by `user_id`, for scoping review queries.
    #[instrument(skip(self), err)]
    pub async fn ids_for_user(&mut self, user_id: UserId) -> Result<Vec<RepositoryId>> {
        let ids = sqlx::query_scalar::<_, RepositoryId>("SELECT id FROM repositories WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(ids)
    }

    /// Swap in a fresh API key atomically. The previous key stops resolving
    /// the moment this commits.
    #[instrument(skip(self, new_key), err)]
    pub async fn regenerate_key(&mut self, id: RepositoryId, new_key: &str) -> Result<RepositoryDBResponse> {
        let repo = sqlx::query_as::<_, RepositoryDBResponse>(
            "UPDATE repositories
             SET api_key = $2
             WHERE id = $1
             RETURNING id, user_id, name, source_url, api_key, created_at",
        )
        .bind(id)
        .bind(new_key)
        .fetch_optional(&mut *self.db)
        .await?;

        repo.ok_or(DbError::NotFound)
    }
}

#[async_trait]
impl Repository for Repos<'_> {
    type CreateRequest = RepositoryCreateDBRequest;
    type Response = RepositoryDBResponse;
    type Id = RepositoryId;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let repo = sqlx::query_as::<_, RepositoryDBResponse>(
            "INSERT INTO repositories (user_id, name, source_url, api_key)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, name, source_url, api_key, created_at",
        )
        .bind(request.user_id)
        .bind(&request.name)
        .bind(&request.source_url)
        .bind(&request.api_key)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(repo)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let repo = sqlx::query_as::<_, RepositoryDBResponse>(
            "SELECT id, user_id, name, source_url, api_key, created_at
             FROM repositories
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(repo)
    }
}
