//! Repository registration and API-key management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, instrument};

use crate::{
    AppState, crypto,
    api::models::repos::{RepositoryCreateRequest, RepositoryResponse},
    api::models::users::CurrentUser,
    db::errors::DbError,
    db::handlers::{Repos, Repository},
    db::models::repos::RepositoryCreateDBRequest,
    errors::{Error, Result},
    types::RepositoryId,
};

/// List the caller's registered repositories, newest first.
#[utoipa::path(
    get,
    path = "/repos",
    responses(
        (status = 200, description = "Repositories owned by the caller", body = Vec<RepositoryResponse>),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("bearer_auth" = [])),
    tag = "repos"
)]
#[instrument(skip(state))]
pub async fn list_repositories(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<RepositoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut repos = Repos::new(&mut conn);

    let repositories = repos.list_for_user(user.id).await?;
    Ok(Json(repositories.into_iter().map(RepositoryResponse::from).collect()))
}

/// Register a repository and mint its API key.
#[utoipa::path(
    post,
    path = "/repos",
    request_body = RepositoryCreateRequest,
    responses(
        (status = 201, description = "Repository created, key included", body = RepositoryResponse),
        (status = 400, description = "Missing name or url"),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("bearer_auth" = [])),
    tag = "repos"
)]
#[instrument(skip(state, request))]
pub async fn create_repository(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<RepositoryCreateRequest>,
) -> Result<impl IntoResponse> {
    let name = request.name.trim().to_string();
    let url = request.url.trim().to_string();
    if name.is_empty() || url.is_empty() {
        return Err(Error::BadRequest {
            message: "name and url are required".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut repos = Repos::new(&mut conn);

    let repository = repos
        .create(&RepositoryCreateDBRequest {
            user_id: user.id,
            name,
            source_url: url,
            api_key: crypto::generate_api_key(),
        })
        .await?;

    debug!("Registered repository {} for user {}", repository.id, user.id);
    Ok((StatusCode::CREATED, Json(RepositoryResponse::from(repository))))
}

/// Replace a repository's API key with a fresh one.
///
/// The swap is a single-row UPDATE: the old key stops resolving the moment
/// the new one exists, with no window where both work.
#[utoipa::path(
    post,
    path = "/repos/{id}/regenerate-key",
    params(("id" = uuid::Uuid, Path, description = "Repository ID")),
    responses(
        (status = 200, description = "Key replaced", body = RepositoryResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Repository owned by another user"),
        (status = 404, description = "Repository not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "repos"
)]
#[instrument(skip(state))]
pub async fn regenerate_api_key(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<RepositoryId>,
) -> Result<Json<RepositoryResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut repos = Repos::new(&mut conn);

    let Some(repository) = repos.get_by_id(id).await? else {
        return Err(Error::NotFound {
            resource: "Repository".to_string(),
            id: id.to_string(),
        });
    };

    // Existing but foreign repositories are a distinct outcome from unknown ones
    if repository.user_id != user.id {
        return Err(Error::Forbidden {
            resource: "repository".to_string(),
        });
    }

    let updated = repos.regenerate_key(id, &crypto::generate_api_key()).await?;
    Ok(Json(RepositoryResponse::from(updated)))
}

#[cfg(test)]
mod tests {
    use crate::crypto::API_KEY_PREFIX;
    use crate::test_utils::{create_test_server, signup_user};
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test(migrations = "./migrations")]
    #[test_log::test]
    async fn test_create_and_list_repositories(pool: PgPool) {
        let server = create_test_server(pool).await;
        let token = signup_user(&server, "owner@example.com").await;

        let response = server
            .post("/repos")
            .authorization_bearer(&token)
            .json(&json!({"name": "widget", "url": "https://github.com/acme/widget"}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let repo: serde_json::Value = response.json();
        let key = repo["api_key"].as_str().unwrap();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + 64);

        let response = server.get("/repos").authorization_bearer(&token).await;
        response.assert_status_ok();
        let listed: Vec<serde_json::Value> = response.json();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["name"], "widget");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[test_log::test]
    async fn test_create_requires_name_and_url(pool: PgPool) {
        let server = create_test_server(pool).await;
        let token = signup_user(&server, "owner@example.com").await;

        let response = server
            .post("/repos")
            .authorization_bearer(&token)
            .json(&json!({"name": "", "url": "https://github.com/acme/widget"}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        let response = server
            .post("/repos")
            .authorization_bearer(&token)
            .json(&json!({"name": "widget", "url": "   "}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[test_log::test]
    async fn test_requires_bearer_token(pool: PgPool) {
        let server = create_test_server(pool).await;

        let response = server.get("/repos").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        let response = server.get("/repos").authorization_bearer("not-a-valid-jwt").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[test_log::test]
    async fn test_regenerate_key_changes_key(pool: PgPool) {
        let server = create_test_server(pool).await;
        let token = signup_user(&server, "owner@example.com").await;

        let created: serde_json::Value = server
            .post("/repos")
            .authorization_bearer(&token)
            .json(&json!({"name": "widget", "url": "https://github.com/acme/widget"}))
            .await
            .json();
        let repo_id = created["id"].as_str().unwrap().to_string();
        let old_key = created["api_key"].as_str().unwrap().to_string();

        let response = server
            .post(&format!("/repos/{repo_id}/regenerate-key"))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let updated: serde_json::Value = response.json();
        assert_ne!(updated["api_key"].as_str().unwrap(), old_key);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[test_log::test]
    async fn test_regenerate_distinguishes_missing_from_foreign(pool: PgPool) {
        let server = create_test_server(pool).await;
        let owner_token = signup_user(&server, "owner@example.com").await;
        let other_token = signup_user(&server, "other@example.com").await;

        let created: serde_json::Value = server
            .post("/repos")
            .authorization_bearer(&owner_token)
            .json(&json!({"name": "widget", "url": "https://github.com/acme/widget"}))
            .await
            .json();
        let repo_id = created["id"].as_str().unwrap().to_string();

        // Someone else's repository: 403
        let response = server
            .post(&format!("/repos/{repo_id}/regenerate-key"))
            .authorization_bearer(&other_token)
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);

        // Unknown id: 404
        let response = server
            .post(&format!("/repos/{}/regenerate-key", uuid::Uuid::new_v4()))
            .authorization_bearer(&owner_token)
            .await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }
}
