//! The review pipeline and review queries.

use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::reviews::{ListReviewsQuery, ReviewRequest, ReviewResponse},
    api::models::users::CurrentUser,
    auth::ReviewAuth,
    db::errors::DbError,
    db::handlers::{Repos, Repository, Reviews},
    db::models::reviews::ReviewCreateDBRequest,
    errors::{Error, Result},
    review::{self, ReviewAnalysis},
    upstream::{ChatMessage, build_payload},
};

/// Temperature used for review calls: near-deterministic output keeps the
/// closing score lines parseable.
const REVIEW_TEMPERATURE: f64 = 0.1;

/// How much of the diff is kept in the persisted summary.
const DIFF_SUMMARY_CHARS: usize = 500;

/// Run an AI review over a diff.
///
/// The upstream response is returned verbatim. When the request carried a
/// valid repository API key, the extracted score and risk level are also
/// persisted; without a key the review still runs but leaves no trace.
#[utoipa::path(
    post,
    path = "/review",
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Raw upstream completion JSON"),
        (status = 400, description = "Missing or empty diff"),
        (status = 401, description = "API key supplied but unknown"),
        (status = 502, description = "Upstream completion service failed"),
    ),
    tag = "reviews"
)]
#[instrument(skip(state, request))]
pub async fn submit_review(State(state): State<AppState>, auth: ReviewAuth, Json(request): Json<ReviewRequest>) -> Result<Json<Value>> {
    // Reject before composing anything: an empty diff never reaches upstream
    let diff = match request.diff {
        Some(diff) if !diff.is_empty() => diff,
        _ => {
            return Err(Error::BadRequest {
                message: "diff is required".to_string(),
            });
        }
    };

    let messages = vec![
        ChatMessage::system(review::compose_system_prompt(request.prompt.as_deref())),
        ChatMessage::user(review::compose_user_message(&diff)),
    ];
    let payload = build_payload(&messages, Some(REVIEW_TEMPERATURE), None, &Map::new())?;

    // Single attempt; failures surface as 502 before anything is persisted
    let response = state.completions.complete(&payload).await?;

    // An empty answer is treated the same as a missing one
    let answer = review::answer_content(&response).filter(|content| !content.is_empty());
    let analysis = ReviewAnalysis::parse(answer.unwrap_or_default());

    if let ReviewAuth::Repository(repository) = auth {
        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let mut reviews = Reviews::new(&mut conn);

        let created = reviews
            .create(&ReviewCreateDBRequest {
                repository_id: repository.id,
                pr_number: request.pr_number.map(|p| p.to_string()).unwrap_or_else(|| "N/A".to_string()),
                diff_summary: diff.chars().take(DIFF_SUMMARY_CHARS).collect(),
                ai_review: answer.unwrap_or("No content").to_string(),
                quality_score: analysis.quality_score,
                security_risk: analysis.security_risk,
            })
            .await?;

        debug!("Persisted review {} for repository {}", created.id, repository.id);
    }

    Ok(Json(response))
}

/// List persisted reviews across the caller's repositories.
#[utoipa::path(
    get,
    path = "/reviews",
    params(ListReviewsQuery),
    responses(
        (status = 200, description = "Reviews, newest first", body = Vec<ReviewResponse>),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Filter names a repository the caller does not own"),
    ),
    security(("bearer_auth" = [])),
    tag = "reviews"
)]
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListReviewsQuery>,
) -> Result<Json<Vec<ReviewResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let mut repos = Repos::new(&mut conn);
    let owned = repos.ids_for_user(user.id).await?;

    // A filter outside the caller's repositories is an authorization error,
    // never a silently empty list
    let scope = match query.repository_id {
        Some(filter) => {
            if !owned.contains(&filter) {
                return Err(Error::Forbidden {
                    resource: "repository".to_string(),
                });
            }
            vec![filter]
        }
        None => owned,
    };

    let mut reviews = Reviews::new(&mut conn);
    let listed = reviews.list_for_repositories(&scope).await?;
    Ok(Json(listed.into_iter().map(ReviewResponse::from).collect()))
}
