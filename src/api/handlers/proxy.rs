//! Pass-through chat-completions proxy.

use axum::{Json, extract::State};
use serde_json::Value;
use tracing::instrument;

use crate::{
    AppState,
    errors::{Error, Result},
    upstream::{ChatMessage, build_payload},
};

/// Forward a chat-completion request to the configured deployment.
///
/// The body is forwarded wholesale after validating `messages`; the response
/// comes back verbatim. No authentication: callers use the operator's
/// configured upstream credentials.
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    responses(
        (status = 200, description = "Raw upstream completion JSON"),
        (status = 400, description = "Body is not an object or messages is missing/empty"),
        (status = 502, description = "Upstream completion service failed"),
    ),
    tag = "proxy"
)]
#[instrument(skip(state, body))]
pub async fn chat_completions(State(state): State<AppState>, Json(body): Json<Value>) -> Result<Json<Value>> {
    let Some(object) = body.as_object() else {
        return Err(Error::BadRequest {
            message: "request body must be a JSON object".to_string(),
        });
    };

    let messages: Vec<ChatMessage> = match object.get("messages") {
        Some(value) => serde_json::from_value(value.clone()).map_err(|_| Error::BadRequest {
            message: "messages must be an array of {role, content} objects".to_string(),
        })?,
        None => Vec::new(),
    };

    let temperature = object.get("temperature").and_then(Value::as_f64);
    let max_tokens = object.get("max_tokens").and_then(Value::as_u64);

    let mut extra = object.clone();
    extra.remove("messages");
    extra.remove("temperature");
    extra.remove("max_tokens");

    // build_payload rejects the empty-messages case
    let payload = build_payload(&messages, temperature, max_tokens, &extra)?;
    let response = state.completions.complete(&payload).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_server_with_upstream;
    use serde_json::json;
    use sqlx::PgPool;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[sqlx::test(migrations = "./migrations")]
    #[test_log::test]
    async fn test_forwards_body_and_returns_raw_json(pool: PgPool) {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 16,
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "chatcmpl-1", "choices": []})))
            .expect(1)
            .mount(&upstream)
            .await;
        let server = create_test_server_with_upstream(pool, &upstream.uri()).await;

        let response = server
            .post("/v1/chat/completions")
            .json(&json!({
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 16,
                "stream": false
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["id"], "chatcmpl-1");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[test_log::test]
    async fn test_rejects_missing_or_empty_messages(pool: PgPool) {
        let upstream = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&upstream).await;
        let server = create_test_server_with_upstream(pool, &upstream.uri()).await;

        let response = server.post("/v1/chat/completions").json(&json!({"messages": []})).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        let response = server.post("/v1/chat/completions").json(&json!({"model": "gpt-4o"})).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        let response = server.post("/v1/chat/completions").json(&json!(["not", "an", "object"])).await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[test_log::test]
    async fn test_upstream_error_echoed_as_bad_gateway(pool: PgPool) {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad upstream key"})))
            .mount(&upstream)
            .await;
        let server = create_test_server_with_upstream(pool, &upstream.uri()).await;

        let response = server
            .post("/v1/chat/completions")
            .json(&json!({"messages": [{"role": "user", "content": "hi"}]}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = response.json();
        assert_eq!(body["upstream_status"], 401);
        assert_eq!(body["details"]["error"], "bad upstream key");
    }
}
