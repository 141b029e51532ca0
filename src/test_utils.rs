//! Shared constructors for tests.

use std::sync::Arc;

use axum_test::TestServer;
use sqlx::PgPool;

use crate::config::{Config, UpstreamConfig};
use crate::limits::RateLimiter;
use crate::upstream::CompletionClient;
use crate::{AppState, build_router};

/// A config pointing at the given upstream endpoint, with test credentials.
pub fn create_test_config(upstream_endpoint: &str) -> Config {
    Config {
        secret_key: "test-secret-key-for-jwt".to_string(),
        upstream: UpstreamConfig {
            endpoint: upstream_endpoint.to_string(),
            api_key: "upstream-secret".to_string(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-02-01".to_string(),
        },
        ..Config::default()
    }
}

/// Test server whose upstream calls go to `upstream_endpoint` (usually a
/// wiremock server).
pub async fn create_test_server_with_upstream(pool: PgPool, upstream_endpoint: &str) -> TestServer {
    let config = create_test_config(upstream_endpoint);
    let state = AppState::builder()
        .db(pool)
        .completions(CompletionClient::new(&config))
        .rate_limiter(Arc::new(RateLimiter::new(&config.limits)))
        .config(config)
        .build();

    TestServer::new(build_router(state)).expect("Failed to create test server")
}

/// Test server with an unreachable upstream, for routes that never call it.
pub async fn create_test_server(pool: PgPool) -> TestServer {
    // Port 9 (discard) is never listening locally: upstream calls fail fast
    create_test_server_with_upstream(pool, "http://127.0.0.1:9").await
}

/// Sign up a fresh user and return their bearer token.
pub async fn signup_user(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/auth/signup")
        .json(&serde_json::json!({
            "username": email.split('@').next().unwrap_or("user"),
            "email": email,
            "password": "correct-horse-battery"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    body["token"].as_str().expect("signup response carries a token").to_string()
}
