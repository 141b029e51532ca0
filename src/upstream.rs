//! Client for the hosted chat-completion endpoint.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;
use utoipa::ToSchema;

use crate::config::Config;
use crate::errors::{Error, Result};

/// A single chat message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Assemble a completion request body.
///
/// Caller-supplied extra fields are merged first; the normalized fields
/// (`messages`, `temperature`, `max_tokens`) are written over them afterwards,
/// so a stray `messages` key in `extra` can never displace the real payload.
pub fn build_payload(
    messages: &[ChatMessage],
    temperature: Option<f64>,
    max_tokens: Option<u64>,
    extra: &Map<String, Value>,
) -> Result<Value> {
    if messages.is_empty() {
        return Err(Error::BadRequest {
            message: "messages must be a non-empty array".to_string(),
        });
    }

    let mut body = extra.clone();
    if let Some(temperature) = temperature {
        body.insert("temperature".to_string(), temperature.into());
    }
    if let Some(max_tokens) = max_tokens {
        body.insert("max_tokens".to_string(), max_tokens.into());
    }
    body.insert(
        "messages".to_string(),
        serde_json::to_value(messages).map_err(|e| Error::Internal {
            operation: format!("serialize completion messages: {e}"),
        })?,
    );

    Ok(Value::Object(body))
}

/// HTTP client for the configured completion deployment.
///
/// One attempt per call: failures surface to the caller as 502s, never
/// retried here.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl CompletionClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.upstream.completions_url(),
            api_key: config.upstream.api_key.clone(),
        }
    }

    /// POST a completion payload and return the raw response JSON.
    #[instrument(skip_all, err)]
    pub async fn complete(&self, payload: &Value) -> Result<Value> {
        let response = self.http.post(&self.url).header("api-key", &self.api_key).json(payload).send().await.map_err(|e| {
            Error::Upstream {
                status: e.status().map(|s| s.as_u16()),
                body: Some(Value::String(e.to_string())),
            }
        })?;

        let status: StatusCode = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.ok();
            return Err(Error::Upstream {
                status: Some(status.as_u16()),
                body,
            });
        }

        response.json::<Value>().await.map_err(|e| Error::Upstream {
            status: Some(status.as_u16()),
            body: Some(Value::String(format!("invalid JSON from upstream: {e}"))),
        })
    }
}
