use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided or invalid
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Caller is authenticated but does not own the resource
    #[error("Access denied to {resource}")]
    Forbidden { resource: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Client exceeded the request rate limit
    #[error("Too many requests")]
    TooManyRequests,

    /// The upstream completion service failed or was unreachable
    #[error("Upstream completion service error")]
    Upstream {
        status: Option<u16>,
        body: Option<serde_json::Value>,
    },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::Forbidden { resource } => format!("Access denied to {resource}"),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::TooManyRequests => "Too many requests, please try again later.".to_string(),
            Error::Upstream { .. } => "Failed to get review from AI service".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists".to_string(),
                    (Some("repositories"), Some(c)) if c.contains("api_key") => "Generated key collided, please retry".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Upstream { status, body } => {
                tracing::error!(?status, ?body, "Upstream completion service error");
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::TooManyRequests => {
                tracing::info!("Rate limit exceeded");
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // Upstream failures echo the upstream status and body so callers can diagnose
            Error::Upstream {
                status: upstream_status,
                body,
            } => {
                let body = json!({
                    "error": self.user_message(),
                    "upstream_status": upstream_status,
                    "details": body,
                });
                (status, Json(body)).into_response()
            }
            _ => {
                let body = json!({ "error": self.user_message() });
                (status, Json(body)).into_response()
            }
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            Error::Unauthenticated { message: None }.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            Error::Forbidden {
                resource: "repository".to_string()
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::BadRequest {
                message: "diff is required".to_string()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::TooManyRequests.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            Error::Upstream { status: Some(500), body: None }.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            Error::Database(DbError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Database(DbError::UniqueViolation {
                constraint: None,
                table: None,
                message: String::new()
            })
            .status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_errors_do_not_leak_detail() {
        let err = Error::Internal {
            operation: "connect to secret internal host".to_string(),
        };
        assert_eq!(err.user_message(), "Internal server error");

        let err = Error::Other(anyhow::anyhow!("pool timed out talking to 10.0.0.3"));
        assert_eq!(err.user_message(), "Internal server error");
    }
}
