//! Signup and login.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

use crate::{
    AppState,
    api::models::auth::{AuthResponse, LoginRequest, SignupRequest},
    api::models::users::CurrentUser,
    auth::{password, session},
    db::errors::DbError,
    db::handlers::{Repository, Users},
    db::models::users::UserCreateDBRequest,
    errors::{Error, Result},
};

/// Both unknown email and wrong password collapse into the same answer so
/// the endpoint cannot be used to probe for accounts.
fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    }
}

/// Create a new user account and issue a session token.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
#[instrument(skip(state, request))]
pub async fn signup(State(state): State<AppState>, Json(request): Json<SignupRequest>) -> Result<impl IntoResponse> {
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();
    if username.is_empty() || email.is_empty() {
        return Err(Error::BadRequest {
            message: "username and email are required".to_string(),
        });
    }
    if request.password.len() < 8 {
        return Err(Error::BadRequest {
            message: "password must be at least 8 characters".to_string(),
        });
    }

    // Argon2 is CPU-bound, keep it off the async workers
    let password_to_hash = request.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password_to_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("hash password: {e}"),
        })??;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    let user = users
        .create(&UserCreateDBRequest {
            username,
            email,
            password_hash,
        })
        .await?;

    debug!("Created user {}", user.id);

    let token = session::create_session_token(&CurrentUser::from(&user), &state.config)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// Authenticate with email and password and issue a session token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid email or password"),
    ),
    tag = "auth"
)]
#[instrument(skip(state, request))]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<AuthResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut users = Users::new(&mut conn);

    let Some(user) = users.get_user_by_email(request.email.trim()).await? else {
        return Err(invalid_credentials());
    };

    let password_to_check = request.password;
    let stored_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || password::verify_string(&password_to_check, &stored_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("verify password: {e}"),
        })??;

    if !valid {
        return Err(invalid_credentials());
    }

    let token = session::create_session_token(&CurrentUser::from(&user), &state.config)?;
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}
