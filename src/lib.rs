//! # reviewd: AI Code-Review Gateway
//!
//! `reviewd` is a small backend that sits between CI pipelines (and a
//! dashboard frontend) and a hosted chat-completion deployment. It does two
//! things: proxies chat-completion requests to the configured upstream, and
//! runs an automated code-review pipeline whose structured results (quality
//! score, security risk level) are persisted per registered repository.
//!
//! ## Request Flow
//!
//! Dashboard users authenticate with a bearer session token (`/auth/signup`,
//! `/auth/login`) and manage repositories (`/repos`) and their review history
//! (`/reviews`). CI integrations call `/review` with a repository API key;
//! the diff is sent upstream with a fixed reviewer prompt, the closing
//! `Quality Score:` / `Security Risk Level:` lines are extracted from the
//! answer, and a review row is written when the key resolved to a
//! repository. `/v1/chat/completions` is a thin pass-through proxy.
//!
//! Every route sits behind a per-IP rate limit and a request body cap; all
//! configuration is loaded once at startup and validated before the server
//! binds (see [`config`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use reviewd::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = reviewd::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     reviewd::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
mod crypto;
pub mod db;
pub mod errors;
pub mod limits;
mod openapi;
pub mod review;
pub mod telemetry;
mod types;
pub mod upstream;

#[cfg(test)]
pub mod test_utils;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::limits::RateLimiter;
use crate::openapi::ApiDoc;
use crate::upstream::CompletionClient;

pub use types::{RepositoryId, ReviewId, UserId, abbrev_uuid};

/// Application state shared across all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub completions: CompletionClient,
    pub rate_limiter: Arc<RateLimiter>,
}

/// Get the reviewd database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the application router with all endpoints and middleware.
///
/// Layered outside-in: tracing, CORS, the request body cap, and the per-IP
/// rate limit all run before any handler.
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.limits.max_body_bytes;
    let middleware_state = state.clone();

    let routes = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/auth/signup", post(api::handlers::auth::signup))
        .route("/auth/login", post(api::handlers::auth::login))
        .route(
            "/repos",
            get(api::handlers::repos::list_repositories).post(api::handlers::repos::create_repository),
        )
        .route("/repos/{id}/regenerate-key", post(api::handlers::repos::regenerate_api_key))
        .route("/review", post(api::handlers::reviews::submit_review))
        .route("/reviews", get(api::handlers::reviews::list_reviews))
        .route("/v1/chat/completions", post(api::handlers::proxy::chat_completions))
        .with_state(state);

    routes
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(from_fn_with_state(middleware_state, limits::rate_limit_middleware))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to Postgres, runs migrations,
///    and binds the listen socket.
/// 2. **Serve**: [`Application::serve`] handles requests until the shutdown
///    future resolves, then closes the pool.
pub struct Application {
    router: Router,
    listener: TcpListener,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting review gateway with configuration: {:#?}", config);

        let database_url = config
            .database
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("database.url is required (or set DATABASE_URL)"))?;

        let pool = PgPool::connect(&database_url).await?;
        migrator().run(&pool).await?;

        let state = AppState::builder()
            .db(pool.clone())
            .completions(CompletionClient::new(&config))
            .rate_limiter(Arc::new(RateLimiter::new(&config.limits)))
            .config(config.clone())
            .build();
        let router = build_router(state);

        let listener = TcpListener::bind(config.bind_address()).await?;
        info!(
            "Review gateway listening on http://{}, available at http://localhost:{}",
            config.bind_address(),
            config.port
        );

        Ok(Self { router, listener, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        // ConnectInfo feeds the per-IP rate limiter
        axum::serve(self.listener, self.router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
