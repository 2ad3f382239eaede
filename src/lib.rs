//! Storybooks - share short public and private stories
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Web Layer (Axum)                        │
//! │  - Index, stories and auth routes                           │
//! │  - Server-rendered HTML, flash notices                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Visibility and ownership rules                           │
//! │  - Form validation                                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `web`: HTTP handlers and HTML views
//! - `service`: Business logic layer
//! - `data`: Database layer
//! - `auth`: Google OAuth and signed sessions
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod web;

use std::sync::Arc;

use axum::extract::Request;

/// Application state shared across all handlers
///
/// Cloned for each request; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// HTTP client for the identity provider
    pub http_client: Arc<reqwest::Client>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database and run migrations
    /// 2. Build HTTP client
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db =
            data::Database::connect(&config.database.url, config.database.max_connections).await?;
        tracing::info!("Database connected");

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("Storybooks/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        tracing::info!("Application state initialized successfully");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            http_client: Arc::new(http_client),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        catch_panic::CatchPanicLayer, compression::CompressionLayer, services::ServeDir,
        trace::TraceLayer,
    };

    let static_files = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .merge(web::index_router())
        .nest("/auth", auth::auth_router())
        .nest("/stories", web::stories_router())
        .nest_service("/public", static_files)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
        .merge(web::metrics_router())
}

/// Wrap a router so HTML forms can reach PUT and DELETE routes.
///
/// Method rewriting must happen before routing, so this wraps the
/// finished router instead of being added with `Router::layer`.
pub fn with_method_override(
    router: axum::Router,
) -> tower::util::MapRequest<axum::Router, fn(Request) -> Request> {
    use tower::Layer;

    tower::util::MapRequestLayer::new(web::method_override::override_method as fn(Request) -> Request)
        .layer(router)
}

async fn health_check() -> &'static str {
    "OK"
}
