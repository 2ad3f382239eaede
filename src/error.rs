//! Error types for Storybooks
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` and renders an HTML error page
//! (or a redirect, for missing authentication).

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Authentication required (redirect to login)
    #[error("Authentication required")]
    Unauthorized,

    /// Caller does not own the resource (403)
    #[error("Not authorized")]
    Forbidden,

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Identity provider rejected or garbled the exchange (502)
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Signature verification failed
    #[error("Invalid signature")]
    InvalidSignature,

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl AppError {
    /// Label used for the error metric
    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::Database(_) => "database",
            AppError::HttpClient(_) => "http_client",
            AppError::OAuth(_) => "oauth",
            AppError::InvalidSignature => "invalid_signature",
            AppError::Config(_) => "config",
            AppError::Encryption(_) => "encryption",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Upstream failures are logged here and never shown verbatim.
    fn into_response(self) -> Response {
        use crate::metrics::ERRORS_TOTAL;

        ERRORS_TOTAL.with_label_values(&[self.error_type()]).inc();

        let (status, message) = match &self {
            AppError::Unauthorized | AppError::InvalidSignature => {
                return Redirect::to("/").into_response();
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Page not found".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::HttpClient(_) | AppError::OAuth(_) => {
                tracing::error!(error = %self, "Upstream request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "An upstream service failed".to_string(),
                )
            }
            AppError::Database(_)
            | AppError::Config(_)
            | AppError::Encryption(_)
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
        };

        let page = crate::web::views::error_page(status, &message);
        (status, Html(page)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
