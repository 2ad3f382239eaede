//! Web layer
//!
//! HTTP handlers for:
//! - Index pages (welcome, dashboard, about)
//! - Stories and comments
//! - Metrics (Prometheus)
//!
//! Plus the glue they share: flash notices, HTML views and the form
//! method override.

pub mod flash;
mod index;
pub mod method_override;
pub mod metrics;
mod stories;
pub mod views;

use axum::response::Html;
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::auth::Session;
use flash::FlashStore;
use views::PageContext;

pub use index::index_router;
pub use metrics::metrics_router;
pub use stories::stories_router;

/// Render a full page, consuming any pending flash notices
pub(crate) fn render_page<F>(
    state: &AppState,
    jar: CookieJar,
    user: Option<&Session>,
    page: F,
) -> (CookieJar, Html<String>)
where
    F: FnOnce(&PageContext<'_>) -> String,
{
    let (jar, flashes) = FlashStore::from_config(&state.config).take(jar);
    let html = page(&PageContext::new(user, &flashes));
    (jar, Html(html))
}
