//! Index pages
//!
//! - GET / - Welcome page (guests only)
//! - GET /dashboard - Caller's stories
//! - GET /about - About page

use axum::{Router, extract::State, response::Html, routing::get};
use axum_extra::extract::CookieJar;

use super::{render_page, views};
use crate::AppState;
use crate::auth::{CurrentUser, Guest, MaybeUser};
use crate::error::AppError;
use crate::service::StoryService;

pub fn index_router() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/dashboard", get(dashboard))
        .route("/about", get(about))
}

async fn welcome(
    _guest: Guest,
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Html<String>) {
    render_page(&state, jar, None, views::welcome)
}

async fn dashboard(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>), AppError> {
    let stories = StoryService::new(state.db.clone())
        .list_owned(Some(&session.user_id))
        .await?;

    Ok(render_page(&state, jar, Some(&session), |ctx| {
        views::dashboard(ctx, &stories)
    }))
}

async fn about(
    user: MaybeUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Html<String>) {
    render_page(&state, jar, user.0.as_ref(), views::about)
}
