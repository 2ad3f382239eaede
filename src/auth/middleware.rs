//! Authorization guards
//!
//! Two predicates, "is authenticated" and "is guest", usable directly
//! or as extractors in handler signatures.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
    response::Redirect,
};
use axum_extra::extract::CookieJar;

use super::session::{SESSION_COOKIE, Session, verify_session_token};
use crate::AppState;
use crate::error::AppError;

/// Where signed-in users land when they hit a guest-only page
pub const AUTHENTICATED_LANDING: &str = "/dashboard";

fn session_from_headers(headers: &HeaderMap, secret: &str) -> Option<Session> {
    let jar = CookieJar::from_headers(headers);
    let token = jar.get(SESSION_COOKIE)?.value().to_owned();

    match verify_session_token(&token, secret) {
        Ok(session) => Some(session),
        Err(error) => {
            tracing::debug!(%error, "Ignoring invalid session cookie");
            None
        }
    }
}

/// Passes iff a session user is attached.
///
/// `AppError::Unauthorized` renders as a redirect to the login page.
pub fn ensure_authenticated(session: Option<Session>) -> Result<Session, AppError> {
    session.ok_or(AppError::Unauthorized)
}

/// Passes iff no session user is attached.
pub fn ensure_guest(session: Option<&Session>) -> Result<(), Redirect> {
    match session {
        Some(_) => Err(Redirect::to(AUTHENTICATED_LANDING)),
        None => Ok(()),
    }
}

/// Extractor for current authenticated user
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(session): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", session.display_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeUser(session) = MaybeUser::from_request_parts(parts, state)
            .await
            .unwrap_or(MaybeUser(None));

        ensure_authenticated(session).map(CurrentUser)
    }
}

/// Optional current user extractor
///
/// Returns None if not authenticated, instead of error.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Session>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|session| session.user_id.as_str())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(MaybeUser(Some(session)));
        }

        let app_state = AppState::from_ref(state);
        let session = session_from_headers(&parts.headers, &app_state.config.auth.session_secret);

        if let Some(session) = &session {
            parts.extensions.insert(session.clone());
        }

        Ok(MaybeUser(session))
    }
}

/// Guest-only extractor; signed-in users are redirected to the dashboard
#[derive(Debug, Clone, Copy)]
pub struct Guest;

#[async_trait]
impl<S> FromRequestParts<S> for Guest
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeUser(session) = MaybeUser::from_request_parts(parts, state)
            .await
            .unwrap_or(MaybeUser(None));

        ensure_guest(session.as_ref()).map(|()| Guest)
    }
}
