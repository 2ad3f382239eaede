//! Google OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with Google.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use url::Url;

use super::middleware::{AUTHENTICATED_LANDING, MaybeUser};
use super::session::{SESSION_COOKIE, Session, create_session_token};
use crate::AppState;
use crate::config::AppConfig;
use crate::data::{User, UserProfile};
use crate::error::AppError;
use crate::metrics::LOGINS_TOTAL;
use crate::service::UserService;
use crate::web::flash::{Flash, FlashStore};

const OAUTH_STATE_COOKIE: &str = "oauth_state";
const OAUTH_COOKIE_PATH: &str = "/auth";
const GOOGLE_SCOPES: &str = "profile email";

/// Create authentication router, nested under `/auth`
///
/// Routes:
/// - GET /auth/google - Redirect to Google
/// - GET /auth/google/callback - OAuth callback
/// - GET /auth/verify - Report the current session
/// - GET /auth/logout - Logout
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/google", get(google_redirect))
        .route("/google/callback", get(google_callback))
        .route("/verify", get(verify_session))
        .route("/logout", get(logout))
}

// =============================================================================
// Google OAuth
// =============================================================================

/// GET /auth/google
///
/// Redirects user to the Google consent screen.
///
/// # Steps
/// 1. Generate CSRF state token
/// 2. Store state in cookie
/// 3. Redirect to Google with client_id, redirect_uri, scope, state
async fn google_redirect(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let csrf_state = generate_csrf_state();
    let location = authorization_url(&state.config, &csrf_state)?;

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, csrf_state))
        .path(OAUTH_COOKIE_PATH)
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Redirect::to(location.as_str())))
}

fn authorization_url(config: &AppConfig, csrf_state: &str) -> Result<Url, AppError> {
    let mut url = Url::parse(&config.auth.google.authorize_url)
        .map_err(|e| AppError::Config(format!("auth.google.authorize_url is invalid: {e}")))?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", &config.auth.google.client_id)
        .append_pair("redirect_uri", &config.google_callback_url())
        .append_pair("scope", GOOGLE_SCOPES)
        .append_pair("state", csrf_state);

    Ok(url)
}

/// Query parameters from Google callback
#[derive(Debug, Default, Deserialize)]
struct GoogleCallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// CSRF state token
    state: Option<String>,
    /// Set when the user declined or Google failed
    error: Option<String>,
}

/// Google token response
#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

/// Google userinfo response (OpenID Connect claims)
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    name: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl From<GoogleUserInfo> for UserProfile {
    fn from(info: GoogleUserInfo) -> Self {
        let display_name = info
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| {
                let joined = [info.given_name.as_deref(), info.family_name.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                (!joined.trim().is_empty()).then_some(joined)
            })
            .or_else(|| info.email.clone())
            .unwrap_or_default();

        Self {
            google_id: info.sub,
            display_name,
            first_name: info.given_name,
            last_name: info.family_name,
            email: info.email,
            image: info.picture,
        }
    }
}

/// GET /auth/google/callback
///
/// # Steps
/// 1. Verify CSRF state
/// 2. Exchange code for access token
/// 3. Fetch user profile from Google
/// 4. Upsert local user
/// 5. Create session and set cookie
/// 6. Redirect to dashboard
///
/// Any failure leaves the caller signed out and sends them home with
/// an error notice.
async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<GoogleCallbackQuery>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let expected_state = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|cookie| cookie.value().to_owned());
    let jar = jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path(OAUTH_COOKIE_PATH));
    let flash = FlashStore::from_config(&state.config);

    let user = match complete_sign_in(&state, &query, expected_state.as_deref()).await {
        Ok(user) => user,
        Err(error) => {
            LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            match &error {
                AppError::Database(_) | AppError::Internal(_) => {
                    tracing::error!(%error, "Google sign-in failed")
                }
                _ => tracing::warn!(%error, "Google sign-in failed"),
            }

            let jar = flash.push(jar, Flash::error("Google sign-in failed"))?;
            return Ok((jar, Redirect::to("/")).into_response());
        }
    };

    LOGINS_TOTAL.with_label_values(&["success"]).inc();
    tracing::info!(user_id = %user.id, "User signed in");

    let session = Session::for_user(&user, state.config.auth.session_max_age);
    let token = create_session_token(&session, &state.config.auth.session_secret)?;
    let jar = jar.add(session_cookie(token, state.config.should_use_secure_cookies()));
    let jar = flash.push(jar, Flash::success("You are logged in!"))?;

    Ok((jar, Redirect::to(AUTHENTICATED_LANDING)).into_response())
}

async fn complete_sign_in(
    state: &AppState,
    query: &GoogleCallbackQuery,
    expected_state: Option<&str>,
) -> Result<User, AppError> {
    if let Some(error) = &query.error {
        return Err(AppError::OAuth(format!("provider returned error: {error}")));
    }

    let code = query
        .code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::OAuth("missing authorization code".to_string()))?;

    verify_csrf_state(query.state.as_deref(), expected_state)?;

    let access_token = exchange_code(state, code).await?;
    let profile = fetch_profile(state, &access_token).await?;

    UserService::new(state.db.clone()).sign_in(profile).await
}

async fn exchange_code(state: &AppState, code: &str) -> Result<String, AppError> {
    let google = &state.config.auth.google;
    let callback_url = state.config.google_callback_url();

    let response = state
        .http_client
        .post(&google.token_url)
        .form(&[
            ("code", code),
            ("client_id", google.client_id.as_str()),
            ("client_secret", google.client_secret.as_str()),
            ("redirect_uri", callback_url.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AppError::OAuth(format!(
            "token endpoint returned {}",
            response.status()
        )));
    }

    let token: GoogleTokenResponse = response.json().await?;
    Ok(token.access_token)
}

async fn fetch_profile(state: &AppState, access_token: &str) -> Result<UserProfile, AppError> {
    let response = state
        .http_client
        .get(&state.config.auth.google.userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(AppError::OAuth(format!(
            "userinfo endpoint returned {}",
            response.status()
        )));
    }

    let info: GoogleUserInfo = response.json().await?;
    Ok(info.into())
}

// =============================================================================
// Session inspection / Logout
// =============================================================================

/// GET /auth/verify
async fn verify_session(MaybeUser(session): MaybeUser) -> Json<serde_json::Value> {
    match session {
        Some(session) => {
            tracing::info!(user_id = %session.user_id, "Session verified");
            Json(serde_json::json!({
                "authenticated": true,
                "user_id": session.user_id,
                "display_name": session.display_name,
            }))
        }
        None => {
            tracing::info!("No session attached to request");
            Json(serde_json::json!({ "authenticated": false }))
        }
    }
}

/// GET /auth/logout
///
/// Clears session cookie and redirects home.
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    let jar = FlashStore::from_config(&state.config)
        .push(jar, Flash::success("You are logged out!"))?;

    Ok((jar, Redirect::to("/")))
}

// =============================================================================
// Helpers
// =============================================================================

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Generate a random CSRF state token
fn generate_csrf_state() -> String {
    use base64::{Engine as _, engine::general_purpose};
    use rand::RngCore;

    let mut bytes = [0_u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Verify CSRF state from cookie matches callback state
fn verify_csrf_state(received: Option<&str>, expected: Option<&str>) -> Result<(), AppError> {
    match (received, expected) {
        (Some(received), Some(expected)) if !expected.is_empty() && received == expected => Ok(()),
        (_, None) => Err(AppError::OAuth("missing state cookie".to_string())),
        _ => Err(AppError::OAuth("state mismatch".to_string())),
    }
}
