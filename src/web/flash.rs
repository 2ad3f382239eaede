//! One-shot flash notices
//!
//! Notices travel to the next rendered page in a signed cookie.
//! Pushing appends to whatever is already pending; rendering takes
//! and clears them.

use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::auth::session::{sign_token, verify_token};
use crate::config::AppConfig;
use crate::error::AppError;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "flash-success",
            Self::Error => "flash-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Reads and writes the flash cookie
pub struct FlashStore<'a> {
    secret: &'a str,
    secure: bool,
}

impl<'a> FlashStore<'a> {
    pub fn new(secret: &'a str, secure: bool) -> Self {
        Self { secret, secure }
    }

    pub fn from_config(config: &'a AppConfig) -> Self {
        Self::new(
            &config.auth.session_secret,
            config.should_use_secure_cookies(),
        )
    }

    /// Queue a notice for the next rendered page
    pub fn push(&self, jar: CookieJar, flash: Flash) -> Result<CookieJar, AppError> {
        let mut pending = self.pending(&jar);
        pending.push(flash);

        let token = sign_token(&pending, self.secret)?;
        let cookie = Cookie::build((FLASH_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();

        Ok(jar.add(cookie))
    }

    /// Take all pending notices, clearing the cookie
    pub fn take(&self, jar: CookieJar) -> (CookieJar, Vec<Flash>) {
        if jar.get(FLASH_COOKIE).is_none() {
            return (jar, Vec::new());
        }

        let pending = self.pending(&jar);
        let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
        (jar, pending)
    }

    fn pending(&self, jar: &CookieJar) -> Vec<Flash> {
        let Some(cookie) = jar.get(FLASH_COOKIE) else {
            return Vec::new();
        };

        verify_token(cookie.value(), self.secret).unwrap_or_else(|error| {
            tracing::debug!(%error, "Discarding unreadable flash cookie");
            Vec::new()
        })
    }
}
