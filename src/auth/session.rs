//! Session management
//!
//! Uses HMAC-signed tokens stored in cookies.
//! No server-side session storage needed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::data::User;
use crate::error::AppError;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Signed-in user data
///
/// Stored in a signed cookie and handed to handlers explicitly
/// through the `CurrentUser` / `MaybeUser` extractors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Internal user ID
    pub user_id: String,
    pub display_name: String,
    /// Profile picture URL from Google
    pub image: Option<String>,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for a user that just signed in
    pub fn for_user(user: &User, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id.clone(),
            display_name: user.display_name.clone(),
            image: user.image.clone(),
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Sign any serializable value
///
/// Token format: base64(payload).base64(hmac_sha256(payload))
pub fn sign_token<T: Serialize>(value: &T, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let payload = serde_json::to_string(value).map_err(|e| AppError::Internal(e.into()))?;
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify a token produced by [`sign_token`] and decode its payload
///
/// # Errors
/// `InvalidSignature` if the signature does not match, `Unauthorized`
/// if the token is malformed.
pub fn verify_token<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let Some((payload_b64, signature_b64)) = token.split_once('.') else {
        return Err(AppError::Unauthorized);
    };
    if signature_b64.contains('.') {
        return Err(AppError::Unauthorized);
    }

    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Encryption(e.to_string()))?;
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::InvalidSignature)?;

    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    serde_json::from_slice(&payload_bytes).map_err(|_| AppError::Unauthorized)
}

/// Create a signed session token
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    sign_token(session, secret)
}

/// Verify and decode a session token, rejecting expired sessions
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    let session: Session = verify_token(token, secret)?;

    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}
