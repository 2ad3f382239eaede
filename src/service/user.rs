//! User service
//!
//! Local user records mirroring Google accounts.

use std::sync::Arc;

use crate::data::{Database, User, UserProfile};
use crate::error::AppError;

fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// User service
pub struct UserService {
    db: Arc<Database>,
}

impl UserService {
    /// Create new user service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Record a successful provider sign-in
    ///
    /// Creates the user on first sign-in; afterwards only the profile
    /// fields are refreshed.
    ///
    /// # Errors
    /// `Validation` if the provider did not send a subject identifier
    pub async fn sign_in(&self, profile: UserProfile) -> Result<User, AppError> {
        let google_id = profile.google_id.trim().to_string();
        if google_id.is_empty() {
            return Err(AppError::Validation(
                "provider profile has no subject identifier".to_string(),
            ));
        }

        let display_name = match profile.display_name.trim() {
            "" => "Anonymous".to_string(),
            name => name.to_string(),
        };

        let profile = UserProfile {
            google_id,
            display_name,
            first_name: normalize_optional_text(profile.first_name),
            last_name: normalize_optional_text(profile.last_name),
            email: normalize_optional_text(profile.email),
            image: normalize_optional_text(profile.image),
        };

        let user = self.db.upsert_user(&profile).await?;
        tracing::debug!(user_id = %user.id, google_id = %user.google_id, "User upserted");
        Ok(user)
    }

    /// Get user by ID
    pub async fn get(&self, id: &str) -> Result<User, AppError> {
        self.db.get_user(id).await?.ok_or(AppError::NotFound)
    }
}
