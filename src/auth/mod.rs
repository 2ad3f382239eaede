//! Authentication
//!
//! Handles:
//! - Google OAuth flow
//! - Signed cookie sessions
//! - Authorization guards

mod middleware;
mod oauth;
pub mod session;

pub use middleware::{
    AUTHENTICATED_LANDING, CurrentUser, Guest, MaybeUser, ensure_authenticated, ensure_guest,
};
pub use oauth::auth_router;
pub use session::{Session, create_session_token, verify_session_token};
