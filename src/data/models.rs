//! Data models
//!
//! Rust structs representing database rows and joined listings.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// A person who signed in with Google
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    /// Google account subject identifier
    pub google_id: String,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Profile picture URL
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile fields refreshed from the identity provider on every sign-in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub google_id: String,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

// =============================================================================
// Story
// =============================================================================

/// A user-authored story
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Story {
    pub id: String,
    pub title: String,
    /// Rich text body, sanitized on display
    pub body: String,
    /// Visibility: public, private
    pub status: String,
    pub allow_comments: bool,
    /// Owner
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Story {
    pub fn is_public(&self) -> bool {
        self.status == StoryStatus::Public.as_str()
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Story visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoryStatus {
    #[default]
    Public,
    Private,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// Story joined with its owner's display data
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoryListing {
    #[sqlx(flatten)]
    pub story: Story,
    pub owner_display_name: String,
    pub owner_image: Option<String>,
}

// =============================================================================
// Comment
// =============================================================================

/// A reply attached to a story
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub story_id: String,
    pub body: String,
    /// Commenter
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's display data
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CommentListing {
    #[sqlx(flatten)]
    pub comment: Comment,
    pub author_display_name: String,
    pub author_image: Option<String>,
}

/// Everything the story detail page shows
#[derive(Debug, Clone, Serialize)]
pub struct StoryDetail {
    pub listing: StoryListing,
    /// Most recent first
    pub comments: Vec<CommentListing>,
}
