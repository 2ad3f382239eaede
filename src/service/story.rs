//! Story service
//!
//! Handles story and comment operations including visibility
//! filtering and ownership checks. The caller is always passed in
//! explicitly; nothing here reads request state.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use crate::data::{
    Comment, Database, EntityId, Story, StoryDetail, StoryListing, StoryStatus,
};
use crate::error::AppError;
use crate::metrics::{COMMENT_OPERATIONS_TOTAL, STORY_OPERATIONS_TOTAL};

// =============================================================================
// Form input
// =============================================================================

/// Raw add/edit story form, exactly as submitted
///
/// Missing fields deserialize as empty so a half-filled form can be
/// redisplayed with whatever the user entered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "allowComments")]
    pub allow_comments: Option<String>,
}

impl StoryForm {
    /// Prefill the edit form from a stored story
    pub fn from_story(story: &Story) -> Self {
        Self {
            title: story.title.clone(),
            body: story.body.clone(),
            status: Some(story.status.clone()),
            allow_comments: story.allow_comments.then(|| "on".to_string()),
        }
    }

    pub fn allows_comments(&self) -> bool {
        self.allow_comments
            .as_deref()
            .is_some_and(|value| !value.is_empty())
    }
}

/// Comment form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default, rename = "commentBody")]
    pub comment_body: String,
}

/// A validation failure attached to one form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Validated story fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDraft {
    pub title: String,
    pub body: String,
    pub status: StoryStatus,
    pub allow_comments: bool,
}

impl StoryDraft {
    /// Validate a submitted form
    ///
    /// Title and body must be non-empty after trimming. A missing status
    /// means public; an unknown one is rejected.
    pub fn from_form(form: &StoryForm) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let title = form.title.trim();
        if title.is_empty() {
            errors.push(FieldError::new("title", "Please add a title"));
        }

        let body = form.body.trim();
        if body.is_empty() {
            errors.push(FieldError::new("body", "Please add some content"));
        }

        let status = match form.status.as_deref().map(str::trim) {
            None | Some("") => StoryStatus::default(),
            Some(value) => StoryStatus::parse(value).unwrap_or_else(|| {
                errors.push(FieldError::new(
                    "status",
                    "Status must be either public or private",
                ));
                StoryStatus::default()
            }),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            title: title.to_string(),
            body: body.to_string(),
            status,
            allow_comments: form.allows_comments(),
        })
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of asking to display one story
#[derive(Debug)]
pub enum ShowOutcome {
    Visible(Box<StoryDetail>),
    /// Private story requested by someone other than its owner
    Hidden,
}

/// Result of posting a comment
#[derive(Debug)]
pub enum CommentOutcome {
    Added(Comment),
    /// Body was blank; nothing stored
    Empty,
    /// Story does not accept comments; nothing stored
    Disabled,
}

// =============================================================================
// Service
// =============================================================================

/// Story service
pub struct StoryService {
    db: Arc<Database>,
}

impl StoryService {
    /// Create new story service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// All public stories in storage order
    pub async fn list_public(&self) -> Result<Vec<StoryListing>, AppError> {
        self.db.list_public_stories().await
    }

    /// One user's public stories
    pub async fn list_public_by_user(&self, user_id: &str) -> Result<Vec<StoryListing>, AppError> {
        self.db.list_public_stories_by_user(user_id).await
    }

    /// Every story the caller owns, public or private
    pub async fn list_owned(&self, caller: Option<&str>) -> Result<Vec<StoryListing>, AppError> {
        let caller = caller.ok_or(AppError::Unauthorized)?;
        self.db.list_stories_by_user(caller).await
    }

    // =========================================================================
    // Single story
    // =========================================================================

    /// Fetch a story with its comments, applying the visibility rule
    ///
    /// Public stories are visible to anyone, private ones only to their
    /// owner.
    pub async fn get_for_display(
        &self,
        id: &str,
        caller: Option<&str>,
    ) -> Result<ShowOutcome, AppError> {
        let listing = self
            .db
            .get_story_listing(id)
            .await?
            .ok_or(AppError::NotFound)?;

        let visible = listing.story.is_public()
            || caller.is_some_and(|caller| listing.story.is_owned_by(caller));
        if !visible {
            tracing::debug!(story_id = %id, "Hiding private story from non-owner");
            return Ok(ShowOutcome::Hidden);
        }

        let comments = self.db.list_comments(id).await?;
        Ok(ShowOutcome::Visible(Box::new(StoryDetail { listing, comments })))
    }

    /// Fetch a story for its edit form
    ///
    /// # Errors
    /// `NotFound` for unknown IDs, `Forbidden` for non-owners
    pub async fn get_for_edit(&self, id: &str, caller: &str) -> Result<Story, AppError> {
        self.owned_story(id, caller).await
    }

    async fn owned_story(&self, id: &str, caller: &str) -> Result<Story, AppError> {
        let story = self.db.get_story(id).await?.ok_or(AppError::NotFound)?;

        if !story.is_owned_by(caller) {
            tracing::warn!(story_id = %id, user_id = %caller, "Ownership check failed");
            return Err(AppError::Forbidden);
        }

        Ok(story)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a new story owned by `owner`
    pub async fn create(&self, owner: &str, draft: StoryDraft) -> Result<Story, AppError> {
        let story = Story {
            id: EntityId::new().0,
            title: draft.title,
            body: draft.body,
            status: draft.status.as_str().to_string(),
            allow_comments: draft.allow_comments,
            user_id: owner.to_string(),
            created_at: Utc::now(),
        };

        self.db.insert_story(&story).await?;
        STORY_OPERATIONS_TOTAL.with_label_values(&["create"]).inc();
        tracing::info!(story_id = %story.id, user_id = %owner, "Story created");

        Ok(story)
    }

    /// Overwrite an owned story's editable fields
    pub async fn update(
        &self,
        id: &str,
        caller: &str,
        draft: StoryDraft,
    ) -> Result<Story, AppError> {
        let story = self.owned_story(id, caller).await?;
        self.update_owned(story, draft).await
    }

    /// Overwrite a story whose ownership the caller already checked
    /// through [`Self::get_for_edit`]
    pub async fn update_owned(
        &self,
        mut story: Story,
        draft: StoryDraft,
    ) -> Result<Story, AppError> {
        story.title = draft.title;
        story.body = draft.body;
        story.status = draft.status.as_str().to_string();
        story.allow_comments = draft.allow_comments;

        self.db.update_story(&story).await?;
        STORY_OPERATIONS_TOTAL.with_label_values(&["update"]).inc();
        tracing::info!(story_id = %story.id, "Story updated");

        Ok(story)
    }

    /// Delete an owned story together with its comments
    pub async fn delete(&self, id: &str, caller: &str) -> Result<(), AppError> {
        let story = self.owned_story(id, caller).await?;

        if !self.db.delete_story(&story.id).await? {
            return Err(AppError::NotFound);
        }

        STORY_OPERATIONS_TOTAL.with_label_values(&["delete"]).inc();
        tracing::info!(story_id = %story.id, "Story deleted");
        Ok(())
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Attach a comment from `caller` to a story
    ///
    /// # Errors
    /// `NotFound` for unknown stories, `Forbidden` when the story is
    /// private and the caller is not its owner
    pub async fn add_comment(
        &self,
        story_id: &str,
        caller: &str,
        body: &str,
    ) -> Result<CommentOutcome, AppError> {
        let story = self
            .db
            .get_story(story_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !story.is_public() && !story.is_owned_by(caller) {
            return Err(AppError::Forbidden);
        }

        let body = body.trim();
        if body.is_empty() {
            return Ok(CommentOutcome::Empty);
        }
        if !story.allow_comments {
            return Ok(CommentOutcome::Disabled);
        }

        let comment = Comment {
            id: EntityId::new().0,
            story_id: story.id,
            body: body.to_string(),
            user_id: caller.to_string(),
            created_at: Utc::now(),
        };

        self.db.insert_comment(&comment).await?;
        COMMENT_OPERATIONS_TOTAL.with_label_values(&["create"]).inc();
        tracing::info!(comment_id = %comment.id, story_id = %comment.story_id, "Comment added");

        Ok(CommentOutcome::Added(comment))
    }

    /// Remove exactly one comment
    ///
    /// Allowed for the commenter and for the owner of the story it
    /// belongs to. Returns the removed comment.
    pub async fn delete_comment(&self, comment_id: &str, caller: &str) -> Result<Comment, AppError> {
        let comment = self
            .db
            .get_comment(comment_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let owns_story = self
            .db
            .get_story(&comment.story_id)
            .await?
            .is_some_and(|story| story.is_owned_by(caller));

        if comment.user_id != caller && !owns_story {
            tracing::warn!(comment_id = %comment_id, user_id = %caller, "Comment delete denied");
            return Err(AppError::Forbidden);
        }

        if !self.db.delete_comment(&comment.id).await? {
            return Err(AppError::NotFound);
        }

        COMMENT_OPERATIONS_TOTAL.with_label_values(&["delete"]).inc();
        tracing::info!(comment_id = %comment.id, story_id = %comment.story_id, "Comment deleted");
        Ok(comment)
    }
}
