//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database reads and writes and carry the
//! ownership and visibility rules.

mod story;
mod user;

pub use story::{
    CommentForm, CommentOutcome, FieldError, ShowOutcome, StoryDraft, StoryForm, StoryService,
};
pub use user::UserService;
