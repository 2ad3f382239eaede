//! SQLite database operations
//!
//! All database access goes through this module.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::models::*;
use crate::error::AppError;

const STORY_LISTING_SELECT: &str = r#"
    SELECT s.id, s.title, s.body, s.status, s.allow_comments, s.user_id, s.created_at,
           u.display_name AS owner_display_name, u.image AS owner_image
    FROM stories s
    JOIN users u ON u.id = s.user_id
"#;

const COMMENT_LISTING_SELECT: &str = r#"
    SELECT c.id, c.story_id, c.body, c.user_id, c.created_at,
           u.display_name AS author_display_name, u.image AS author_image
    FROM comments c
    JOIN users u ON u.id = c.user_id
"#;

/// Extract the file path from a `sqlite:` connection string.
///
/// Returns `None` for in-memory databases.
pub(crate) fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the database and run migrations
    ///
    /// Creates the database file (and its parent directory) if it
    /// doesn't exist. Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `url` - Connection string, e.g. `sqlite://data/storybooks.db`
    /// * `max_connections` - Pool size
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, AppError> {
        if let Some(parent) = sqlite_file_path(url).as_deref().and_then(Path::parent) {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
            }
        }

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a user on first sign-in, or refresh the profile fields of
    /// the existing one with the same Google ID.
    ///
    /// The internal id and creation time of an existing user are kept.
    pub async fn upsert_user(&self, profile: &UserProfile) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, google_id, display_name, first_name, last_name, email, image, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(google_id) DO UPDATE SET
                display_name = excluded.display_name,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                email = excluded.email,
                image = excluded.image
            RETURNING *
            "#,
        )
        .bind(EntityId::new().0)
        .bind(&profile.google_id)
        .bind(&profile.display_name)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.image)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get user by internal ID
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by Google subject identifier
    pub async fn get_user_by_google_id(&self, google_id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE google_id = ?")
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    // =========================================================================
    // Stories
    // =========================================================================

    /// Insert a new story
    pub async fn insert_story(&self, story: &Story) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO stories (id, title, body, status, allow_comments, user_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&story.id)
        .bind(&story.title)
        .bind(&story.body)
        .bind(&story.status)
        .bind(story.allow_comments)
        .bind(&story.user_id)
        .bind(story.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get story by ID
    pub async fn get_story(&self, id: &str) -> Result<Option<Story>, AppError> {
        let story = sqlx::query_as::<_, Story>("SELECT * FROM stories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(story)
    }

    /// Get story by ID joined with its owner
    pub async fn get_story_listing(&self, id: &str) -> Result<Option<StoryListing>, AppError> {
        let query = format!("{STORY_LISTING_SELECT} WHERE s.id = ?");
        let listing = sqlx::query_as::<_, StoryListing>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(listing)
    }

    /// All public stories in storage order
    pub async fn list_public_stories(&self) -> Result<Vec<StoryListing>, AppError> {
        let query = format!("{STORY_LISTING_SELECT} WHERE s.status = 'public' ORDER BY s.rowid");
        let stories = sqlx::query_as::<_, StoryListing>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(stories)
    }

    /// Public stories of one owner in storage order
    pub async fn list_public_stories_by_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<StoryListing>, AppError> {
        let query = format!(
            "{STORY_LISTING_SELECT} WHERE s.user_id = ? AND s.status = 'public' ORDER BY s.rowid"
        );
        let stories = sqlx::query_as::<_, StoryListing>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(stories)
    }

    /// Every story of one owner, regardless of status
    pub async fn list_stories_by_user(&self, user_id: &str) -> Result<Vec<StoryListing>, AppError> {
        let query = format!("{STORY_LISTING_SELECT} WHERE s.user_id = ? ORDER BY s.rowid");
        let stories = sqlx::query_as::<_, StoryListing>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(stories)
    }

    /// Overwrite the editable fields of a story
    pub async fn update_story(&self, story: &Story) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE stories
            SET title = ?, body = ?, status = ?, allow_comments = ?
            WHERE id = ?
            "#,
        )
        .bind(&story.title)
        .bind(&story.body)
        .bind(&story.status)
        .bind(story.allow_comments)
        .bind(&story.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a story and its comments atomically
    ///
    /// # Returns
    /// `true` if a story was deleted
    pub async fn delete_story(&self, id: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM comments WHERE story_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Insert a comment; it becomes the first one listed for its story
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, story_id, body, user_id, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.story_id)
        .bind(&comment.body)
        .bind(&comment.user_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Comments of a story, most recent first
    pub async fn list_comments(&self, story_id: &str) -> Result<Vec<CommentListing>, AppError> {
        let query = format!("{COMMENT_LISTING_SELECT} WHERE c.story_id = ? ORDER BY c.rowid DESC");
        let comments = sqlx::query_as::<_, CommentListing>(&query)
            .bind(story_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    /// Number of comments on a story
    pub async fn count_comments(&self, story_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE story_id = ?")
            .bind(story_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Delete exactly one comment by its ID
    ///
    /// # Returns
    /// `true` if a comment was deleted
    pub async fn delete_comment(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
