//! Story routes, nested under `/stories`
//!
//! Authorization failures on a specific story are not error pages:
//! the caller is sent back to `/stories` with a notice.

use axum::{
    Form, Router,
    extract::{Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
};
use axum_extra::extract::CookieJar;
use url::Url;

use super::flash::{Flash, FlashStore};
use super::render_page;
use super::views::{self, StoryFormMode};
use crate::AppState;
use crate::auth::{CurrentUser, MaybeUser};
use crate::error::AppError;
use crate::service::{
    CommentForm, CommentOutcome, ShowOutcome, StoryDraft, StoryForm, StoryService, UserService,
};

const STORIES_PATH: &str = "/stories";

/// Create stories router
///
/// Routes:
/// - GET /stories - Public stories
/// - POST /stories - Create story
/// - GET /stories/show/:id - One story with comments
/// - GET /stories/user/:user_id - A user's public stories
/// - GET /stories/my - Caller's stories
/// - GET /stories/add - Add form
/// - GET /stories/edit/:id - Edit form
/// - PUT /stories/:id - Update story
/// - DELETE /stories/:id - Delete story
/// - POST /stories/comment/:id - Add comment to story `id`
/// - DELETE /stories/comment/:id - Delete comment `id`
pub fn stories_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_public).post(create_story))
        .route("/show/:id", get(show_story))
        .route("/user/:user_id", get(list_by_user))
        .route("/my", get(list_mine))
        .route("/add", get(add_form))
        .route("/edit/:id", get(edit_form))
        .route("/:id", put(update_story).delete(delete_story))
        .route("/comment/:id", post(add_comment).delete(delete_comment))
}

fn story_path(id: &str) -> String {
    format!("{STORIES_PATH}/show/{id}")
}

/// Queue a notice and redirect
fn redirect_with(
    state: &AppState,
    jar: CookieJar,
    flash: Flash,
    to: &str,
) -> Result<Response, AppError> {
    let jar = FlashStore::from_config(&state.config).push(jar, flash)?;
    Ok((jar, Redirect::to(to)).into_response())
}

fn not_authorized(state: &AppState, jar: CookieJar) -> Result<Response, AppError> {
    redirect_with(state, jar, Flash::error("Not Authorized!"), STORIES_PATH)
}

/// Path of a same-site referring page, if the browser sent one
fn referer_path(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;

    let path = match Url::parse(referer) {
        Ok(url) => match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        },
        Err(_) => referer.to_string(),
    };

    // Browsers read both "//host" and "/\host" as another origin
    let foreign = path.starts_with("//") || path.starts_with("/\\");
    (path.starts_with('/') && !foreign).then_some(path)
}

// =============================================================================
// Listing
// =============================================================================

async fn list_public(
    user: MaybeUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let stories = StoryService::new(state.db.clone()).list_public().await?;

    Ok(render_page(&state, jar, user.0.as_ref(), |ctx| {
        views::stories_index(ctx, "Stories", &stories)
    })
    .into_response())
}

async fn list_by_user(
    user: MaybeUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let owner = UserService::new(state.db.clone()).get(&user_id).await?;
    let stories = StoryService::new(state.db.clone())
        .list_public_by_user(&owner.id)
        .await?;

    let heading = format!("Stories by {}", owner.display_name);
    Ok(render_page(&state, jar, user.0.as_ref(), |ctx| {
        views::stories_index(ctx, &heading, &stories)
    })
    .into_response())
}

async fn list_mine(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let stories = StoryService::new(state.db.clone())
        .list_owned(Some(&session.user_id))
        .await?;

    Ok(render_page(&state, jar, Some(&session), |ctx| {
        views::stories_index(ctx, "My Stories", &stories)
    })
    .into_response())
}

// =============================================================================
// Single story
// =============================================================================

async fn show_story(
    user: MaybeUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let outcome = StoryService::new(state.db.clone())
        .get_for_display(&id, user.user_id())
        .await?;

    match outcome {
        ShowOutcome::Visible(detail) => Ok(render_page(&state, jar, user.0.as_ref(), |ctx| {
            views::story_show(ctx, &detail)
        })
        .into_response()),
        ShowOutcome::Hidden => Ok(Redirect::to(STORIES_PATH).into_response()),
    }
}

async fn add_form(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Response {
    render_page(&state, jar, Some(&session), |ctx| {
        views::story_form(ctx, StoryFormMode::Add, &StoryForm::default(), &[])
    })
    .into_response()
}

async fn edit_form(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let story = match StoryService::new(state.db.clone())
        .get_for_edit(&id, &session.user_id)
        .await
    {
        Ok(story) => story,
        Err(AppError::Forbidden) => return not_authorized(&state, jar),
        Err(error) => return Err(error),
    };

    let form = StoryForm::from_story(&story);
    Ok(render_page(&state, jar, Some(&session), |ctx| {
        views::story_form(ctx, StoryFormMode::Edit { story_id: &story.id }, &form, &[])
    })
    .into_response())
}

// =============================================================================
// Mutations
// =============================================================================

async fn create_story(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<StoryForm>,
) -> Result<Response, AppError> {
    let draft = match StoryDraft::from_form(&form) {
        Ok(draft) => draft,
        Err(errors) => {
            tracing::debug!(user_id = %session.user_id, ?errors, "Story form rejected");
            return Ok(render_page(&state, jar, Some(&session), |ctx| {
                views::story_form(ctx, StoryFormMode::Add, &form, &errors)
            })
            .into_response());
        }
    };

    let story = StoryService::new(state.db.clone())
        .create(&session.user_id, draft)
        .await?;

    redirect_with(
        &state,
        jar,
        Flash::success("Story added!"),
        &story_path(&story.id),
    )
}

async fn update_story(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
    Form(form): Form<StoryForm>,
) -> Result<Response, AppError> {
    let service = StoryService::new(state.db.clone());

    let story = match service.get_for_edit(&id, &session.user_id).await {
        Ok(story) => story,
        Err(AppError::Forbidden) => return not_authorized(&state, jar),
        Err(error) => return Err(error),
    };

    let draft = match StoryDraft::from_form(&form) {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(render_page(&state, jar, Some(&session), |ctx| {
                views::story_form(ctx, StoryFormMode::Edit { story_id: &id }, &form, &errors)
            })
            .into_response());
        }
    };

    service.update_owned(story, draft).await?;
    redirect_with(&state, jar, Flash::success("Story updated!"), "/dashboard")
}

async fn delete_story(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    match StoryService::new(state.db.clone())
        .delete(&id, &session.user_id)
        .await
    {
        Ok(()) => redirect_with(&state, jar, Flash::success("Story removed!"), "/dashboard"),
        Err(AppError::Forbidden) => not_authorized(&state, jar),
        Err(error) => Err(error),
    }
}

// =============================================================================
// Comments
// =============================================================================

async fn add_comment(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    jar: CookieJar,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let outcome = StoryService::new(state.db.clone())
        .add_comment(&story_id, &session.user_id, &form.comment_body)
        .await;

    let back = story_path(&story_id);
    match outcome {
        Ok(CommentOutcome::Added(_)) => {
            redirect_with(&state, jar, Flash::success("Comment added!"), &back)
        }
        Ok(CommentOutcome::Empty) => {
            redirect_with(&state, jar, Flash::error("Comment is empty!"), &back)
        }
        Ok(CommentOutcome::Disabled) => redirect_with(
            &state,
            jar,
            Flash::error("Comments are disabled for this story!"),
            &back,
        ),
        Err(AppError::Forbidden) => not_authorized(&state, jar),
        Err(error) => Err(error),
    }
}

async fn delete_comment(
    CurrentUser(session): CurrentUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let comment = match StoryService::new(state.db.clone())
        .delete_comment(&comment_id, &session.user_id)
        .await
    {
        Ok(comment) => comment,
        Err(AppError::Forbidden) => return not_authorized(&state, jar),
        Err(error) => return Err(error),
    };

    let back = referer_path(&headers).unwrap_or_else(|| story_path(&comment.story_id));
    redirect_with(&state, jar, Flash::success("Comment removed!"), &back)
}
