//! Server-rendered HTML pages
//!
//! Every page goes through [`layout`]. User-supplied text is escaped
//! with `html_escape`; story bodies are rich text and are passed
//! through `ammonia` instead.

use std::collections::HashSet;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use super::flash::Flash;
use crate::auth::Session;
use crate::data::{CommentListing, StoryDetail, StoryListing, StoryStatus};
use crate::service::{FieldError, StoryForm};

const EXCERPT_LENGTH: usize = 150;

/// What every page needs besides its own content
#[derive(Debug, Default, Clone, Copy)]
pub struct PageContext<'a> {
    pub user: Option<&'a Session>,
    pub flashes: &'a [Flash],
}

impl<'a> PageContext<'a> {
    pub fn new(user: Option<&'a Session>, flashes: &'a [Flash]) -> Self {
        Self { user, flashes }
    }

    fn user_id(&self) -> Option<&'a str> {
        self.user.map(|session| session.user_id.as_str())
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Plain text of an HTML fragment
pub fn strip_tags(html: &str) -> String {
    let cleaned = ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(html)
        .to_string();
    html_escape::decode_html_entities(&cleaned).into_owned()
}

/// Shorten text to at most `len` characters, cutting at a word boundary
/// when one exists, and mark the cut with an ellipsis.
pub fn truncate(input: &str, len: usize) -> String {
    if input.chars().count() <= len {
        return input.to_string();
    }

    let head: String = input.chars().take(len).collect();
    let cut = match head.rfind(' ') {
        Some(index) if index > 0 => head[..index].to_string(),
        _ => head,
    };

    format!("{cut}...")
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Edit link, shown only to the story owner
pub fn edit_icon(story_owner: &str, viewer: Option<&str>, story_id: &str) -> String {
    if viewer != Some(story_owner) {
        return String::new();
    }

    format!(
        r#"<a href="/stories/edit/{}" class="edit-icon" title="Edit">&#9998;</a>"#,
        attr(story_id)
    )
}

/// `<select name="status">` with `selected` as the chosen option
pub fn status_select(selected: &str) -> String {
    let selected = StoryStatus::parse(selected).unwrap_or_default();

    let options: String = [StoryStatus::Public, StoryStatus::Private]
        .into_iter()
        .map(|status| {
            let marker = if status == selected { " selected" } else { "" };
            let label = match status {
                StoryStatus::Public => "Public",
                StoryStatus::Private => "Private",
            };
            format!(
                r#"<option value="{}"{marker}>{label}</option>"#,
                status.as_str()
            )
        })
        .collect();

    format!(r#"<select id="status" name="status">{options}</select>"#)
}

fn avatar(image: Option<&str>, alt: &str) -> String {
    match image {
        Some(url) => format!(
            r#"<img class="avatar" src="{}" alt="{}">"#,
            attr(url),
            attr(alt)
        ),
        None => String::new(),
    }
}

// =============================================================================
// Layout
// =============================================================================

fn layout(title: &str, ctx: &PageContext<'_>, content: &str) -> String {
    let nav = match ctx.user {
        Some(session) => format!(
            r#"<a href="/dashboard">Dashboard</a>
      <a href="/stories">Public Stories</a>
      <a href="/stories/add">Add Story</a>
      <span class="nav-user">{} {}</span>
      <a href="/auth/logout">Logout</a>"#,
            avatar(session.image.as_deref(), &session.display_name),
            text(&session.display_name)
        ),
        None => r#"<a href="/stories">Public Stories</a>
      <a href="/about">About</a>
      <a href="/">Login</a>"#
            .to_string(),
    };

    let flashes: String = ctx
        .flashes
        .iter()
        .map(|flash| {
            format!(
                r#"<div class="flash {}">{}</div>"#,
                flash.kind.css_class(),
                text(&flash.message)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <link rel="stylesheet" href="/public/css/style.css">
  <title>{title} | StoryBooks</title>
</head>
<body>
  <nav>
    <a class="brand" href="/">StoryBooks</a>
    <div class="nav-links">
      {nav}
    </div>
  </nav>
  <main class="container">
    {flashes}
    {content}
  </main>
</body>
</html>"#,
        title = text(title),
    )
}

// =============================================================================
// Index pages
// =============================================================================

pub fn welcome(ctx: &PageContext<'_>) -> String {
    layout(
        "Welcome",
        ctx,
        r#"<section class="card welcome">
  <h1>StoryBooks</h1>
  <p>Create public and private stories from your life.</p>
  <a class="btn" href="/auth/google">Log In With Google</a>
</section>"#,
    )
}

pub fn about(ctx: &PageContext<'_>) -> String {
    layout(
        "About",
        ctx,
        r#"<h1>About</h1>
<p>StoryBooks is a place to write short stories and share them publicly or keep them to yourself.</p>"#,
    )
}

pub fn dashboard(ctx: &PageContext<'_>, stories: &[StoryListing]) -> String {
    let name = ctx
        .user
        .map(|session| session.display_name.as_str())
        .unwrap_or_default();

    let body = if stories.is_empty() {
        r#"<p>You have not created any stories. <a href="/stories/add">Write one</a>.</p>"#
            .to_string()
    } else {
        let rows: String = stories
            .iter()
            .map(|listing| {
                let story = &listing.story;
                format!(
                    r#"<tr>
  <td><a href="/stories/show/{id}">{title}</a></td>
  <td>{date}</td>
  <td><span class="status">{status}</span></td>
  <td>
    <a class="btn" href="/stories/edit/{id}">Edit</a>
    <form class="inline" action="/stories/{id}?_method=DELETE" method="POST">
      <button type="submit" class="btn btn-danger">Delete</button>
    </form>
  </td>
</tr>"#,
                    id = attr(&story.id),
                    title = text(&story.title),
                    date = format_date(&story.created_at),
                    status = text(&story.status),
                )
            })
            .collect();

        format!(
            r#"<table class="stories">
  <thead><tr><th>Title</th><th>Date</th><th>Status</th><th></th></tr></thead>
  <tbody>
{rows}
  </tbody>
</table>"#
        )
    };

    layout(
        "Dashboard",
        ctx,
        &format!(
            "<h1>Dashboard</h1>\n<h3>Welcome {}</h3>\n<p>Here are your stories</p>\n{body}",
            text(name)
        ),
    )
}

// =============================================================================
// Stories
// =============================================================================

/// Story cards; used for the public list, a user's list, and "my stories"
pub fn stories_index(ctx: &PageContext<'_>, heading: &str, stories: &[StoryListing]) -> String {
    let viewer = ctx.user_id();

    let cards = if stories.is_empty() {
        "<p>No stories to display</p>".to_string()
    } else {
        stories
            .iter()
            .map(|listing| {
                let story = &listing.story;
                format!(
                    r#"<article class="card story">
  {edit}
  <h4>{title}</h4>
  <p>{excerpt}</p>
  <a class="btn" href="/stories/show/{id}">Read More</a>
  <div class="byline">
    {avatar}<a href="/stories/user/{owner}">{owner_name}</a>
  </div>
</article>"#,
                    edit = edit_icon(&story.user_id, viewer, &story.id),
                    title = text(&story.title),
                    excerpt = text(&truncate(&strip_tags(&story.body), EXCERPT_LENGTH)),
                    id = attr(&story.id),
                    avatar = avatar(listing.owner_image.as_deref(), &listing.owner_display_name),
                    owner = attr(&story.user_id),
                    owner_name = text(&listing.owner_display_name),
                )
            })
            .collect()
    };

    layout(
        heading,
        ctx,
        &format!(
            "<h1>{}</h1>\n<div class=\"stories\">\n{cards}\n</div>",
            text(heading)
        ),
    )
}

pub fn story_show(ctx: &PageContext<'_>, detail: &StoryDetail) -> String {
    let story = &detail.listing.story;
    let viewer = ctx.user_id();

    let comment_form = if !story.allow_comments {
        String::new()
    } else if ctx.user.is_some() {
        format!(
            r#"<form class="card" action="/stories/comment/{}" method="POST">
  <label for="commentBody">Add Comment</label>
  <textarea id="commentBody" name="commentBody"></textarea>
  <button type="submit" class="btn">Submit</button>
</form>"#,
            attr(&story.id)
        )
    } else {
        r#"<p>Please <a href="/">log in</a> to leave a comment</p>"#.to_string()
    };

    let comments: String = detail
        .comments
        .iter()
        .map(|listing| comment_card(listing, viewer, &story.user_id))
        .collect();

    let content = format!(
        r#"<article class="card story-detail">
  <h1>{title} <small>{edit}</small></h1>
  <span class="date">{date}</span>
  <div class="story-body">{body}</div>
  <div class="byline">
    {avatar}<a href="/stories/user/{owner}">More from {owner_name}</a>
  </div>
</article>
<section class="comments">
{comment_form}
{comments}
</section>"#,
        title = text(&story.title),
        edit = edit_icon(&story.user_id, viewer, &story.id),
        date = format_date(&story.created_at),
        body = ammonia::clean(&story.body),
        avatar = avatar(
            detail.listing.owner_image.as_deref(),
            &detail.listing.owner_display_name
        ),
        owner = attr(&story.user_id),
        owner_name = text(&detail.listing.owner_display_name),
    );

    layout(&story.title, ctx, &content)
}

fn comment_card(listing: &CommentListing, viewer: Option<&str>, story_owner: &str) -> String {
    let comment = &listing.comment;
    let can_delete =
        viewer.is_some_and(|viewer| viewer == comment.user_id || viewer == story_owner);

    let delete = if can_delete {
        format!(
            r#"<form class="inline" action="/stories/comment/{}?_method=DELETE" method="POST">
    <button type="submit" class="btn btn-danger">Delete</button>
  </form>"#,
            attr(&comment.id)
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class="card comment" id="comment-{id}">
  <p>{body}</p>
  <div class="byline">{avatar}<a href="/stories/user/{author}">{author_name}</a> <span class="date">{date}</span></div>
  {delete}
</div>
"#,
        id = attr(&comment.id),
        body = text(&comment.body),
        avatar = avatar(listing.author_image.as_deref(), &listing.author_display_name),
        author = attr(&comment.user_id),
        author_name = text(&listing.author_display_name),
        date = format_date(&comment.created_at),
    )
}

/// Which story form is being rendered
#[derive(Debug, Clone, Copy)]
pub enum StoryFormMode<'a> {
    Add,
    Edit { story_id: &'a str },
}

/// Add or edit form, with field errors and the submitted values kept
pub fn story_form(
    ctx: &PageContext<'_>,
    mode: StoryFormMode<'_>,
    form: &StoryForm,
    errors: &[FieldError],
) -> String {
    let (heading, action) = match mode {
        StoryFormMode::Add => ("Add Story", "/stories".to_string()),
        StoryFormMode::Edit { story_id } => (
            "Edit Story",
            format!("/stories/{}?_method=PUT", attr(story_id)),
        ),
    };

    let errors = if errors.is_empty() {
        String::new()
    } else {
        let items: String = errors
            .iter()
            .map(|error| format!("<li>{}</li>", text(&error.message)))
            .collect();
        format!(r#"<ul class="errors">{items}</ul>"#)
    };

    let checked = if form.allows_comments() { " checked" } else { "" };

    let content = format!(
        r#"<h1>{heading}</h1>
{errors}
<form class="card" action="{action}" method="POST">
  <label for="title">Title</label>
  <input type="text" id="title" name="title" value="{title}">

  <label for="status">Status</label>
  {status}

  <label>
    <input type="checkbox" id="allowComments" name="allowComments"{checked}>
    Allow Comments
  </label>

  <label for="body">Tell Us Your Story:</label>
  <textarea id="body" name="body">{body}</textarea>

  <button type="submit" class="btn">Save</button>
</form>"#,
        title = attr(&form.title),
        status = status_select(form.status.as_deref().unwrap_or_default()),
        body = text(&form.body),
    );

    layout(heading, ctx, &content)
}

// =============================================================================
// Errors
// =============================================================================

/// Standalone error page; rendered without session or flash context
pub fn error_page(status: StatusCode, message: &str) -> String {
    let heading = status.canonical_reason().unwrap_or("Error");

    layout(
        heading,
        &PageContext::default(),
        &format!(
            r#"<section class="card error">
  <h1>{} {}</h1>
  <p>{}</p>
  <a class="btn" href="/">Go Home</a>
</section>"#,
            status.as_u16(),
            text(heading),
            text(message)
        ),
    )
}
