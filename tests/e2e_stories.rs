//! E2E tests for stories, comments and their authorization rules

mod common;

use common::{Browser, TestServer, location};

/// Create a story through the form and return its id
async fn create_story(
    server: &TestServer,
    browser: &Browser,
    title: &str,
    status: &str,
    allow_comments: bool,
) -> String {
    let mut form = vec![
        ("title", title),
        ("body", "<p>Some body text</p>"),
        ("status", status),
    ];
    if allow_comments {
        form.push(("allowComments", "on"));
    }

    let response = browser
        .client
        .post(server.url("/stories"))
        .form(&form)
        .send()
        .await
        .unwrap();

    location(&response)
        .strip_prefix("/stories/show/")
        .expect("redirect to the new story")
        .to_string()
}

async fn get_text(server: &TestServer, browser: &Browser, path: &str) -> String {
    let response = browser.client.get(server.url(path)).send().await.unwrap();
    assert_eq!(response.status(), 200, "GET {path}");
    response.text().await.unwrap()
}

async fn post_comment(server: &TestServer, browser: &Browser, story_id: &str, body: &str) {
    let response = browser
        .client
        .post(server.url(&format!("/stories/comment/{story_id}")))
        .form(&[("commentBody", body)])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), format!("/stories/show/{story_id}"));
}

#[tokio::test]
async fn test_private_story_is_hidden_from_guests_and_other_users() {
    let server = TestServer::new().await;
    let (owner, _) = server.signed_in("g-owner", "Owner").await;
    let (other, _) = server.signed_in("g-other", "Other").await;

    let id = create_story(&server, &owner, "Secret diary", "private", false).await;
    let path = format!("/stories/show/{id}");

    for browser in [&server.browser(), &other] {
        let response = browser.client.get(server.url(&path)).send().await.unwrap();
        assert_eq!(location(&response), "/stories");
        assert!(!response.text().await.unwrap().contains("Secret diary"));
    }

    assert!(get_text(&server, &owner, &path).await.contains("Secret diary"));

    let listing = get_text(&server, &server.browser(), "/stories").await;
    assert!(!listing.contains("Secret diary"));
}

#[tokio::test]
async fn test_empty_story_is_not_saved_and_values_are_kept() {
    let server = TestServer::new().await;
    let (browser, user) = server.signed_in("g-1", "Ada").await;

    let response = browser
        .client
        .post(server.url("/stories"))
        .form(&[
            ("title", "Kept title"),
            ("body", "   "),
            ("status", "private"),
            ("allowComments", "on"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Please add some content"));
    assert!(body.contains(r#"value="Kept title""#));
    assert!(body.contains(r#"<option value="private" selected>"#));
    assert!(body.contains(r#"name="allowComments" checked"#));

    assert!(server.stories_of(&user).await.is_empty());
}

#[tokio::test]
async fn test_valid_story_appears_in_my_stories_without_comments_enabled() {
    let server = TestServer::new().await;
    let (browser, user) = server.signed_in("g-1", "Ada").await;

    let id = create_story(&server, &browser, "Fresh story", "public", false).await;

    let stories = server.stories_of(&user).await;
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].id, id);
    assert!(!stories[0].allow_comments);

    let page = get_text(&server, &browser, &format!("/stories/show/{id}")).await;
    assert!(page.contains("Story added!"));
    assert!(!page.contains(r#"name="commentBody""#));

    let mine = get_text(&server, &browser, "/stories/my").await;
    assert!(mine.contains("Fresh story"));
}

#[tokio::test]
async fn test_guest_cannot_reach_authenticated_story_routes() {
    let server = TestServer::new().await;
    let guest = server.browser();

    for path in ["/stories/my", "/stories/add", "/dashboard"] {
        let response = guest.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(location(&response), "/", "GET {path}");
    }

    let response = guest
        .client
        .post(server.url("/stories"))
        .form(&[("title", "T"), ("body", "B")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_only_owner_may_edit_update_or_delete() {
    let server = TestServer::new().await;
    let (owner, owner_user) = server.signed_in("g-owner", "Owner").await;
    let (other, _) = server.signed_in("g-other", "Other").await;

    let id = create_story(&server, &owner, "Original", "public", true).await;

    let response = other
        .client
        .get(server.url(&format!("/stories/edit/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/stories");

    let response = other
        .client
        .post(server.url(&format!("/stories/{id}?_method=PUT")))
        .form(&[("title", "Hijacked"), ("body", "B"), ("status", "public")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/stories");

    let response = other
        .client
        .post(server.url(&format!("/stories/{id}?_method=DELETE")))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/stories");

    let listing = get_text(&server, &other, "/stories").await;
    assert!(listing.contains("Not Authorized!"));

    let stories = server.stories_of(&owner_user).await;
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].title, "Original");

    // The owner can
    let edit = get_text(&server, &owner, &format!("/stories/edit/{id}")).await;
    assert!(edit.contains(r#"value="Original""#));
    assert!(edit.contains(r#"name="allowComments" checked"#));

    let response = owner
        .client
        .post(server.url(&format!("/stories/{id}?_method=PUT")))
        .form(&[("title", "Renamed"), ("body", "New body"), ("status", "private")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard");

    let stories = server.stories_of(&owner_user).await;
    assert_eq!(stories[0].title, "Renamed");
    assert_eq!(stories[0].status, "private");
    assert!(!stories[0].allow_comments);

    let dashboard = get_text(&server, &owner, "/dashboard").await;
    assert!(dashboard.contains("Story updated!"));

    let response = owner
        .client
        .post(server.url(&format!("/stories/{id}?_method=DELETE")))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard");
    assert!(server.stories_of(&owner_user).await.is_empty());
}

#[tokio::test]
async fn test_invalid_update_rerenders_edit_form() {
    let server = TestServer::new().await;
    let (owner, owner_user) = server.signed_in("g-owner", "Owner").await;
    let id = create_story(&server, &owner, "Original", "public", true).await;

    let response = owner
        .client
        .post(server.url(&format!("/stories/{id}?_method=PUT")))
        .form(&[("title", ""), ("body", "Still here"), ("status", "public")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Please add a title"));
    assert!(body.contains("Still here"));
    assert!(body.contains(&format!(r#"action="/stories/{id}?_method=PUT""#)));

    assert_eq!(server.stories_of(&owner_user).await[0].title, "Original");
}

#[tokio::test]
async fn test_comments_are_listed_newest_first_and_empty_ones_rejected() {
    let server = TestServer::new().await;
    let (owner, _) = server.signed_in("g-owner", "Owner").await;
    let (reader, _) = server.signed_in("g-reader", "Reader").await;
    let id = create_story(&server, &owner, "Open story", "public", true).await;

    post_comment(&server, &reader, &id, "   ").await;
    assert_eq!(server.state.db.count_comments(&id).await.unwrap(), 0);
    let page = get_text(&server, &reader, &format!("/stories/show/{id}")).await;
    assert!(page.contains("Comment is empty!"));

    post_comment(&server, &reader, &id, "comment-alpha").await;
    post_comment(&server, &owner, &id, "comment-beta").await;
    assert_eq!(server.state.db.count_comments(&id).await.unwrap(), 2);

    let page = get_text(&server, &reader, &format!("/stories/show/{id}")).await;
    let alpha = page.find("comment-alpha").unwrap();
    let beta = page.find("comment-beta").unwrap();
    assert!(beta < alpha, "most recent comment should be listed first");
}

#[tokio::test]
async fn test_comments_are_refused_when_disabled() {
    let server = TestServer::new().await;
    let (owner, _) = server.signed_in("g-owner", "Owner").await;
    let id = create_story(&server, &owner, "Closed story", "public", false).await;

    post_comment(&server, &owner, &id, "hello").await;
    assert_eq!(server.state.db.count_comments(&id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_owner_cannot_comment_on_private_story() {
    let server = TestServer::new().await;
    let (owner, _) = server.signed_in("g-owner", "Owner").await;
    let (other, _) = server.signed_in("g-other", "Other").await;

    let id = create_story(&server, &owner, "Diary", "private", true).await;

    let response = other
        .client
        .post(server.url(&format!("/stories/comment/{id}")))
        .form(&[("commentBody", "peeking")])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/stories");

    let listing = get_text(&server, &other, "/stories").await;
    assert!(listing.contains("Not Authorized!"));
    assert_eq!(server.state.db.count_comments(&id).await.unwrap(), 0);

    // The owner still can
    post_comment(&server, &owner, &id, "note to self").await;
    assert_eq!(server.state.db.count_comments(&id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_deleting_a_comment_removes_only_that_comment() {
    let server = TestServer::new().await;
    let (owner, _) = server.signed_in("g-owner", "Owner").await;
    let (reader, _) = server.signed_in("g-reader", "Reader").await;
    let (stranger, _) = server.signed_in("g-stranger", "Stranger").await;

    let first = create_story(&server, &owner, "First", "public", true).await;
    let second = create_story(&server, &owner, "Second", "public", true).await;
    post_comment(&server, &reader, &first, "doomed").await;
    post_comment(&server, &reader, &first, "survivor").await;
    post_comment(&server, &reader, &second, "elsewhere").await;

    let doomed = server
        .state
        .db
        .list_comments(&first)
        .await
        .unwrap()
        .into_iter()
        .find(|listing| listing.comment.body == "doomed")
        .unwrap()
        .comment;

    // Strangers cannot delete it
    let response = stranger
        .client
        .post(server.url(&format!("/stories/comment/{}?_method=DELETE", doomed.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/stories");
    assert_eq!(server.state.db.count_comments(&first).await.unwrap(), 2);

    // The commenter can, and is sent back where they came from
    let referer = server.url(&format!("/stories/show/{first}"));
    let response = reader
        .client
        .post(server.url(&format!("/stories/comment/{}?_method=DELETE", doomed.id)))
        .header("referer", referer)
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), format!("/stories/show/{first}"));

    let page = reader
        .client
        .get(server.url(&format!("/stories/show/{first}")))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Comment removed!"));

    let remaining: Vec<String> = server
        .state
        .db
        .list_comments(&first)
        .await
        .unwrap()
        .into_iter()
        .map(|listing| listing.comment.body)
        .collect();
    assert_eq!(remaining, vec!["survivor"]);
    assert_eq!(server.state.db.count_comments(&second).await.unwrap(), 1);
}

#[tokio::test]
async fn test_story_owner_may_delete_any_comment_on_their_story() {
    let server = TestServer::new().await;
    let (owner, _) = server.signed_in("g-owner", "Owner").await;
    let (reader, _) = server.signed_in("g-reader", "Reader").await;

    let id = create_story(&server, &owner, "Mine", "public", true).await;
    post_comment(&server, &reader, &id, "rude remark").await;
    let comment = server.state.db.list_comments(&id).await.unwrap().remove(0).comment;

    let response = owner
        .client
        .post(server.url(&format!("/stories/comment/{}?_method=DELETE", comment.id)))
        .send()
        .await
        .unwrap();

    assert_eq!(location(&response), format!("/stories/show/{id}"));
    assert_eq!(server.state.db.count_comments(&id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_user_page_lists_only_public_stories() {
    let server = TestServer::new().await;
    let (owner, owner_user) = server.signed_in("g-owner", "Owner").await;

    create_story(&server, &owner, "Open story", "public", false).await;
    create_story(&server, &owner, "Hidden story", "private", false).await;

    let page = get_text(
        &server,
        &server.browser(),
        &format!("/stories/user/{}", owner_user.id),
    )
    .await;
    assert!(page.contains("Stories by Owner"));
    assert!(page.contains("Open story"));
    assert!(!page.contains("Hidden story"));
}

#[tokio::test]
async fn test_login_create_comment_scenario() {
    let server = TestServer::new().await;
    let (browser, _) = server.signed_in("g-1", "Ada").await;

    let response = browser
        .client
        .post(server.url("/stories"))
        .form(&[
            ("title", "T"),
            ("body", "B"),
            ("status", "public"),
            ("allowComments", "on"),
        ])
        .send()
        .await
        .unwrap();
    let id = location(&response)
        .strip_prefix("/stories/show/")
        .unwrap()
        .to_string();

    let listing = get_text(&server, &server.browser(), "/stories").await;
    assert!(listing.contains("<h4>T</h4>"));

    post_comment(&server, &browser, &id, "hi").await;

    let detail = server.state.db.list_comments(&id).await.unwrap();
    assert_eq!(detail[0].comment.body, "hi");

    let page = get_text(&server, &browser, &format!("/stories/show/{id}")).await;
    assert!(page.contains("<p>hi</p>"));
}
