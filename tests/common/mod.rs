//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{ServiceExt, extract::Request};
use reqwest::cookie::Jar;
use storybooks::data::{Story, User, UserProfile};
use storybooks::{AppState, config};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const SESSION_SECRET: &str = "test-secret-key-that-is-32-bytes!";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
}

/// A browser-like client: keeps cookies, never follows redirects
pub struct Browser {
    pub client: reqwest::Client,
    pub jar: Arc<Jar>,
}

pub fn test_config(db_url: String) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "127.0.0.1".to_string(),
            protocol: "http".to_string(),
            static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public"),
        },
        database: config::DatabaseConfig {
            url: db_url,
            max_connections: 1,
        },
        auth: config::AuthConfig {
            session_secret: SESSION_SECRET.to_string(),
            session_max_age: 604800,
            google: config::GoogleOAuthConfig {
                client_id: "test-client-id".to_string(),
                client_secret: "test-client-secret".to_string(),
                callback_url: None,
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                userinfo_url: "https://www.googleapis.com/oauth2/v3/userinfo".to_string(),
            },
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());

        let mut config = test_config(db_url);
        adjust(&mut config);

        let state = AppState::new(config).await.unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = storybooks::with_method_override(storybooks::build_router(state.clone()));

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
                .await
                .unwrap();
        });

        Self {
            addr: format!("http://{}", addr),
            state,
            _temp_dir: temp_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// A client with no session
    pub fn browser(&self) -> Browser {
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        Browser { client, jar }
    }

    /// Create a user in the database
    pub async fn create_user(&self, google_id: &str, display_name: &str) -> User {
        self.state
            .db
            .upsert_user(&UserProfile {
                google_id: google_id.to_string(),
                display_name: display_name.to_string(),
                first_name: None,
                last_name: None,
                email: Some(format!("{google_id}@example.com")),
                image: None,
            })
            .await
            .unwrap()
    }

    /// A client signed in as a fresh user
    pub async fn signed_in(&self, google_id: &str, display_name: &str) -> (Browser, User) {
        use storybooks::auth::{Session, create_session_token};

        let user = self.create_user(google_id, display_name).await;
        let session = Session::for_user(&user, self.state.config.auth.session_max_age);
        let token = create_session_token(&session, SESSION_SECRET).unwrap();

        let browser = self.browser();
        browser.jar.add_cookie_str(
            &format!("session={token}; Path=/"),
            &self.addr.parse().unwrap(),
        );

        (browser, user)
    }

    /// Stories owned by a user, straight from the database
    pub async fn stories_of(&self, user: &User) -> Vec<Story> {
        self.state
            .db
            .list_stories_by_user(&user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|listing| listing.story)
            .collect()
    }
}

/// `Location` header of a redirect response
pub fn location(response: &reqwest::Response) -> String {
    assert!(
        response.status().is_redirection(),
        "expected redirect, got {}",
        response.status()
    );
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .expect("location header")
        .to_string()
}
