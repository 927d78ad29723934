#![allow(dead_code)]

use anyhow::{Context as _, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use batnovels::config::{AppConfig, Environment};
use batnovels::context::Context;
use batnovels::database::models::User;
use batnovels::database::{MemoryStore, UserRepository};
use batnovels::{app, AppState};

pub const PASSWORD: &str = "secret123";

pub const SYNOPSIS: &str =
    "Letters wash up at a lighthouse every night, and the keeper starts answering them one by one.";

pub const CONTENT: &str =
    "The tide came in slower than usual that evening, carrying with it a bottle sealed in green wax.";

/// Router over a fresh in-memory store, driven in-process.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::profile(
            Environment::Development,
            "postgres://localhost:5432/batnovels_test",
            "test-secret",
        );
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        let state = AppState::with_memory(config, &store).expect("test secret is set");
        Self {
            router: app(state.clone()),
            store,
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body for {}", uri))?
        };
        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.request(Method::GET, uri, None, None).await
    }

    /// Add a user straight through the repository, optionally with the staff flag.
    pub async fn seed_user(&self, username: &str, staff: bool) -> Result<User> {
        let ctx = Context::background();
        let users = self.store.users();
        let mut user = users
            .add(&ctx, User::new(username, format!("{}@example.com", username), "Test User", PASSWORD))
            .await?;
        if staff {
            user.is_staff = true;
            user = users.update(&ctx, user).await?;
        }
        Ok(user)
    }

    pub async fn login(&self, username: &str) -> Result<String> {
        let res = self
            .request(
                Method::POST,
                "/api/user/login",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await?;
        anyhow::ensure!(res.status == StatusCode::OK, "login failed: {}", res.body);
        res.body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    /// Seeded staff user's token.
    pub async fn staff_token(&self) -> Result<String> {
        self.seed_user("editor", true).await?;
        self.login("editor").await
    }

    /// Seeded non-staff user's token.
    pub async fn reader_token(&self) -> Result<String> {
        self.seed_user("reader", false).await?;
        self.login("reader").await
    }

    pub async fn create_project(&self, token: &str, title: &str) -> Result<TestResponse> {
        self.request(
            Method::POST,
            "/api/project",
            Some(token),
            Some(json!({ "title": title, "synopsis": SYNOPSIS, "author": "Anon", "status": "ongoing" })),
        )
        .await
    }

    pub async fn create_chapter(&self, token: &str, project_slug: &str, title: &str) -> Result<TestResponse> {
        self.request(
            Method::POST,
            &format!("/api/project/{}/chapters", project_slug),
            Some(token),
            Some(json!({ "title": title, "content": CONTENT })),
        )
        .await
    }
}
