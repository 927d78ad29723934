mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use batnovels::context::Context;
use batnovels::database::memory::MemoryUserRepository;
use batnovels::database::models::User;
use batnovels::database::{ListOptions, RepositoryResult, UserRepository};
use common::{TestApp, PASSWORD};

/// Revokes staff right after each username lookup, as an operator running
/// `user demote` during a login would.
struct DemoteAfterLookup {
    inner: MemoryUserRepository,
}

#[async_trait]
impl UserRepository for DemoteAfterLookup {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<User> {
        self.inner.find(ctx, id).await
    }

    async fn find_by_username(&self, ctx: &Context, username: &str) -> RepositoryResult<User> {
        let user = self.inner.find_by_username(ctx, username).await?;
        let mut demoted = user.clone();
        demoted.is_staff = false;
        self.inner.update(ctx, demoted).await?;
        Ok(user)
    }

    async fn find_by_email(&self, ctx: &Context, email: &str) -> RepositoryResult<User> {
        self.inner.find_by_email(ctx, email).await
    }

    async fn add(&self, ctx: &Context, user: User) -> RepositoryResult<User> {
        self.inner.add(ctx, user).await
    }

    async fn update(&self, ctx: &Context, user: User) -> RepositoryResult<User> {
        self.inner.update(ctx, user).await
    }

    async fn touch_login(&self, ctx: &Context, id: Uuid) -> RepositoryResult<User> {
        self.inner.touch_login(ctx, id).await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()> {
        self.inner.delete(ctx, id).await
    }

    async fn list(&self, ctx: &Context, options: &ListOptions) -> RepositoryResult<Vec<User>> {
        self.inner.list(ctx, options).await
    }
}

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let app = TestApp::new();
    let res = app.get("/health").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_then_login() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .request(
            Method::POST,
            "/api/user/register",
            None,
            Some(json!({
                "username": "bobby",
                "email": "Bob <bob@example.com>",
                "name": "Bob B",
                "password": PASSWORD,
                "is_staff": true
            })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "body: {}", res.body);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["data"]["username"], "bobby");
    assert_eq!(res.body["data"]["is_staff"], false, "role flags must not come from the body");
    assert!(res.body["data"].get("password").is_none(), "password leaked: {}", res.body);

    let token = app.login("bobby").await?;
    let me = app.request(Method::GET, "/api/user/me", Some(&token), None).await?;
    assert_eq!(me.status, StatusCode::OK, "body: {}", me.body);
    assert_eq!(me.body["data"]["username"], "bobby");
    assert!(!me.body["data"]["last_login"].is_null(), "login must stamp last_login");
    Ok(())
}

#[tokio::test]
async fn register_rejects_invalid_and_duplicate_users() -> Result<()> {
    let app = TestApp::new();
    let body = |username: &str| {
        json!({ "username": username, "email": "dup@example.com", "name": "Dup User", "password": PASSWORD })
    };

    let short = app.request(Method::POST, "/api/user/register", None, Some(body("bob"))).await?;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(short.body["success"], false);
    assert_eq!(short.body["error"], "Invalid user");

    let first = app.request(Method::POST, "/api/user/register", None, Some(body("dupuser"))).await?;
    assert_eq!(first.status, StatusCode::CREATED);
    let again = app.request(Method::POST, "/api/user/register", None, Some(body("dupuser"))).await?;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<()> {
    let app = TestApp::new();
    let res = app
        .request(Method::POST, "/api/user/login", None, Some(json!({ "username": "x" })))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn login_failures_look_the_same() -> Result<()> {
    let app = TestApp::new();
    app.seed_user("bobby", false).await?;

    let wrong = app
        .request(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({ "username": "bobby", "password": "wrong" })),
        )
        .await?;
    let unknown = app
        .request(
            Method::POST,
            "/api/user/login",
            None,
            Some(json!({ "username": "alice", "password": PASSWORD })),
        )
        .await?;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body, unknown.body);
    Ok(())
}

#[tokio::test]
async fn me_requires_a_valid_token() -> Result<()> {
    let app = TestApp::new();

    let missing = app.request(Method::GET, "/api/user/me", None, None).await?;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = app.request(Method::GET, "/api/user/me", Some("not.a.token"), None).await?;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.body["error"], "Invalid token");
    Ok(())
}

#[tokio::test]
async fn token_for_deleted_user_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let user = app.seed_user("ghostly", false).await?;
    let token = app.login("ghostly").await?;

    let ctx = Context::background();
    app.state.users.delete(&ctx, user.id).await?;

    let res = app.request(Method::GET, "/api/user/me", Some(&token), None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_does_not_restore_revoked_staff() -> Result<()> {
    let mut app = TestApp::new();
    app.seed_user("editor", true).await?;
    app.state.users = Arc::new(DemoteAfterLookup { inner: app.store.users() });
    app.router = batnovels::app(app.state.clone());

    app.login("editor").await?;

    let ctx = Context::background();
    let stored = app.store.users().find_by_username(&ctx, "editor").await?;
    assert!(!stored.is_staff, "login wrote back a stale staff flag");
    assert!(stored.last_login.is_some());
    Ok(())
}
