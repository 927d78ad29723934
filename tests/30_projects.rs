mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use batnovels::context::Context;
use batnovels::database::ProjectRepository;
use common::{TestApp, SYNOPSIS};

fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .iter()
        .filter_map(|p| p["title"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn staff_creates_project_with_server_slug() -> Result<()> {
    let app = TestApp::new();
    let token = app.staff_token().await?;

    let res = app.create_project(&token, "My Novel").await?;
    assert_eq!(res.status, StatusCode::CREATED, "body: {}", res.body);
    assert_eq!(res.body["data"]["slug"], "my-novel");

    let again = app.create_project(&token, "My Novel").await?;
    assert_eq!(again.status, StatusCode::CONFLICT, "body: {}", again.body);

    let show = app.get("/api/project/my-novel").await?;
    assert_eq!(show.status, StatusCode::OK);
    assert_eq!(show.body["data"]["title"], "My Novel");
    Ok(())
}

#[tokio::test]
async fn writes_require_staff() -> Result<()> {
    let app = TestApp::new();

    let anonymous = app
        .request(Method::POST, "/api/project", None, Some(json!({ "title": "My Novel", "synopsis": SYNOPSIS })))
        .await?;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let reader = app.reader_token().await?;
    let denied = app.create_project(&reader, "My Novel").await?;
    assert_eq!(denied.status, StatusCode::FORBIDDEN, "body: {}", denied.body);
    assert_eq!(denied.body["code"], "FORBIDDEN");

    let list = app.get("/api/project").await?;
    assert!(titles(&list.body).is_empty(), "nothing may be persisted: {}", list.body);
    Ok(())
}

#[tokio::test]
async fn invalid_project_is_bad_request() -> Result<()> {
    let app = TestApp::new();
    let token = app.staff_token().await?;

    let res = app
        .request(
            Method::POST,
            "/api/project",
            Some(&token),
            Some(json!({ "title": "My Novel", "synopsis": "too short" })),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Invalid project");
    Ok(())
}

#[tokio::test]
async fn listings_are_ordered_and_paged() -> Result<()> {
    let app = TestApp::new();
    let token = app.staff_token().await?;
    for title in ["First Tale", "Second Tale", "Third Tale"] {
        app.create_project(&token, title).await?;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    // Bump views directly; the HTTP surface never writes them.
    let ctx = Context::background();
    let mut second = app.state.projects.find_by_slug(&ctx, "second-tale").await?;
    second.views = 42;
    app.state.projects.update(&ctx, second).await?;

    let all = app.get("/api/project").await?;
    assert_eq!(titles(&all.body), ["First Tale", "Second Tale", "Third Tale"]);

    let featured = app.get("/api/project/featured").await?;
    assert_eq!(titles(&featured.body), ["Second Tale", "Third Tale", "First Tale"]);

    let page = app.get("/api/project?limit=1&offset=1").await?;
    assert_eq!(titles(&page.body), ["Second Tale"]);

    let bad = app.get("/api/project?limit=abc").await?;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn latest_lists_projects_by_newest_chapter() -> Result<()> {
    let app = TestApp::new();
    let token = app.staff_token().await?;
    app.create_project(&token, "Quiet Tale").await?;
    app.create_project(&token, "Busy Tale").await?;
    app.create_project(&token, "Empty Tale").await?;

    app.create_chapter(&token, "quiet-tale", "Quiet Beginning").await?;
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    app.create_chapter(&token, "busy-tale", "Busy Beginning").await?;

    let latest = app.get("/api/project/latest").await?;
    assert_eq!(latest.status, StatusCode::OK);
    assert_eq!(titles(&latest.body), ["Busy Tale", "Quiet Tale"]);
    Ok(())
}

#[tokio::test]
async fn update_keeps_slug_and_delete_hides() -> Result<()> {
    let app = TestApp::new();
    let token = app.staff_token().await?;
    app.create_project(&token, "My Novel").await?;

    let updated = app
        .request(
            Method::PUT,
            "/api/project/my-novel",
            Some(&token),
            Some(json!({ "title": "My Renamed Novel", "synopsis": SYNOPSIS, "tags": "sea, letters" })),
        )
        .await?;
    assert_eq!(updated.status, StatusCode::OK, "body: {}", updated.body);
    assert_eq!(updated.body["data"]["slug"], "my-novel");
    assert_eq!(updated.body["data"]["title"], "My Renamed Novel");

    let deleted = app.request(Method::DELETE, "/api/project/my-novel", Some(&token), None).await?;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = app.get("/api/project/my-novel").await?;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["code"], "NOT_FOUND");
    Ok(())
}
