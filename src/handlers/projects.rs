// handlers/projects.rs - /api/project/* handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::Project;
use crate::database::ListOptions;
use crate::handlers::PageQuery;
use crate::middleware::{ApiResponse, ApiResult, StaffUser};
use crate::state::AppState;

const DEFAULT_ORDER: &str = "created_at asc";
const FEATURED_ORDER: &str = "views desc, created_at desc";

/// Client-writable project fields. `slug`, `views` and timestamps are server-owned.
#[derive(Debug, Deserialize)]
pub struct ProjectInput {
    pub title: String,
    pub synopsis: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub image: String,
}

impl ProjectInput {
    fn apply(self, project: &mut Project) {
        project.title = self.title;
        project.synopsis = self.synopsis;
        project.author = self.author;
        project.status = self.status;
        project.tags = self.tags;
        project.image = self.image;
    }
}

async fn list_ordered(
    state: &AppState,
    query: Result<Query<PageQuery>, QueryRejection>,
    order: &str,
) -> ApiResult<Vec<Project>> {
    let Query(page) = query?;
    let (limit, offset) = page.resolve(&state.config.api);
    let options = ListOptions::new::<Project>(limit, offset, order)?;

    let ctx = state.request_context();
    let projects = state.projects.list(&ctx, &options).await?;
    Ok(ApiResponse::success(projects))
}

/// GET /api/project
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Vec<Project>> {
    list_ordered(&state, query, DEFAULT_ORDER).await
}

/// GET /api/project/featured - most viewed first.
pub async fn featured(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Vec<Project>> {
    list_ordered(&state, query, FEATURED_ORDER).await
}

/// GET /api/project/latest - projects with the newest chapter first.
pub async fn latest(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Vec<Project>> {
    let Query(page) = query?;
    let (limit, offset) = page.resolve(&state.config.api);

    let ctx = state.request_context();
    let projects = state.projects.list_latest(&ctx, limit, offset).await?;
    Ok(ApiResponse::success(projects))
}

/// GET /api/project/:slug
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Project> {
    let ctx = state.request_context();
    let project = state.projects.find_by_slug(&ctx, &slug).await?;
    Ok(ApiResponse::success(project))
}

/// POST /api/project (staff)
pub async fn create(
    State(state): State<AppState>,
    Extension(StaffUser(staff)): Extension<StaffUser>,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> ApiResult<Project> {
    let Json(input) = payload?;
    let mut project = Project::default();
    input.apply(&mut project);

    let ctx = state.request_context();
    let project = state.projects.add(&ctx, project).await?;
    tracing::info!("Project '{}' created by {}", project.slug, staff.username);

    Ok(ApiResponse::created(project))
}

/// PUT /api/project/:slug (staff)
pub async fn update(
    State(state): State<AppState>,
    Extension(StaffUser(staff)): Extension<StaffUser>,
    Path(slug): Path<String>,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> ApiResult<Project> {
    let Json(input) = payload?;

    let ctx = state.request_context();
    let mut project = state.projects.find_by_slug(&ctx, &slug).await?;
    input.apply(&mut project);
    let project = state.projects.update(&ctx, project).await?;
    tracing::info!("Project '{}' updated by {}", project.slug, staff.username);

    Ok(ApiResponse::success(project))
}

/// DELETE /api/project/:slug (staff)
pub async fn delete(
    State(state): State<AppState>,
    Extension(StaffUser(staff)): Extension<StaffUser>,
    Path(slug): Path<String>,
) -> ApiResult<()> {
    let ctx = state.request_context();
    let project = state.projects.find_by_slug(&ctx, &slug).await?;
    state.projects.delete(&ctx, project.id).await?;
    tracing::info!("Project '{}' deleted by {}", slug, staff.username);

    Ok(ApiResponse::no_content())
}
