// handlers/chapters.rs - chapter handlers under /api/project/:slug/chapters and /api/chapter/:slug

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::{Chapter, Project};
use crate::database::ListOptions;
use crate::handlers::PageQuery;
use crate::middleware::{ApiResponse, ApiResult, StaffUser};
use crate::state::AppState;

/// Characters of content shown in chapter listings.
pub const PREVIEW_CHARS: usize = 61;

const CHAPTER_ORDER: &str = "created_at asc";

#[derive(Debug, Deserialize)]
pub struct ChapterInput {
    pub title: String,
    pub content: String,
}

/// Listing row: the chapter with its content cut to a preview.
#[derive(Debug, Serialize)]
pub struct ChapterSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub project_id: Uuid,
}

impl From<Chapter> for ChapterSummary {
    fn from(chapter: Chapter) -> Self {
        Self {
            content: chapter.preview(PREVIEW_CHARS),
            id: chapter.id,
            created_at: chapter.created_at,
            updated_at: chapter.updated_at,
            title: chapter.title,
            slug: chapter.slug,
            project_id: chapter.project_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChapterWithProject {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub project: Project,
}

/// GET /api/project/:slug/chapters
pub async fn list_for_project(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Vec<ChapterSummary>> {
    let Query(page) = query?;
    let (limit, offset) = page.resolve(&state.config.api);
    let options = ListOptions::new::<Chapter>(limit, offset, CHAPTER_ORDER)?;

    let ctx = state.request_context();
    let chapters = state.chapters.list_by_project_slug(&ctx, &slug, &options).await?;
    Ok(ApiResponse::success(chapters.into_iter().map(ChapterSummary::from).collect()))
}

/// POST /api/project/:slug/chapters (staff)
pub async fn create(
    State(state): State<AppState>,
    Extension(StaffUser(staff)): Extension<StaffUser>,
    Path(slug): Path<String>,
    payload: Result<Json<ChapterInput>, JsonRejection>,
) -> ApiResult<Chapter> {
    let Json(input) = payload?;

    let ctx = state.request_context();
    let project = state.projects.find_by_slug(&ctx, &slug).await?;
    let chapter = Chapter {
        title: input.title,
        content: input.content,
        project_id: project.id,
        ..Default::default()
    };
    let chapter = state.chapters.add(&ctx, chapter).await?;
    tracing::info!("Chapter '{}' added to '{}' by {}", chapter.slug, project.slug, staff.username);

    Ok(ApiResponse::created(chapter))
}

/// GET /api/chapter/:slug
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<ChapterWithProject> {
    let ctx = state.request_context();
    let chapter = state.chapters.find_by_slug(&ctx, &slug).await?;
    let project = state.projects.find(&ctx, chapter.project_id).await?;
    Ok(ApiResponse::success(ChapterWithProject { chapter, project }))
}

/// PUT /api/chapter/:slug (staff)
pub async fn update(
    State(state): State<AppState>,
    Extension(StaffUser(staff)): Extension<StaffUser>,
    Path(slug): Path<String>,
    payload: Result<Json<ChapterInput>, JsonRejection>,
) -> ApiResult<Chapter> {
    let Json(input) = payload?;

    let ctx = state.request_context();
    let mut chapter = state.chapters.find_by_slug(&ctx, &slug).await?;
    chapter.title = input.title;
    chapter.content = input.content;
    let chapter = state.chapters.update(&ctx, chapter).await?;
    tracing::info!("Chapter '{}' updated by {}", chapter.slug, staff.username);

    Ok(ApiResponse::success(chapter))
}

/// DELETE /api/chapter/:slug (staff)
pub async fn delete(
    State(state): State<AppState>,
    Extension(StaffUser(staff)): Extension<StaffUser>,
    Path(slug): Path<String>,
) -> ApiResult<()> {
    let ctx = state.request_context();
    let chapter = state.chapters.find_by_slug(&ctx, &slug).await?;
    state.chapters.delete(&ctx, chapter.id).await?;
    tracing::info!("Chapter '{}' deleted by {}", slug, staff.username);

    Ok(ApiResponse::no_content())
}
