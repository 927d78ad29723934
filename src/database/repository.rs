use async_trait::async_trait;
use uuid::Uuid;

use crate::context::Context;
use crate::database::error::RepositoryError;
use crate::database::models::{Chapter, Project, User};
use crate::database::order::{OrderBy, Sortable};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Paging and ordering for list operations.
///
/// The limit is taken as given; HTTP handlers clamp it to the configured maximum.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub limit: i64,
    pub offset: i64,
    pub order: OrderBy,
}

impl ListOptions {
    /// Build options for rows of type `T`, checking `order` against its columns.
    pub fn new<T: Sortable>(limit: i64, offset: i64, order: &str) -> RepositoryResult<Self> {
        Ok(Self {
            limit: limit.max(0),
            offset: offset.max(0),
            order: OrderBy::parse(order, T::COLUMNS)?,
        })
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<User>;

    async fn find_by_username(&self, ctx: &Context, username: &str) -> RepositoryResult<User>;

    async fn find_by_email(&self, ctx: &Context, email: &str) -> RepositoryResult<User>;

    /// Validate, hash the plaintext password and insert.
    async fn add(&self, ctx: &Context, user: User) -> RepositoryResult<User>;

    /// Persist mutable fields. The stored password hash is written back as-is.
    async fn update(&self, ctx: &Context, user: User) -> RepositoryResult<User>;

    /// Stamp `last_login` without touching any other column.
    async fn touch_login(&self, ctx: &Context, id: Uuid) -> RepositoryResult<User>;

    /// Soft delete; a no-op for rows that are already gone.
    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()>;

    async fn list(&self, ctx: &Context, options: &ListOptions) -> RepositoryResult<Vec<User>>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<Project>;

    async fn find_by_slug(&self, ctx: &Context, slug: &str) -> RepositoryResult<Project>;

    /// Validate, assign id and slug, insert.
    async fn add(&self, ctx: &Context, project: Project) -> RepositoryResult<Project>;

    /// Validate and persist mutable fields. The slug is kept.
    async fn update(&self, ctx: &Context, project: Project) -> RepositoryResult<Project>;

    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()>;

    async fn list(&self, ctx: &Context, options: &ListOptions) -> RepositoryResult<Vec<Project>>;

    /// Projects ordered by their newest live chapter; projects without chapters are skipped.
    async fn list_latest(&self, ctx: &Context, limit: i64, offset: i64) -> RepositoryResult<Vec<Project>>;
}

#[async_trait]
pub trait ChapterRepository: Send + Sync {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<Chapter>;

    async fn find_by_slug(&self, ctx: &Context, slug: &str) -> RepositoryResult<Chapter>;

    /// Validate, assign id and slug, insert. The owning project must exist.
    async fn add(&self, ctx: &Context, chapter: Chapter) -> RepositoryResult<Chapter>;

    async fn update(&self, ctx: &Context, chapter: Chapter) -> RepositoryResult<Chapter>;

    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()>;

    async fn list(
        &self,
        ctx: &Context,
        project_id: Uuid,
        options: &ListOptions,
    ) -> RepositoryResult<Vec<Chapter>>;

    async fn list_by_project_slug(
        &self,
        ctx: &Context,
        project_slug: &str,
        options: &ListOptions,
    ) -> RepositoryResult<Vec<Chapter>>;
}
