//! In-memory repositories backed by one shared store.
//!
//! They mirror the Postgres implementations closely enough for handler and
//! auth tests: unique keys produce `Conflict`, deletes are tombstones, and
//! every storage round-trip is counted so tests can assert that a call never
//! reached storage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::hash_password;
use crate::context::Context;
use crate::database::error::{EntityKind, RepositoryError};
use crate::database::models::{Chapter, Project, User};
use crate::database::order::{OrderBy, Sortable};
use crate::database::repository::{
    ChapterRepository, ListOptions, ProjectRepository, RepositoryResult, UserRepository,
};
use crate::database::slug::slugify;
use crate::database::validate::mailbox;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    chapters: HashMap<Uuid, Chapter>,
}

#[derive(Default)]
struct Inner {
    tables: Mutex<Tables>,
    calls: AtomicUsize,
}

/// Shared in-memory storage handed out as per-entity repositories.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> MemoryUserRepository {
        MemoryUserRepository { store: self.clone() }
    }

    pub fn projects(&self) -> MemoryProjectRepository {
        MemoryProjectRepository { store: self.clone() }
    }

    pub fn chapters(&self) -> MemoryChapterRepository {
        MemoryChapterRepository { store: self.clone() }
    }

    /// Number of storage round-trips performed so far.
    pub fn calls(&self) -> usize {
        self.inner.calls.load(AtomicOrdering::SeqCst)
    }

    /// One storage round-trip. Only called from inside `Context::run`.
    fn round_trip(&self) -> MutexGuard<'_, Tables> {
        self.inner.calls.fetch_add(1, AtomicOrdering::SeqCst);
        // A poisoned lock only means another test thread panicked mid-write.
        self.inner
            .tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn sorted_page<T: Sortable + Clone>(mut rows: Vec<T>, order: &OrderBy, limit: i64, offset: i64) -> Vec<T> {
    rows.sort_by(|a, b| order.compare(a, b));
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

fn conflict(constraint: &str) -> RepositoryError {
    RepositoryError::Conflict(constraint.to_string())
}

// -- users -----------------------------------------------------------------

#[derive(Clone)]
pub struct MemoryUserRepository {
    store: MemoryStore,
}

impl MemoryUserRepository {
    fn find_live<F>(&self, pred: F) -> RepositoryResult<User>
    where
        F: Fn(&User) -> bool,
    {
        let tables = self.store.round_trip();
        tables
            .users
            .values()
            .find(|u| !u.is_deleted() && pred(*u))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

fn check_user_unique(tables: &Tables, user: &User) -> RepositoryResult<()> {
    for other in tables.users.values().filter(|u| u.id != user.id) {
        if other.username == user.username {
            return Err(conflict("users_username_key"));
        }
        if other.email == user.email {
            return Err(conflict("users_email_key"));
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<User> {
        ctx.run(async { self.find_live(|u| u.id == id) }).await
    }

    async fn find_by_username(&self, ctx: &Context, username: &str) -> RepositoryResult<User> {
        ctx.run(async { self.find_live(|u| u.username == username) }).await
    }

    async fn find_by_email(&self, ctx: &Context, email: &str) -> RepositoryResult<User> {
        let email = mailbox(email).unwrap_or(email);
        ctx.run(async { self.find_live(|u| u.email == email) }).await
    }

    async fn add(&self, ctx: &Context, mut user: User) -> RepositoryResult<User> {
        ctx.run(async move {
            if !user.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::User));
            }
            user.normalize_email();
            let now = Utc::now();
            user.id = Uuid::new_v4();
            user.password = hash_password(&user.password)
                .map_err(|e| RepositoryError::PasswordHash(e.to_string()))?;
            user.created_at = now;
            user.updated_at = now;
            user.deleted_at = None;

            let mut tables = self.store.round_trip();
            check_user_unique(&tables, &user)?;
            tables.users.insert(user.id, user.clone());
            Ok(user)
        })
        .await
    }

    async fn update(&self, ctx: &Context, mut user: User) -> RepositoryResult<User> {
        ctx.run(async move {
            if !user.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::User));
            }
            user.normalize_email();
            let mut tables = self.store.round_trip();
            let created_at = match tables.users.get(&user.id) {
                Some(existing) if !existing.is_deleted() => existing.created_at,
                _ => return Err(RepositoryError::NotFound),
            };
            check_user_unique(&tables, &user)?;
            user.created_at = created_at;
            user.updated_at = Utc::now();
            user.deleted_at = None;
            tables.users.insert(user.id, user.clone());
            Ok(user)
        })
        .await
    }

    async fn touch_login(&self, ctx: &Context, id: Uuid) -> RepositoryResult<User> {
        ctx.run(async {
            let mut tables = self.store.round_trip();
            match tables.users.get_mut(&id) {
                Some(user) if !user.is_deleted() => {
                    user.last_login = Some(Utc::now());
                    Ok(user.clone())
                }
                _ => Err(RepositoryError::NotFound),
            }
        })
        .await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()> {
        ctx.run(async {
            let mut tables = self.store.round_trip();
            if let Some(user) = tables.users.get_mut(&id) {
                user.deleted_at.get_or_insert_with(Utc::now);
            }
            Ok(())
        })
        .await
    }

    async fn list(&self, ctx: &Context, options: &ListOptions) -> RepositoryResult<Vec<User>> {
        ctx.run(async {
            let tables = self.store.round_trip();
            let rows = tables.users.values().filter(|u| !u.is_deleted()).cloned().collect();
            Ok(sorted_page(rows, &options.order, options.limit, options.offset))
        })
        .await
    }
}

// -- projects --------------------------------------------------------------

#[derive(Clone)]
pub struct MemoryProjectRepository {
    store: MemoryStore,
}

fn live_project<'a>(tables: &'a Tables, id: Uuid) -> Option<&'a Project> {
    tables.projects.get(&id).filter(|p| p.deleted_at.is_none())
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepository {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<Project> {
        ctx.run(async {
            let tables = self.store.round_trip();
            live_project(&tables, id).cloned().ok_or(RepositoryError::NotFound)
        })
        .await
    }

    async fn find_by_slug(&self, ctx: &Context, slug: &str) -> RepositoryResult<Project> {
        ctx.run(async {
            let tables = self.store.round_trip();
            tables
                .projects
                .values()
                .find(|p| p.deleted_at.is_none() && p.slug == slug)
                .cloned()
                .ok_or(RepositoryError::NotFound)
        })
        .await
    }

    async fn add(&self, ctx: &Context, mut project: Project) -> RepositoryResult<Project> {
        ctx.run(async move {
            if !project.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::Project));
            }
            let now = Utc::now();
            project.id = Uuid::new_v4();
            project.slug = slugify(&project.title);
            project.created_at = now;
            project.updated_at = now;
            project.deleted_at = None;

            let mut tables = self.store.round_trip();
            if tables.projects.values().any(|p| p.slug == project.slug) {
                return Err(conflict("projects_slug_key"));
            }
            tables.projects.insert(project.id, project.clone());
            Ok(project)
        })
        .await
    }

    async fn update(&self, ctx: &Context, mut project: Project) -> RepositoryResult<Project> {
        ctx.run(async move {
            if !project.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::Project));
            }
            let mut tables = self.store.round_trip();
            let existing = live_project(&tables, project.id).ok_or(RepositoryError::NotFound)?;
            project.slug = existing.slug.clone();
            project.created_at = existing.created_at;
            project.updated_at = Utc::now();
            project.deleted_at = None;
            tables.projects.insert(project.id, project.clone());
            Ok(project)
        })
        .await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()> {
        ctx.run(async {
            let mut tables = self.store.round_trip();
            if let Some(project) = tables.projects.get_mut(&id) {
                project.deleted_at.get_or_insert_with(Utc::now);
            }
            Ok(())
        })
        .await
    }

    async fn list(&self, ctx: &Context, options: &ListOptions) -> RepositoryResult<Vec<Project>> {
        ctx.run(async {
            let tables = self.store.round_trip();
            let rows = tables.projects.values().filter(|p| p.deleted_at.is_none()).cloned().collect();
            Ok(sorted_page(rows, &options.order, options.limit, options.offset))
        })
        .await
    }

    async fn list_latest(&self, ctx: &Context, limit: i64, offset: i64) -> RepositoryResult<Vec<Project>> {
        ctx.run(async {
            let tables = self.store.round_trip();
            let mut latest: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
            for chapter in tables.chapters.values().filter(|c| c.deleted_at.is_none()) {
                let entry = latest.entry(chapter.project_id).or_insert(chapter.created_at);
                if chapter.created_at > *entry {
                    *entry = chapter.created_at;
                }
            }

            let mut rows: Vec<(DateTime<Utc>, Project)> = latest
                .into_iter()
                .filter_map(|(id, at)| live_project(&tables, id).map(|p| (at, p.clone())))
                .collect();
            rows.sort_by(|a, b| b.0.cmp(&a.0));

            Ok(rows
                .into_iter()
                .map(|(_, p)| p)
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .collect())
        })
        .await
    }
}

// -- chapters --------------------------------------------------------------

#[derive(Clone)]
pub struct MemoryChapterRepository {
    store: MemoryStore,
}

fn live_chapters(tables: &Tables, project_id: Uuid) -> Vec<Chapter> {
    tables
        .chapters
        .values()
        .filter(|c| c.deleted_at.is_none() && c.project_id == project_id)
        .cloned()
        .collect()
}

#[async_trait]
impl ChapterRepository for MemoryChapterRepository {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<Chapter> {
        ctx.run(async {
            let tables = self.store.round_trip();
            tables
                .chapters
                .get(&id)
                .filter(|c| c.deleted_at.is_none())
                .cloned()
                .ok_or(RepositoryError::NotFound)
        })
        .await
    }

    async fn find_by_slug(&self, ctx: &Context, slug: &str) -> RepositoryResult<Chapter> {
        ctx.run(async {
            let tables = self.store.round_trip();
            tables
                .chapters
                .values()
                .find(|c| c.deleted_at.is_none() && c.slug == slug)
                .cloned()
                .ok_or(RepositoryError::NotFound)
        })
        .await
    }

    async fn add(&self, ctx: &Context, mut chapter: Chapter) -> RepositoryResult<Chapter> {
        ctx.run(async move {
            if !chapter.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::Chapter));
            }
            let now = Utc::now();
            chapter.id = Uuid::new_v4();
            chapter.slug = slugify(&chapter.title);
            chapter.created_at = now;
            chapter.updated_at = now;
            chapter.deleted_at = None;

            let mut tables = self.store.round_trip();
            if live_project(&tables, chapter.project_id).is_none() {
                return Err(RepositoryError::NotFound);
            }
            if tables.chapters.values().any(|c| c.slug == chapter.slug) {
                return Err(conflict("chapters_slug_key"));
            }
            tables.chapters.insert(chapter.id, chapter.clone());
            Ok(chapter)
        })
        .await
    }

    async fn update(&self, ctx: &Context, mut chapter: Chapter) -> RepositoryResult<Chapter> {
        ctx.run(async move {
            if !chapter.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::Chapter));
            }
            let mut tables = self.store.round_trip();
            let existing = tables
                .chapters
                .get(&chapter.id)
                .filter(|c| c.deleted_at.is_none())
                .ok_or(RepositoryError::NotFound)?;
            chapter.slug = existing.slug.clone();
            chapter.project_id = existing.project_id;
            chapter.created_at = existing.created_at;
            chapter.updated_at = Utc::now();
            chapter.deleted_at = None;
            tables.chapters.insert(chapter.id, chapter.clone());
            Ok(chapter)
        })
        .await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()> {
        ctx.run(async {
            let mut tables = self.store.round_trip();
            if let Some(chapter) = tables.chapters.get_mut(&id) {
                chapter.deleted_at.get_or_insert_with(Utc::now);
            }
            Ok(())
        })
        .await
    }

    async fn list(
        &self,
        ctx: &Context,
        project_id: Uuid,
        options: &ListOptions,
    ) -> RepositoryResult<Vec<Chapter>> {
        ctx.run(async {
            let tables = self.store.round_trip();
            let rows = live_chapters(&tables, project_id);
            Ok(sorted_page(rows, &options.order, options.limit, options.offset))
        })
        .await
    }

    async fn list_by_project_slug(
        &self,
        ctx: &Context,
        project_slug: &str,
        options: &ListOptions,
    ) -> RepositoryResult<Vec<Chapter>> {
        ctx.run(async {
            let tables = self.store.round_trip();
            let project_id = tables
                .projects
                .values()
                .find(|p| p.deleted_at.is_none() && p.slug == project_slug)
                .map(|p| p.id);
            let rows = match project_id {
                Some(id) => live_chapters(&tables, id),
                None => Vec::new(),
            };
            Ok(sorted_page(rows, &options.order, options.limit, options.offset))
        })
        .await
    }
}
