//! Postgres repositories.
//!
//! Every statement runs inside `Context::run`, so an expired context never
//! acquires a connection and a deadline firing mid-query drops the future.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::context::Context;
use crate::database::error::{EntityKind, RepositoryError};
use crate::database::models::{Chapter, Project, User};
use crate::database::repository::{
    ChapterRepository, ListOptions, ProjectRepository, RepositoryResult, UserRepository,
};
use crate::database::slug::slugify;
use crate::database::validate::mailbox;

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_where(&self, column: &str, value: &str) -> RepositoryResult<User> {
        let sql = format!(
            "SELECT * FROM users WHERE \"{}\" = $1 AND deleted_at IS NULL",
            column
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<User> {
        ctx.run(async {
            let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            Ok(user)
        })
        .await
    }

    async fn find_by_username(&self, ctx: &Context, username: &str) -> RepositoryResult<User> {
        ctx.run(self.find_where("username", username)).await
    }

    async fn find_by_email(&self, ctx: &Context, email: &str) -> RepositoryResult<User> {
        let email = mailbox(email).unwrap_or(email);
        ctx.run(self.find_where("email", email)).await
    }

    async fn add(&self, ctx: &Context, mut user: User) -> RepositoryResult<User> {
        ctx.run(async move {
            if !user.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::User));
            }
            user.normalize_email();
            let hash = hash_password(&user.password)
                .map_err(|e| RepositoryError::PasswordHash(e.to_string()))?;

            let created = sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (id, is_admin, is_staff, username, email, name, password, profile_picture)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user.is_admin)
            .bind(user.is_staff)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&hash)
            .bind(&user.profile_picture)
            .fetch_one(&self.pool)
            .await?;

            tracing::debug!(user_id = %created.id, username = %created.username, "user created");
            Ok(created)
        })
        .await
    }

    async fn update(&self, ctx: &Context, mut user: User) -> RepositoryResult<User> {
        ctx.run(async move {
            if !user.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::User));
            }
            user.normalize_email();
            let updated = sqlx::query_as::<_, User>(
                r#"
                UPDATE users
                SET updated_at = now(), last_login = $2, is_admin = $3, is_staff = $4,
                    username = $5, email = $6, name = $7, password = $8, profile_picture = $9
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
                "#,
            )
            .bind(user.id)
            .bind(user.last_login)
            .bind(user.is_admin)
            .bind(user.is_staff)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password)
            .bind(&user.profile_picture)
            .fetch_one(&self.pool)
            .await?;
            Ok(updated)
        })
        .await
    }

    async fn touch_login(&self, ctx: &Context, id: Uuid) -> RepositoryResult<User> {
        ctx.run(async {
            let user = sqlx::query_as::<_, User>(
                "UPDATE users SET last_login = now() WHERE id = $1 AND deleted_at IS NULL RETURNING *",
            )
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            Ok(user)
        })
        .await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()> {
        ctx.run(async {
            sqlx::query("UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn list(&self, ctx: &Context, options: &ListOptions) -> RepositoryResult<Vec<User>> {
        ctx.run(async {
            let sql = format!(
                "SELECT * FROM users WHERE deleted_at IS NULL {} LIMIT $1 OFFSET $2",
                options.order.to_sql(None)
            );
            let users = sqlx::query_as::<_, User>(&sql)
                .bind(options.limit)
                .bind(options.offset)
                .fetch_all(&self.pool)
                .await?;
            Ok(users)
        })
        .await
    }
}

#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<Project> {
        ctx.run(async {
            let project =
                sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND deleted_at IS NULL")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(project)
        })
        .await
    }

    async fn find_by_slug(&self, ctx: &Context, slug: &str) -> RepositoryResult<Project> {
        ctx.run(async {
            let project =
                sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE slug = $1 AND deleted_at IS NULL")
                    .bind(slug)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(project)
        })
        .await
    }

    async fn add(&self, ctx: &Context, project: Project) -> RepositoryResult<Project> {
        ctx.run(async move {
            if !project.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::Project));
            }
            let created = sqlx::query_as::<_, Project>(
                r#"
                INSERT INTO projects (id, title, synopsis, author, status, tags, views, image, slug)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&project.title)
            .bind(&project.synopsis)
            .bind(&project.author)
            .bind(&project.status)
            .bind(&project.tags)
            .bind(project.views)
            .bind(&project.image)
            .bind(slugify(&project.title))
            .fetch_one(&self.pool)
            .await?;

            tracing::debug!(project_id = %created.id, slug = %created.slug, "project created");
            Ok(created)
        })
        .await
    }

    async fn update(&self, ctx: &Context, project: Project) -> RepositoryResult<Project> {
        ctx.run(async move {
            if !project.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::Project));
            }
            let updated = sqlx::query_as::<_, Project>(
                r#"
                UPDATE projects
                SET updated_at = now(), title = $2, synopsis = $3, author = $4,
                    status = $5, tags = $6, views = $7, image = $8
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
                "#,
            )
            .bind(project.id)
            .bind(&project.title)
            .bind(&project.synopsis)
            .bind(&project.author)
            .bind(&project.status)
            .bind(&project.tags)
            .bind(project.views)
            .bind(&project.image)
            .fetch_one(&self.pool)
            .await?;
            Ok(updated)
        })
        .await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()> {
        ctx.run(async {
            sqlx::query("UPDATE projects SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn list(&self, ctx: &Context, options: &ListOptions) -> RepositoryResult<Vec<Project>> {
        ctx.run(async {
            let sql = format!(
                "SELECT * FROM projects WHERE deleted_at IS NULL {} LIMIT $1 OFFSET $2",
                options.order.to_sql(None)
            );
            let projects = sqlx::query_as::<_, Project>(&sql)
                .bind(options.limit)
                .bind(options.offset)
                .fetch_all(&self.pool)
                .await?;
            Ok(projects)
        })
        .await
    }

    async fn list_latest(&self, ctx: &Context, limit: i64, offset: i64) -> RepositoryResult<Vec<Project>> {
        ctx.run(async {
            let projects = sqlx::query_as::<_, Project>(
                r#"
                SELECT p.*
                FROM projects p
                JOIN chapters c ON c.project_id = p.id AND c.deleted_at IS NULL
                WHERE p.deleted_at IS NULL
                GROUP BY p.id
                ORDER BY MAX(c.created_at) DESC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(limit.max(0))
            .bind(offset.max(0))
            .fetch_all(&self.pool)
            .await?;
            Ok(projects)
        })
        .await
    }
}

#[derive(Clone)]
pub struct PgChapterRepository {
    pool: PgPool,
}

impl PgChapterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChapterRepository for PgChapterRepository {
    async fn find(&self, ctx: &Context, id: Uuid) -> RepositoryResult<Chapter> {
        ctx.run(async {
            let chapter =
                sqlx::query_as::<_, Chapter>("SELECT * FROM chapters WHERE id = $1 AND deleted_at IS NULL")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(chapter)
        })
        .await
    }

    async fn find_by_slug(&self, ctx: &Context, slug: &str) -> RepositoryResult<Chapter> {
        ctx.run(async {
            let chapter =
                sqlx::query_as::<_, Chapter>("SELECT * FROM chapters WHERE slug = $1 AND deleted_at IS NULL")
                    .bind(slug)
                    .fetch_one(&self.pool)
                    .await?;
            Ok(chapter)
        })
        .await
    }

    async fn add(&self, ctx: &Context, chapter: Chapter) -> RepositoryResult<Chapter> {
        ctx.run(async move {
            if !chapter.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::Chapter));
            }
            // Inserts nothing (RowNotFound) unless the parent project is live.
            let created = sqlx::query_as::<_, Chapter>(
                r#"
                INSERT INTO chapters (id, title, content, slug, project_id)
                SELECT $1, $2, $3, $4, p.id
                FROM projects p
                WHERE p.id = $5 AND p.deleted_at IS NULL
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&chapter.title)
            .bind(&chapter.content)
            .bind(slugify(&chapter.title))
            .bind(chapter.project_id)
            .fetch_one(&self.pool)
            .await?;

            tracing::debug!(chapter_id = %created.id, slug = %created.slug, "chapter created");
            Ok(created)
        })
        .await
    }

    async fn update(&self, ctx: &Context, chapter: Chapter) -> RepositoryResult<Chapter> {
        ctx.run(async move {
            if !chapter.is_valid() {
                return Err(RepositoryError::InvalidEntity(EntityKind::Chapter));
            }
            let updated = sqlx::query_as::<_, Chapter>(
                r#"
                UPDATE chapters
                SET updated_at = now(), title = $2, content = $3
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
                "#,
            )
            .bind(chapter.id)
            .bind(&chapter.title)
            .bind(&chapter.content)
            .fetch_one(&self.pool)
            .await?;
            Ok(updated)
        })
        .await
    }

    async fn delete(&self, ctx: &Context, id: Uuid) -> RepositoryResult<()> {
        ctx.run(async {
            sqlx::query("UPDATE chapters SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&self.pool)
                .await?;
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
            let sql = format!(
                "SELECT * FROM chapters WHERE project_id = $1 AND deleted_at IS NULL {} LIMIT $2 OFFSET $3",
                options.order.to_sql(None)
            );
            let chapters = sqlx::query_as::<_, Chapter>(&sql)
                .bind(project_id)
                .bind(options.limit)
                .bind(options.offset)
                .fetch_all(&self.pool)
                .await?;
            Ok(chapters)
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
            let sql = format!(
                r#"
                SELECT c.*
                FROM chapters c
                JOIN projects p ON p.id = c.project_id AND p.deleted_at IS NULL
                WHERE p.slug = $1 AND c.deleted_at IS NULL
                {}
                LIMIT $2 OFFSET $3
                "#,
                options.order.to_sql(Some("c"))
            );
            let chapters = sqlx::query_as::<_, Chapter>(&sql)
                .bind(project_slug)
                .bind(options.limit)
                .bind(options.offset)
                .fetch_all(&self.pool)
                .await?;
            Ok(chapters)
        })
        .await
    }
}
