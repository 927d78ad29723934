use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::context::Context;
use crate::database::error::RepositoryError;
use crate::database::postgres::{PgChapterRepository, PgProjectRepository, PgUserRepository};
use crate::database::repository::{ChapterRepository, ProjectRepository, UserRepository};

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("database connection did not complete within {0:?}")]
    ConnectTimeout(Duration),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns the Postgres pool and hands out repositories over it.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Open the pool and verify one connection within the configured deadline.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = url::Url::parse(&config.url).map_err(|e| DatabaseError::InvalidDatabaseUrl(e.to_string()))?;
        let timeout = Duration::from_secs(config.connect_timeout_secs);

        let ctx = Context::with_timeout(timeout);
        let options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(timeout);

        let connect = options.connect(url.as_str());
        let pool = ctx
            .run(async move { connect.await.map_err(RepositoryError::Storage) })
            .await
            .map_err(|e| match e {
                RepositoryError::Storage(err) => DatabaseError::Sqlx(err),
                _ => DatabaseError::ConnectTimeout(timeout),
            })?;

        info!(
            host = url.host_str().unwrap_or("localhost"),
            database = url.path().trim_start_matches('/'),
            max_connections = config.max_connections,
            "connected to database"
        );
        Ok(Self { pool })
    }

    /// Apply the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        Arc::new(PgUserRepository::new(self.pool.clone()))
    }

    pub fn projects(&self) -> Arc<dyn ProjectRepository> {
        Arc::new(PgProjectRepository::new(self.pool.clone()))
    }

    pub fn chapters(&self) -> Arc<dyn ChapterRepository> {
        Arc::new(PgChapterRepository::new(self.pool.clone()))
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close(&self) {
        self.pool.close().await;
        info!("closed database pool");
    }
}
