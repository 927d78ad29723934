use std::sync::Arc;

use crate::auth::{TokenError, TokenIssuer};
use crate::config::AppConfig;
use crate::context::Context;
use crate::database::{ChapterRepository, DatabaseManager, MemoryStore, ProjectRepository, UserRepository};

/// Shared handler state. Cheap to clone; everything behind it is immutable.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub chapters: Arc<dyn ChapterRepository>,
    pub tokens: Arc<TokenIssuer>,
    pub config: Arc<AppConfig>,
    /// `None` when running on the in-memory store.
    pub database: Option<DatabaseManager>,
}

impl AppState {
    /// State backed by Postgres repositories.
    pub fn new(config: AppConfig, database: DatabaseManager) -> Result<Self, TokenError> {
        let tokens = TokenIssuer::new(&config.security.jwt_secret, config.token_ttl())?;
        Ok(Self {
            users: database.users(),
            projects: database.projects(),
            chapters: database.chapters(),
            tokens: Arc::new(tokens),
            config: Arc::new(config),
            database: Some(database),
        })
    }

    /// State backed by an in-memory store.
    pub fn with_memory(config: AppConfig, store: &MemoryStore) -> Result<Self, TokenError> {
        let tokens = TokenIssuer::new(&config.security.jwt_secret, config.token_ttl())?;
        Ok(Self {
            users: Arc::new(store.users()),
            projects: Arc::new(store.projects()),
            chapters: Arc::new(store.chapters()),
            tokens: Arc::new(tokens),
            config: Arc::new(config),
            database: None,
        })
    }

    /// Context bounded by the configured request timeout.
    pub fn request_context(&self) -> Context {
        Context::with_timeout(self.config.request_timeout())
    }
}
