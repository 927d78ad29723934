use std::fmt;

use thiserror::Error;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres SQLSTATE for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Entity kinds, used to say which validator rejected an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Project,
    Chapter,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "user"),
            EntityKind::Project => write!(f, "project"),
            EntityKind::Chapter => write!(f, "chapter"),
        }
    }
}

/// Why a context stopped an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    Canceled,
    DeadlineExceeded,
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelCause::Canceled => write!(f, "canceled"),
            CancelCause::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Errors from repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("invalid {0}")]
    InvalidEntity(EntityKind),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("operation {0}")]
    Canceled(CancelCause),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Storage(sqlx::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound)
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, RepositoryError::Canceled(_))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return RepositoryError::NotFound;
        }
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("unique constraint");
                    return RepositoryError::Conflict(constraint.to_string());
                }
                // The referenced parent row is gone; callers see it as a missing record.
                Some(FOREIGN_KEY_VIOLATION) => return RepositoryError::NotFound,
                _ => {}
            }
        }
        RepositoryError::Storage(err)
    }
}
