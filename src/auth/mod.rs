pub mod password;
pub mod token;

use std::time::Duration;

use thiserror::Error;

use crate::context::Context;
use crate::database::error::RepositoryError;
use crate::database::models::User;
use crate::database::repository::UserRepository;

pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenError, TokenIssuer};

/// Deadline for the user lookup performed during login.
pub const AUTH_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user not found")]
    NotFound,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("password hash error: {0}")]
    Hash(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => AuthError::NotFound,
            other => AuthError::Repository(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("user '{0}' is not staff")]
    Unauthorized(String),

    #[error("user lookup failed: {0}")]
    Lookup(RepositoryError),
}

/// Check a username and plaintext password against the stored hash.
///
/// The lookup runs under its own `timeout`. The returned user still carries the
/// password hash; serialization skips it.
pub async fn authenticate(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
    timeout: Duration,
) -> Result<User, AuthError> {
    let ctx = Context::with_timeout(timeout);
    let user = users.find_by_username(&ctx, username).await?;
    verify_password(password, &user.password)?;
    Ok(user)
}

/// Resolve the token subject to a live user and require the staff flag.
///
/// A subject whose account no longer exists is treated as unauthenticated;
/// any other lookup failure is reported as such.
pub async fn authorize_staff(
    users: &dyn UserRepository,
    ctx: &Context,
    claims: &Claims,
) -> Result<User, AuthorizationError> {
    let user = match users.find_by_username(ctx, &claims.sub).await {
        Ok(user) => user,
        Err(RepositoryError::NotFound) => return Err(AuthorizationError::Unauthenticated),
        Err(e) => return Err(AuthorizationError::Lookup(e)),
    };

    if !user.is_staff {
        return Err(AuthorizationError::Unauthorized(user.username));
    }
    Ok(user)
}
