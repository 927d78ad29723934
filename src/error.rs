// HTTP API Error Types
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::auth::{AuthError, AuthorizationError, TokenError};
use crate::database::error::{CancelCause, RepositoryError};

/// Message for every login failure, whatever the cause.
pub const LOGIN_FAILED: &str = "Invalid username or password";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert core error types to ApiError
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::not_found("Record not found"),
            RepositoryError::InvalidEntity(kind) => ApiError::bad_request(format!("Invalid {}", kind)),
            RepositoryError::InvalidOrder(msg) => ApiError::bad_request(format!("Invalid order: {}", msg)),
            RepositoryError::Conflict(constraint) => {
                tracing::debug!("Unique constraint violated: {}", constraint);
                ApiError::conflict("A record with the same unique value already exists")
            }
            RepositoryError::Canceled(CancelCause::DeadlineExceeded) => {
                tracing::warn!("Repository operation exceeded its deadline");
                ApiError::service_unavailable("Request timed out, please try again later")
            }
            RepositoryError::Canceled(CancelCause::Canceled) => {
                ApiError::service_unavailable("Request was canceled")
            }
            RepositoryError::PasswordHash(msg) => {
                tracing::error!("Password hashing error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            RepositoryError::Storage(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotFound => {
                tracing::warn!("Login failed: unknown user");
                ApiError::unauthorized(LOGIN_FAILED)
            }
            AuthError::IncorrectPassword => {
                tracing::warn!("Login failed: incorrect password");
                ApiError::unauthorized(LOGIN_FAILED)
            }
            AuthError::Hash(msg) => {
                tracing::error!("Stored password hash is unusable: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            AuthError::Repository(err) => err.into(),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::unauthorized("Token expired"),
            TokenError::InvalidToken => ApiError::unauthorized("Invalid token"),
            TokenError::MissingSecret | TokenError::Signing(_) => {
                tracing::error!("Token error: {}", err);
                ApiError::internal_server_error("Failed to issue token")
            }
        }
    }
}

impl From<AuthorizationError> for ApiError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::Unauthenticated => ApiError::unauthorized("Authentication required"),
            AuthorizationError::Unauthorized(username) => {
                tracing::warn!("Staff access denied for user '{}'", username);
                ApiError::forbidden("Staff access required")
            }
            AuthorizationError::Lookup(err) => {
                tracing::error!("Staff lookup failed: {}", err);
                ApiError::internal_server_error("Failed to resolve the current user")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::error::EntityKind;

    #[test]
    fn repository_errors_map_to_status() {
        let cases = [
            (RepositoryError::NotFound, StatusCode::NOT_FOUND),
            (RepositoryError::InvalidEntity(EntityKind::Project), StatusCode::BAD_REQUEST),
            (RepositoryError::InvalidOrder("x".into()), StatusCode::BAD_REQUEST),
            (RepositoryError::Conflict("projects_slug_key".into()), StatusCode::CONFLICT),
            (RepositoryError::Canceled(CancelCause::DeadlineExceeded), StatusCode::SERVICE_UNAVAILABLE),
            (RepositoryError::Storage(sqlx::Error::PoolTimedOut), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn login_failures_share_one_message() {
        let unknown = ApiError::from(AuthError::NotFound);
        let wrong = ApiError::from(AuthError::IncorrectPassword);
        assert_eq!(unknown.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.message(), wrong.message());
    }

    #[test]
    fn authorization_errors_map_to_status() {
        assert_eq!(
            ApiError::from(AuthorizationError::Unauthenticated).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthorizationError::Unauthorized("bob0".into())).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthorizationError::Lookup(RepositoryError::Storage(sqlx::Error::PoolClosed)))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_envelope_shape() {
        let body = ApiError::conflict("taken").to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "taken");
        assert_eq!(body["code"], "CONFLICT");
    }
}
