use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{authorize_staff, Claims};
use crate::context::Context;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller extracted from a verified bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub claims: Claims,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub.clone(),
            claims,
        }
    }
}

/// Caller resolved to a live user with the staff flag set.
#[derive(Clone, Debug)]
pub struct StaffUser(pub User);

/// Reject requests without a valid bearer token; inject `AuthUser` otherwise.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = verify_bearer(&state, request.headers())?;
    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Like `require_auth`, then resolve the caller and require `is_staff`.
///
/// The lookup runs on every request under the auth lookup deadline.
pub async fn require_staff(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = verify_bearer(&state, request.headers())?;

    let ctx = Context::with_timeout(state.config.auth_lookup_timeout());
    let user = authorize_staff(state.users.as_ref(), &ctx, &claims).await?;
    tracing::debug!("Staff access granted: {}", user.username);

    request.extensions_mut().insert(AuthUser::from(claims));
    request.extensions_mut().insert(StaffUser(user));
    Ok(next.run(request).await)
}

fn verify_bearer(state: &AppState, headers: &HeaderMap) -> Result<Claims, ApiError> {
    let token = extract_jwt_from_headers(headers).map_err(ApiError::unauthorized)?;
    let claims = state.tokens.decode(&token).map_err(|e| {
        tracing::warn!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;
    Ok(claims)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_jwt_from_headers(&headers_with("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        assert!(extract_jwt_from_headers(&HeaderMap::new()).is_err());
        assert!(extract_jwt_from_headers(&headers_with("Basic dXNlcjpwdw==")).is_err());
        assert!(extract_jwt_from_headers(&headers_with("Bearer   ")).is_err());
    }
}
