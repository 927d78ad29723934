// handlers/users.rs - /api/user/* handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::authenticate;
use crate::database::models::User;
use crate::database::RepositoryError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// POST /api/user/register - create an account. Role flags are never taken from the body.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<User> {
    let Json(input) = payload?;
    let mut user = User::new(input.username, input.email, input.name, input.password);
    user.profile_picture = input.profile_picture;

    let ctx = state.request_context();
    let user = state.users.add(&ctx, user).await?;
    tracing::info!("Registered user {} ({})", user.username, user.id);

    Ok(ApiResponse::created(user))
}

/// POST /api/user/login - verify credentials, stamp `last_login`, issue a token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(input) = payload?;

    let user = authenticate(
        state.users.as_ref(),
        &input.username,
        &input.password,
        state.config.auth_lookup_timeout(),
    )
    .await?;

    // Only last_login is written; role changes made meanwhile must survive.
    let ctx = state.request_context();
    let user = state.users.touch_login(&ctx, user.id).await?;

    let (token, expires_at) = state.tokens.issue_with_expiry(&user.username)?;
    tracing::info!("User {} logged in", user.username);

    Ok(ApiResponse::success(LoginResponse { token, expires_at, user }))
}

/// GET /api/user/me - the user behind the bearer token.
pub async fn me(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    let ctx = state.request_context();
    match state.users.find_by_username(&ctx, &auth.username).await {
        Ok(user) => Ok(ApiResponse::success(user)),
        Err(RepositoryError::NotFound) => Err(ApiError::unauthorized("Authentication required")),
        Err(e) => Err(e.into()),
    }
}
