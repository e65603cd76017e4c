// handlers/protected/auth/me.rs - GET /api/v1/auth/me handler

use axum::{extract::State, http::HeaderMap};

use crate::database::models::PublicUser;
use crate::error::ApiError;
use crate::middleware::{extract_bearer_token, ApiResponse, ApiResult};
use crate::server::AppState;

/// Current user behind the bearer token; 401 once the account no longer exists.
pub async fn me_get(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<PublicUser> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;
    let user = state.auth.resolve_identity(token).await?;
    Ok(ApiResponse::ok(PublicUser::from(user), "User found"))
}
