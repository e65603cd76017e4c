// handlers/public/auth/login.rs - POST /api/v1/auth/login handler

use axum::extract::{rejection::JsonRejection, Json, State};
use serde::Deserialize;

use crate::handlers::extract::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::LoginResponse;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/**
 * POST /api/v1/auth/login - Authenticate and receive a bearer token
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "status": 200,
 *   "message": "Login successful",
 *   "data": {
 *     "token": "eyJhbGciOiJIUzI1NiI...",
 *     "expires_at": "2026-01-02T00:00:00Z",
 *     "user": { "id": "...", "name": "Alice", "email": "alice@example.com", "created_at": "..." }
 *   }
 * }
 * ```
 *
 * Unknown email and wrong password both answer 401 with the same message.
 */
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let request = json_body(payload)?;
    let login = state.auth.login(&request.email, &request.password).await?;

    Ok(ApiResponse::ok(login, "Login successful"))
}
