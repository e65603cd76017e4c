// handlers/public/auth/register.rs - POST /api/v1/auth/register handler

use axum::extract::{rejection::JsonRejection, Json, State};
use serde::Deserialize;

use crate::database::models::PublicUser;
use crate::handlers::extract::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Create an account. Responds 201 with the public user projection; 409 when
/// the email is already registered.
///
/// ```json
/// { "name": "Alice", "email": "alice@example.com", "password": "s3cret" }
/// ```
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<PublicUser> {
    let request = json_body(payload)?;
    let user = state
        .auth
        .register(&request.name, &request.email, &request.password)
        .await?;

    Ok(ApiResponse::created(
        PublicUser::from(user),
        "User registered successfully",
    ))
}
