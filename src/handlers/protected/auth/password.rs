// handlers/protected/auth/password.rs - PUT /api/v1/auth/password handler

use axum::extract::{rejection::JsonRejection, Extension, Json, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthIdentity;
use crate::handlers::extract::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn password_put(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let request = json_body(payload)?;
    state
        .auth
        .change_password(identity.user_id, &request.current_password, &request.new_password)
        .await?;

    Ok(ApiResponse::ok(
        json!({ "user_id": identity.user_id }),
        "Password changed successfully",
    ))
}
