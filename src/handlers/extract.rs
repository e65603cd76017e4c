// handlers/extract.rs - Request body and path helpers
//
// Axum's own rejections answer in plain text; these keep failures inside the
// JSON error envelope.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Json, Path};
use uuid::Uuid;

use crate::error::ApiError;

pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(format!("Invalid request payload: {}", rejection.body_text())))
}

pub fn path_card_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::field_error("card_id", "card_id must be a UUID"))
}
