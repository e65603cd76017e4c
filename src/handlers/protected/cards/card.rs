// handlers/protected/cards/card.rs - Single card operations

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    Extension, Json, Path, State,
};
use uuid::Uuid;

use crate::auth::AuthIdentity;
use crate::database::models::Card;
use crate::handlers::extract::{json_body, path_card_id};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::CardPatch;

/// GET /api/v1/cards/by_id/:card_id - 404 for missing and foreign cards alike
pub async fn card_get(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Card> {
    let card_id = path_card_id(path)?;
    let card = state.cards.get_owned_by_id(identity.user_id, card_id).await?;
    Ok(ApiResponse::ok(card, "Card found"))
}

/// PATCH /api/v1/cards/update/:card_id
///
/// Only fields present in the body change. 403 when the caller is not the owner.
pub async fn card_patch(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CardPatch>, JsonRejection>,
) -> ApiResult<Card> {
    let card_id = path_card_id(path)?;
    let patch = json_body(payload)?;
    let card = state.cards.update(identity.user_id, card_id, patch).await?;
    Ok(ApiResponse::ok(card, "Card updated successfully"))
}

/// DELETE /api/v1/cards/delete/:card_id (also DELETE on /cards/update/:card_id)
pub async fn card_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Card> {
    let card_id = path_card_id(path)?;
    let card = state.cards.delete(identity.user_id, card_id).await?;
    Ok(ApiResponse::ok(card, "Card deleted successfully"))
}
