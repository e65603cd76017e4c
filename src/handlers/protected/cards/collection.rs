// handlers/protected/cards/collection.rs - Owner-scoped collection operations

use axum::extract::{rejection::JsonRejection, Extension, Json, State};
use serde::Deserialize;

use crate::auth::AuthIdentity;
use crate::database::models::Card;
use crate::handlers::extract::json_body;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::services::{CardInput, GeneratedCard};

#[derive(Debug, Deserialize)]
pub struct GenerateCardsRequest {
    pub prompt: String,
}

/// GET /api/v1/cards/list
pub async fn cards_list(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
) -> ApiResult<Vec<Card>> {
    let cards = state.cards.list(identity.user_id).await?;
    Ok(ApiResponse::ok(cards, "Cards listed successfully"))
}

/// POST /api/v1/cards/create
///
/// Body `{ "title", "content" }`. Any status in the body is ignored; new
/// cards always start `undone`.
pub async fn cards_create(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    payload: Result<Json<CardInput>, JsonRejection>,
) -> ApiResult<Card> {
    let input = json_body(payload)?;
    let card = state.cards.create(identity.user_id, input).await?;
    Ok(ApiResponse::created(card, "Card created successfully"))
}

/// POST /api/v1/cards/create_multiple_cards
///
/// Body is a JSON array of `{ "title", "content" }`; all cards are stored or none.
pub async fn cards_create_multiple(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    payload: Result<Json<Vec<CardInput>>, JsonRejection>,
) -> ApiResult<Vec<Card>> {
    let inputs = json_body(payload)?;
    let cards = state.cards.create_multiple(identity.user_id, inputs).await?;
    Ok(ApiResponse::created(cards, "Cards created successfully"))
}

/// POST /api/v1/cards/generate_multiple_cards
///
/// Body `{ "prompt" }`. Suggestions are returned, not stored; clients persist
/// the ones they keep through `create_multiple_cards`.
pub async fn cards_generate(
    State(state): State<AppState>,
    Extension(identity): Extension<AuthIdentity>,
    payload: Result<Json<GenerateCardsRequest>, JsonRejection>,
) -> ApiResult<Vec<GeneratedCard>> {
    let request = json_body(payload)?;
    let cards = state
        .cards
        .generate_multiple_cards(identity.user_id, &request.prompt, state.generation_timeout)
        .await?;
    Ok(ApiResponse::ok(cards, "Cards generated successfully"))
}
