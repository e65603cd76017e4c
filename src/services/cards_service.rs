//! Owner-scoped card operations and AI-assisted card suggestions.
//!
//! Every mutation loads the card first, then checks `user_id` against the
//! caller. A foreign card is reported as [`CardsError::Unauthorized`] on
//! update/delete and as [`CardsError::NotFound`] on owner-scoped reads.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::database::models::{Card, CardStatus, NewCard};
use crate::database::{CardStore, StoreError};
use crate::llm::{CardGenerator, Message, ProviderError};

/// Instructions sent ahead of every generation prompt, in this order.
pub const SYSTEM_INSTRUCTIONS: [&str; 5] = [
    "You are a helpful assistant that generates cards based on the user prompt.",
    "Cards must be minimalistic and useful.",
    "Do not include any unnecessary information or explanations.",
    "Analyze if user wants to create multiple cards with same prompt, checking if prompt has different subjects.",
    "If possible, just provide the title and content of the card exactly how the user requested.",
];

#[derive(Debug, thiserror::Error)]
pub enum CardsError {
    #[error("card not found")]
    NotFound,

    #[error("card belongs to another user")]
    Unauthorized,

    #[error("invalid status '{0}' (expected undone, doing or done)")]
    InvalidStatus(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("card generation failed: {0}")]
    GenerationFailed(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CardsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CardsError::NotFound,
            other => CardsError::Store(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInput {
    pub title: String,
    pub content: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Generated suggestion, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub title: String,
    pub content: String,
    pub status: CardStatus,
}

pub struct CardsService {
    cards: Arc<dyn CardStore>,
    generator: Arc<dyn CardGenerator>,
}

impl CardsService {
    pub fn new(cards: Arc<dyn CardStore>, generator: Arc<dyn CardGenerator>) -> Self {
        Self { cards, generator }
    }

    pub async fn list(&self, owner: Uuid) -> Result<Vec<Card>, CardsError> {
        Ok(self.cards.list_by_owner(owner).await?)
    }

    /// Unscoped lookup by id.
    pub async fn get_by_id(&self, card_id: Uuid) -> Result<Card, CardsError> {
        self.cards
            .find_by_id(card_id)
            .await?
            .ok_or(CardsError::NotFound)
    }

    /// Lookup that hides cards owned by someone else.
    pub async fn get_owned_by_id(&self, owner: Uuid, card_id: Uuid) -> Result<Card, CardsError> {
        let card = self.get_by_id(card_id).await?;
        if card.user_id != owner {
            debug!("Card {} hidden from non-owner {}", card_id, owner);
            return Err(CardsError::NotFound);
        }
        Ok(card)
    }

    pub async fn create(&self, owner: Uuid, input: CardInput) -> Result<Card, CardsError> {
        let card = self.cards.create(new_card(owner, input)?).await?;
        info!("User {} created card {}", owner, card.id);
        Ok(card)
    }

    /// All inputs are validated before the single batch insert.
    pub async fn create_multiple(&self, owner: Uuid, inputs: Vec<CardInput>) -> Result<Vec<Card>, CardsError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let batch = inputs
            .into_iter()
            .map(|input| new_card(owner, input))
            .collect::<Result<Vec<_>, _>>()?;

        let created = self.cards.create_batch(batch).await?;
        info!("User {} created {} cards", owner, created.len());
        Ok(created)
    }

    pub async fn generate_multiple_cards(
        &self,
        owner: Uuid,
        prompt: &str,
        deadline: Duration,
    ) -> Result<Vec<GeneratedCard>, CardsError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CardsError::InvalidInput("prompt is required".to_string()));
        }

        let mut messages: Vec<Message> = SYSTEM_INSTRUCTIONS.iter().map(|s| Message::system(*s)).collect();
        messages.push(Message::user(prompt));

        let suggestions = match tokio::time::timeout(deadline, self.generator.generate(&messages)).await {
            Ok(Ok(suggestions)) => suggestions,
            Ok(Err(e)) => {
                error!("Card generation for user {} failed: {}", owner, e);
                return Err(CardsError::GenerationFailed(e));
            }
            Err(_) => {
                error!("Card generation for user {} timed out after {:?}", owner, deadline);
                return Err(CardsError::GenerationFailed(ProviderError::Timeout(deadline)));
            }
        };

        debug!("Generated {} card suggestions for user {}", suggestions.len(), owner);
        Ok(suggestions
            .into_iter()
            .map(|s| GeneratedCard {
                title: s.title,
                content: s.content,
                status: CardStatus::Undone,
            })
            .collect())
    }

    pub async fn update(&self, owner: Uuid, card_id: Uuid, patch: CardPatch) -> Result<Card, CardsError> {
        let mut card = self.owned_for_mutation(owner, card_id).await?;

        if let Some(status) = patch.status.as_deref() {
            card.status = status
                .parse()
                .map_err(|_| CardsError::InvalidStatus(status.to_string()))?;
        }
        if let Some(title) = patch.title {
            card.title = non_empty("title", title)?;
        }
        if let Some(content) = patch.content {
            card.content = non_empty("content", content)?;
        }

        let updated = self.cards.update(&card).await?;
        debug!("User {} updated card {}", owner, card_id);
        Ok(updated)
    }

    /// Hard delete. Returns the card as it was before removal.
    pub async fn delete(&self, owner: Uuid, card_id: Uuid) -> Result<Card, CardsError> {
        let card = self.owned_for_mutation(owner, card_id).await?;
        self.cards.delete(card_id).await?;
        info!("User {} deleted card {}", owner, card_id);
        Ok(card)
    }

    async fn owned_for_mutation(&self, owner: Uuid, card_id: Uuid) -> Result<Card, CardsError> {
        let card = self.get_by_id(card_id).await?;
        if card.user_id != owner {
            warn!("User {} attempted to modify card {} owned by {}", owner, card_id, card.user_id);
            return Err(CardsError::Unauthorized);
        }
        Ok(card)
    }
}

fn new_card(owner: Uuid, input: CardInput) -> Result<NewCard, CardsError> {
    Ok(NewCard {
        title: non_empty("title", input.title)?,
        content: non_empty("content", input.content)?,
        status: CardStatus::Undone,
        user_id: owner,
    })
}

fn non_empty(field: &str, value: String) -> Result<String, CardsError> {
    if value.trim().is_empty() {
        return Err(CardsError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::store::MockCardStore;
    use crate::database::MemoryCardStore;
    use crate::llm::{CardSuggestion, MockCardGenerator};

    fn input(title: &str, content: &str) -> CardInput {
        CardInput {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    fn idle_generator() -> Arc<dyn CardGenerator> {
        let mut generator = MockCardGenerator::new();
        generator.expect_generate().never();
        Arc::new(generator)
    }

    fn service() -> (CardsService, Arc<MemoryCardStore>) {
        let store = Arc::new(MemoryCardStore::new());
        (CardsService::new(store.clone(), idle_generator()), store)
    }

    fn status_patch(status: &str) -> CardPatch {
        CardPatch {
            status: Some(status.to_string()),
            ..CardPatch::default()
        }
    }

    #[tokio::test]
    async fn created_cards_start_undone_and_round_trip() {
        let (cards, _) = service();
        let owner = Uuid::new_v4();

        let created = cards.create(owner, input("Buy milk", "2%")).await.unwrap();
        assert_eq!(created.status, CardStatus::Undone);
        assert_eq!(created.user_id, owner);

        let fetched = cards.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let (cards, store) = service();
        let err = cards.create(Uuid::new_v4(), input("  ", "x")).await.unwrap_err();
        assert!(matches!(err, CardsError::InvalidInput(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn create_multiple_preserves_order_and_ownership() {
        let (cards, _) = service();
        let owner = Uuid::new_v4();

        let created = cards
            .create_multiple(owner, vec![input("one", "1"), input("two", "2")])
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].title, "one");
        assert_eq!(created[1].title, "two");
        assert!(created.iter().all(|c| c.user_id == owner && c.status == CardStatus::Undone));

        let listed = cards.list(owner).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn create_multiple_with_no_input_skips_store() {
        let mut store = MockCardStore::new();
        store.expect_create_batch().never();
        let cards = CardsService::new(Arc::new(store), idle_generator());

        let created = cards.create_multiple(Uuid::new_v4(), Vec::new()).await.unwrap();
        assert!(created.is_empty());
    }

    #[tokio::test]
    async fn create_multiple_surfaces_batch_failure() {
        let mut store = MockCardStore::new();
        store
            .expect_create_batch()
            .times(1)
            .returning(|_| Err(StoreError::Corrupt("insert aborted".to_string())));
        let cards = CardsService::new(Arc::new(store), idle_generator());

        let err = cards
            .create_multiple(Uuid::new_v4(), vec![input("a", "1"), input("b", "2")])
            .await
            .unwrap_err();
        assert!(matches!(err, CardsError::Store(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn create_multiple_validates_every_input_first() {
        let (cards, store) = service();
        let err = cards
            .create_multiple(Uuid::new_v4(), vec![input("a", "1"), input("b", "")])
            .await
            .unwrap_err();
        assert!(matches!(err, CardsError::InvalidInput(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let (cards, _) = service();
        let owner = Uuid::new_v4();
        let card = cards.create(owner, input("Buy milk", "2%")).await.unwrap();

        let updated = cards.update(owner, card.id, status_patch("doing")).await.unwrap();
        assert_eq!(updated.status, CardStatus::Doing);
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.content, "2%");

        let retitled = cards
            .update(
                owner,
                card.id,
                CardPatch {
                    title: Some("Buy oat milk".to_string()),
                    ..CardPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(retitled.title, "Buy oat milk");
        assert_eq!(retitled.status, CardStatus::Doing);
    }

    #[tokio::test]
    async fn every_status_transition_is_allowed() {
        let (cards, _) = service();
        let owner = Uuid::new_v4();
        let card = cards.create(owner, input("t", "c")).await.unwrap();

        for status in ["done", "undone", "done", "doing", "undone"] {
            let updated = cards.update(owner, card.id, status_patch(status)).await.unwrap();
            assert_eq!(updated.status.as_str(), status);
        }
    }

    #[tokio::test]
    async fn non_owner_update_leaves_card_unchanged() {
        let (cards, _) = service();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let card = cards.create(alice, input("Buy milk", "2%")).await.unwrap();
        cards.update(alice, card.id, status_patch("doing")).await.unwrap();

        let err = cards.update(bob, card.id, status_patch("done")).await.unwrap_err();
        assert!(matches!(err, CardsError::Unauthorized));

        let stored = cards.get_by_id(card.id).await.unwrap();
        assert_eq!(stored.status, CardStatus::Doing);
    }

    #[tokio::test]
    async fn invalid_status_is_rejected_without_write() {
        let (cards, _) = service();
        let owner = Uuid::new_v4();
        let card = cards.create(owner, input("t", "c")).await.unwrap();

        let err = cards.update(owner, card.id, status_patch("archived")).await.unwrap_err();
        assert!(matches!(err, CardsError::InvalidStatus(s) if s == "archived"));
        assert_eq!(cards.get_by_id(card.id).await.unwrap().status, CardStatus::Undone);
    }

    #[tokio::test]
    async fn missing_card_is_not_found() {
        let (cards, _) = service();
        let owner = Uuid::new_v4();
        let missing = Uuid::new_v4();

        assert!(matches!(cards.get_by_id(missing).await, Err(CardsError::NotFound)));
        assert!(matches!(
            cards.update(owner, missing, CardPatch::default()).await,
            Err(CardsError::NotFound)
        ));
        assert!(matches!(cards.delete(owner, missing).await, Err(CardsError::NotFound)));
    }

    #[tokio::test]
    async fn owned_lookup_hides_foreign_cards() {
        let (cards, _) = service();
        let alice = Uuid::new_v4();
        let card = cards.create(alice, input("t", "c")).await.unwrap();

        assert!(cards.get_owned_by_id(alice, card.id).await.is_ok());
        assert!(matches!(
            cards.get_owned_by_id(Uuid::new_v4(), card.id).await,
            Err(CardsError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_returns_snapshot_and_enforces_owner() {
        let (cards, store) = service();
        let alice = Uuid::new_v4();
        let card = cards.create(alice, input("t", "c")).await.unwrap();

        let err = cards.delete(Uuid::new_v4(), card.id).await.unwrap_err();
        assert!(matches!(err, CardsError::Unauthorized));
        assert_eq!(store.len().await, 1);

        let deleted = cards.delete(alice, card.id).await.unwrap();
        assert_eq!(deleted, card);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn generation_sends_instructions_then_prompt() {
        let mut generator = MockCardGenerator::new();
        generator
            .expect_generate()
            .withf(|messages: &[Message]| {
                messages.len() == SYSTEM_INSTRUCTIONS.len() + 1
                    && messages[..SYSTEM_INSTRUCTIONS.len()]
                        .iter()
                        .zip(SYSTEM_INSTRUCTIONS)
                        .all(|(m, text)| m.role == crate::llm::Role::System && m.content == text)
                    && messages[SYSTEM_INSTRUCTIONS.len()] == Message::user("groceries: milk, eggs")
            })
            .times(1)
            .returning(|_| {
                Ok(vec![
                    CardSuggestion {
                        title: "Milk".to_string(),
                        content: "Buy milk".to_string(),
                    },
                    CardSuggestion {
                        title: "Eggs".to_string(),
                        content: "Buy eggs".to_string(),
                    },
                ])
            });

        let store = Arc::new(MemoryCardStore::new());
        let cards = CardsService::new(store.clone(), Arc::new(generator));

        let generated = cards
            .generate_multiple_cards(Uuid::new_v4(), "groceries: milk, eggs", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(generated.len(), 2);
        assert!(generated.iter().all(|c| c.status == CardStatus::Undone));
        assert_eq!(generated[1].title, "Eggs");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn provider_failure_is_generation_failed() {
        let mut generator = MockCardGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(ProviderError::Malformed("not json".to_string())));
        let cards = CardsService::new(Arc::new(MemoryCardStore::new()), Arc::new(generator));

        let err = cards
            .generate_multiple_cards(Uuid::new_v4(), "anything", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CardsError::GenerationFailed(ProviderError::Malformed(_))));
    }

    #[tokio::test]
    async fn blank_prompt_never_reaches_provider() {
        let (cards, _) = service();
        let err = cards
            .generate_multiple_cards(Uuid::new_v4(), "   ", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CardsError::InvalidInput(_)));
    }

    struct SlowGenerator;

    #[async_trait::async_trait]
    impl CardGenerator for SlowGenerator {
        async fn generate(&self, _messages: &[Message]) -> Result<Vec<CardSuggestion>, ProviderError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn deadline_expiry_is_generation_failed() {
        let cards = CardsService::new(Arc::new(MemoryCardStore::new()), Arc::new(SlowGenerator));

        let err = cards
            .generate_multiple_cards(Uuid::new_v4(), "anything", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CardsError::GenerationFailed(ProviderError::Timeout(d)) if d == Duration::from_millis(20)
        ));
    }
}
