//! Process-local stores for `serve --in-memory` and tests.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{Card, NewCard, NewUser, User};
use super::store::{CardStore, CredentialStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        let stored = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(StoreError::NotFound)?;
        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCardStore {
    cards: RwLock<Vec<Card>>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }

    fn materialize(card: NewCard) -> Card {
        let now = Utc::now();
        Card {
            id: Uuid::new_v4(),
            title: card.title,
            content: card.content,
            status: card.status,
            user_id: card.user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl CardStore for MemoryCardStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Card>, StoreError> {
        let cards = self.cards.read().await;
        Ok(cards.iter().find(|c| c.id == id).cloned())
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Card>, StoreError> {
        let cards = self.cards.read().await;
        Ok(cards.iter().filter(|c| c.user_id == owner).cloned().collect())
    }

    async fn create(&self, card: NewCard) -> Result<Card, StoreError> {
        let created = Self::materialize(card);
        self.cards.write().await.push(created.clone());
        Ok(created)
    }

    async fn create_batch(&self, cards: Vec<NewCard>) -> Result<Vec<Card>, StoreError> {
        let created: Vec<Card> = cards.into_iter().map(Self::materialize).collect();
        self.cards.write().await.extend(created.iter().cloned());
        Ok(created)
    }

    async fn update(&self, card: &Card) -> Result<Card, StoreError> {
        let mut cards = self.cards.write().await;
        let stored = cards
            .iter_mut()
            .find(|c| c.id == card.id)
            .ok_or(StoreError::NotFound)?;
        stored.title = card.title.clone();
        stored.content = card.content.clone();
        stored.status = card.status;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut cards = self.cards.write().await;
        let index = cards
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        cards.remove(index);
        Ok(())
    }
}
