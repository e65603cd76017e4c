//! Persistence ports used by the services.
//!
//! Services only ever see these traits; `postgres` and `memory` provide the
//! implementations. Lookups return `Ok(None)` for a missing row, while
//! mutations of a missing row fail with [`StoreError::NotFound`].

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{Card, NewCard, NewUser, User};

/// Postgres SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StoreError::UniqueViolation(db.constraint().unwrap_or("unknown").to_string())
            }
            other => StoreError::Sqlx(other),
        }
    }
}

/// User persistence. Email uniqueness is the store's responsibility and must
/// surface as [`StoreError::UniqueViolation`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// Persists name, email and password hash of an existing user.
    async fn update(&self, user: &User) -> Result<User, StoreError>;
}

/// Card persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Card>, StoreError>;

    /// Cards owned by `owner`, oldest first. The filter is part of the query.
    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Card>, StoreError>;

    async fn create(&self, card: NewCard) -> Result<Card, StoreError>;

    /// Inserts every card or none of them, returning them in input order.
    async fn create_batch(&self, cards: Vec<NewCard>) -> Result<Vec<Card>, StoreError>;

    /// Writes title, content and status. The owner column is never rewritten.
    async fn update(&self, card: &Card) -> Result<Card, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
