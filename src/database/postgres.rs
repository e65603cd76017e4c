use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Card, CardRow, NewCard, NewUser, User};
use super::store::{CardStore, CredentialStore, StoreError};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const CARD_COLUMNS: &str = "id, title, content, status, user_id, created_at, updated_at";

/// `users` table backed credential store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2, email = $3, password_hash = $4, updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }
}

/// `cards` table backed card store.
#[derive(Clone)]
pub struct PgCardStore {
    pool: PgPool,
}

impl PgCardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn insert_sql() -> String {
        format!(
            "INSERT INTO cards (id, title, content, status, user_id) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CARD_COLUMNS}"
        )
    }

    /// `seq` keeps a batch in input order; its rows share one `created_at`.
    fn list_by_owner_sql() -> String {
        format!("SELECT {CARD_COLUMNS} FROM cards WHERE user_id = $1 ORDER BY seq")
    }
}

#[async_trait]
impl CardStore for PgCardStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Card>, StoreError> {
        sqlx::query_as::<_, CardRow>(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Card::try_from)
            .transpose()
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<Card>, StoreError> {
        sqlx::query_as::<_, CardRow>(&Self::list_by_owner_sql())
            .bind(owner)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Card::try_from)
            .collect()
    }

    async fn create(&self, card: NewCard) -> Result<Card, StoreError> {
        let row = sqlx::query_as::<_, CardRow>(&Self::insert_sql())
            .bind(Uuid::new_v4())
            .bind(&card.title)
            .bind(&card.content)
            .bind(card.status.as_str())
            .bind(card.user_id)
            .fetch_one(&self.pool)
            .await?;

        Card::try_from(row)
    }

    async fn create_batch(&self, cards: Vec<NewCard>) -> Result<Vec<Card>, StoreError> {
        let sql = Self::insert_sql();
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(cards.len());

        for card in &cards {
            let row = sqlx::query_as::<_, CardRow>(&sql)
                .bind(Uuid::new_v4())
                .bind(&card.title)
                .bind(&card.content)
                .bind(card.status.as_str())
                .bind(card.user_id)
                .fetch_one(&mut *tx)
                .await?;
            created.push(Card::try_from(row)?);
        }

        // Dropping `tx` on any early return above rolls the whole batch back.
        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, card: &Card) -> Result<Card, StoreError> {
        let row = sqlx::query_as::<_, CardRow>(&format!(
            "UPDATE cards SET title = $2, content = $3, status = $4, updated_at = now() \
             WHERE id = $1 RETURNING {CARD_COLUMNS}"
        ))
        .bind(card.id)
        .bind(&card.title)
        .bind(&card.content)
        .bind(card.status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Card::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
