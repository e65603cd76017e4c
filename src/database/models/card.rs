use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::database::StoreError;

/// Card workflow status. Every transition between the three states is allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    #[default]
    Undone,
    Doing,
    Done,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid card status '{0}' (expected undone, doing or done)")]
pub struct InvalidCardStatus(pub String);

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Undone => "undone",
            CardStatus::Doing => "doing",
            CardStatus::Done => "done",
        }
    }
}

impl FromStr for CardStatus {
    type Err = InvalidCardStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "undone" => Ok(CardStatus::Undone),
            "doing" => Ok(CardStatus::Doing),
            "done" => Ok(CardStatus::Done),
            other => Err(InvalidCardStatus(other.to_string())),
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub status: CardStatus,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Card as handed to a store for insertion; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub title: String,
    pub content: String,
    pub status: CardStatus,
    pub user_id: Uuid,
}

/// Raw `cards` row; status is stored as text.
#[derive(Debug, FromRow)]
pub struct CardRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub status: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for Card {
    type Error = StoreError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e: InvalidCardStatus| StoreError::Corrupt(format!("card {}: {}", row.id, e)))?;

        Ok(Card {
            id: row.id,
            title: row.title,
            content: row.content,
            status,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
