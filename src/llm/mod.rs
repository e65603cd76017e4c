//! Card generation provider port and its message types.
//!
//! The cards service builds the conversation; implementations only move it
//! over the wire and decode the `{ "cards": [...] }` answer.

pub mod openrouter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use openrouter::OpenRouterGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSuggestion {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardsResponse {
    pub cards: Vec<CardSuggestion>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("no messages provided")]
    EmptyConversation,

    #[error("provider transport error: {0}")]
    Transport(String),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),
}

/// Turns a role-tagged conversation into card suggestions. No retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CardGenerator: Send + Sync {
    async fn generate(&self, messages: &[Message]) -> Result<Vec<CardSuggestion>, ProviderError>;
}
