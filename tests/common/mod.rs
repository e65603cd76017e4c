#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use cards_api::auth::{PasswordHasher, TokenIssuer};
use cards_api::config::SecurityConfig;
use cards_api::database::{MemoryCardStore, MemoryUserStore};
use cards_api::llm::{CardGenerator, CardSuggestion, Message, ProviderError};
use cards_api::server::{self, AppState};
use cards_api::services::{AuthService, CardsService};

pub const JWT_SECRET: &str = "integration-test-secret";

/// Generator that answers every prompt with a fixed list of suggestions.
pub struct StaticGenerator {
    pub suggestions: Vec<CardSuggestion>,
}

#[async_trait]
impl CardGenerator for StaticGenerator {
    async fn generate(&self, messages: &[Message]) -> Result<Vec<CardSuggestion>, ProviderError> {
        if messages.is_empty() {
            return Err(ProviderError::EmptyConversation);
        }
        Ok(self.suggestions.clone())
    }
}

/// In-process app over in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub cards: Arc<MemoryCardStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_generator(Arc::new(StaticGenerator {
            suggestions: vec![
                CardSuggestion {
                    title: "Milk".to_string(),
                    content: "Buy 2% milk".to_string(),
                },
                CardSuggestion {
                    title: "Eggs".to_string(),
                    content: "Buy a dozen eggs".to_string(),
                },
            ],
        }))
    }

    pub fn with_generator(generator: Arc<dyn CardGenerator>) -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let cards = Arc::new(MemoryCardStore::new());

        let auth = AuthService::new(
            users,
            TokenIssuer::new(JWT_SECRET, 24).expect("token issuer"),
            PasswordHasher::new(8, 1).expect("password hasher"),
        );
        let state = AppState {
            auth: Arc::new(auth),
            cards: Arc::new(CardsService::new(cards.clone(), generator)),
            database: None,
            generation_timeout: Duration::from_secs(5),
        };
        let security = SecurityConfig {
            jwt_secret: JWT_SECRET.to_string(),
            jwt_expiry_hours: 24,
            enable_cors: true,
            cors_origins: Vec::new(),
            password_memory_kib: 8,
            password_iterations: 1,
        };

        Self {
            router: server::app(state, &security),
            cards,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };

        Ok(TestResponse { status, body })
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<TestResponse> {
        self.send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": password })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TestResponse> {
        self.send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Register and log in, returning the bearer token.
    pub async fn register_and_login(&self, name: &str, email: &str) -> Result<String> {
        let registered = self.register(name, email, "s3cret").await?;
        anyhow::ensure!(
            registered.status == StatusCode::CREATED,
            "register failed: {}",
            registered.body
        );

        let login = self.login(email, "s3cret").await?;
        login.body["data"]["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    pub async fn create_card(&self, token: &str, title: &str, content: &str) -> Result<Value> {
        let response = self
            .send(
                Method::POST,
                "/api/v1/cards/create",
                Some(token),
                Some(json!({ "title": title, "content": content })),
            )
            .await?;
        anyhow::ensure!(
            response.status == StatusCode::CREATED,
            "create failed: {}",
            response.body
        );
        Ok(response.body["data"].clone())
    }
}
