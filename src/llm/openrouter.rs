//! Reqwest-backed chat-completions client for OpenRouter-compatible APIs.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::{CardGenerator, CardSuggestion, CardsResponse, Message, ProviderError};
use crate::config::{ConfigError, LlmConfig};

const BODY_PREVIEW_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct CompletionDto {
    #[serde(default)]
    choices: Vec<ChoiceDto>,
}

#[derive(Debug, Deserialize)]
struct ChoiceDto {
    message: ChoiceMessageDto,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessageDto {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenRouterGenerator {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
    referer: Option<String>,
    title: Option<String>,
    timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenRouterBuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid completions endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl OpenRouterGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self, OpenRouterBuildError> {
        let endpoint = config.base_url()?.join("chat/completions")?;
        let timeout = config.request_timeout();
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn map_transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl CardGenerator for OpenRouterGenerator {
    async fn generate(&self, messages: &[Message]) -> Result<Vec<CardSuggestion>, ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured(
                "OPENROUTER_API_KEY is not set".to_string(),
            ));
        }
        let payload = build_payload(&self.model, messages)?;

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&payload);
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            request = request.header("X-Title", title);
        }

        debug!(
            "Requesting {} card suggestions from {}",
            self.model, self.endpoint
        );
        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Ok(parse_completion(&body)?.cards)
    }
}

/// Chat-completions request asking for a strict `cards_response` JSON object.
fn build_payload(model: &str, messages: &[Message]) -> Result<Value, ProviderError> {
    if messages.is_empty() {
        return Err(ProviderError::EmptyConversation);
    }

    Ok(json!({
        "model": model,
        "messages": messages,
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "cards_response",
                "schema": {
                    "type": "object",
                    "properties": {
                        "cards": {
                            "type": "array",
                            "description": "An array of cards generated using prompt and your intelligence",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "title": { "type": "string" },
                                    "content": { "type": "string" }
                                },
                                "required": ["title", "content"],
                                "additionalProperties": false
                            }
                        }
                    },
                    "required": ["cards"],
                    "additionalProperties": false
                }
            }
        }
    }))
}

fn parse_completion(body: &[u8]) -> Result<CardsResponse, ProviderError> {
    let completion: CompletionDto = serde_json::from_slice(body)
        .map_err(|e| ProviderError::Malformed(format!("invalid completion payload: {e}")))?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed("empty choices".to_string()))?
        .message
        .content
        .ok_or_else(|| ProviderError::Malformed("choice has no content".to_string()))?;

    serde_json::from_str(&content)
        .map_err(|e| ProviderError::Malformed(format!("invalid cards payload: {e}")))
}

fn status_error(status: StatusCode, body: &[u8]) -> ProviderError {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let mut preview: String = compact.chars().take(BODY_PREVIEW_LIMIT).collect();
    if compact.chars().count() > BODY_PREVIEW_LIMIT {
        preview.push_str("...");
    }

    ProviderError::Status {
        status: status.as_u16(),
        body: preview,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_keeps_message_order_and_schema() {
        let messages = vec![Message::system("be brief"), Message::user("two cards")];
        let payload = build_payload("openai/gpt-4o-mini", &messages).unwrap();

        assert_eq!(payload["model"], "openai/gpt-4o-mini");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["messages"][1]["content"], "two cards");
        assert_eq!(payload["response_format"]["type"], "json_schema");
        assert_eq!(
            payload["response_format"]["json_schema"]["name"],
            "cards_response"
        );
        assert_eq!(
            payload["response_format"]["json_schema"]["schema"]["required"],
            json!(["cards"])
        );
    }

    #[test]
    fn payload_requires_messages() {
        assert!(matches!(
            build_payload("m", &[]),
            Err(ProviderError::EmptyConversation)
        ));
    }

    #[test]
    fn parses_cards_from_first_choice() {
        let body = json!({
            "choices": [
                { "message": { "content": "{\"cards\":[{\"title\":\"Milk\",\"content\":\"2%\"}]}" } },
                { "message": { "content": "{\"cards\":[]}" } }
            ]
        });
        let parsed = parse_completion(body.to_string().as_bytes()).unwrap();
        assert_eq!(
            parsed.cards,
            vec![CardSuggestion {
                title: "Milk".to_string(),
                content: "2%".to_string()
            }]
        );
    }

    #[test]
    fn empty_choices_are_malformed() {
        let err = parse_completion(br#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn non_json_content_is_malformed() {
        let body = json!({ "choices": [ { "message": { "content": "here are your cards" } } ] });
        let err = parse_completion(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn status_error_truncates_body() {
        let body = "x".repeat(500);
        match status_error(StatusCode::BAD_GATEWAY, body.as_bytes()) {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 502);
                assert!(body.ends_with("..."));
                assert_eq!(body.chars().count(), BODY_PREVIEW_LIMIT + 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let generator = OpenRouterGenerator::new(&LlmConfig::default()).unwrap();
        assert_eq!(
            generator.endpoint().as_str(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
        assert!(!generator.is_configured());
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_network() {
        let generator = OpenRouterGenerator::new(&LlmConfig::default()).unwrap();
        let err = generator
            .generate(&[Message::user("anything")])
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
