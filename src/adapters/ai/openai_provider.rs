//! OpenAI Provider - Implementation of AIProvider for OpenAI's chat completions API.
//!
//! Supports vision-capable models (gpt-4o by default). Image turns are sent as
//! a `content` array of `text` and `image_url` parts; text turns as a plain string.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config);
//! ```
//!
//! Requests are not retried. A failed turn is reported to the user and the
//! next message from them is a fresh attempt.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, ContentPart, FinishReason,
    MessageContent, MessageRole, ProviderInfo, TokenUsage,
};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4o").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts our request to OpenAI's format.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: OpenAIContent::Text(prompt.clone()),
            });
        }

        for msg in &request.messages {
            messages.push(OpenAIMessage {
                role: match msg.role {
                    MessageRole::System => "system",
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                }
                .to_string(),
                content: OpenAIContent::from(&msg.content),
            });
        }

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Sends a request to the completions endpoint.
    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        let openai_request = self.to_openai_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(AIError::AuthenticationFailed),
            429 => Err(AIError::rate_limited(Self::parse_retry_after(&error_body))),
            400 => Err(AIError::InvalidRequest(error_body)),
            500..=599 => Err(AIError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(AIError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }

    /// Parses retry-after from error response.
    fn parse_retry_after(error_body: &str) -> u32 {
        // OpenAI sometimes says "try again in Ns"; default to 30 seconds.
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
            if let Some(s) = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                if let Some(idx) = s.find("try again in ") {
                    let rest = &s[idx + 13..];
                    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                    if let Ok(secs) = digits.parse::<u32>() {
                        return secs;
                    }
                }
            }
        }
        30
    }

    /// Parses a completion response.
    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let response = self.handle_response_status(response).await?;

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        Self::into_completion(openai_response)
    }

    fn into_completion(openai_response: OpenAIResponse) -> Result<CompletionResponse, AIError> {
        let choice = openai_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return match finish_reason {
                FinishReason::ContentFilter => {
                    Err(AIError::content_filtered("completion blocked by provider"))
                }
                _ => Err(AIError::EmptyResponse),
            };
        }

        let usage = openai_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse {
            content,
            usage,
            model: openai_response.model,
            finish_reason,
        })
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.send_request(&request).await?;
        self.parse_response(response).await
    }

    fn provider_info(&self) -> ProviderInfo {
        let vision = self.config.model.starts_with("gpt-4o")
            || self.config.model.starts_with("gpt-4-turbo")
            || self.config.model.starts_with("gpt-4.1");

        ProviderInfo::new("openai", &self.config.model).with_vision(vision)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: OpenAIContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIPart>),
}

impl From<&MessageContent> for OpenAIContent {
    fn from(content: &MessageContent) -> Self {
        match content {
            MessageContent::Text(text) => Self::Text(text.clone()),
            MessageContent::Parts(parts) => Self::Parts(
                parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => OpenAIPart::Text { text: text.clone() },
                        ContentPart::ImageUrl { url } => OpenAIPart::ImageUrl {
                            image_url: OpenAIImageUrl { url: url.clone() },
                        },
                    })
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Debug, Serialize)]
struct OpenAIImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Prompt;
    use crate::domain::foundation::{TurnId, UserId};
    use crate::ports::{Message, RequestMetadata};
    use serde_json::json;

    fn metadata() -> RequestMetadata {
        RequestMetadata::new(UserId::new("5491100000000").unwrap(), TurnId::new())
    }

    fn provider() -> OpenAIProvider {
        OpenAIProvider::new(OpenAIConfig::new("test-key"))
    }

    #[test]
    fn config_builder_works() {
        let config = OpenAIConfig::new("test-key")
            .with_model("gpt-4o-mini")
            .with_base_url("https://custom.api.com")
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, "https://custom.api.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn config_defaults_to_gpt_4o() {
        assert_eq!(OpenAIConfig::new("k").model, "gpt-4o");
    }

    #[test]
    fn completions_url_ignores_trailing_slash() {
        let provider = OpenAIProvider::new(
            OpenAIConfig::new("k").with_base_url("http://localhost:8080/v1/"),
        );
        assert_eq!(
            provider.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn text_request_serializes_content_as_string() {
        let request = CompletionRequest::new(metadata())
            .with_system_prompt("Sos un nutricionista virtual.")
            .with_message(Message::user("¿Puedo comer pan?"))
            .with_max_tokens(300);

        let body = serde_json::to_value(provider().to_openai_request(&request)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 300);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "¿Puedo comer pan?");
    }

    #[test]
    fn image_request_serializes_content_parts() {
        let prompt = Prompt::for_image(Some("keto"), "https://media.example/m1", None);
        let request = CompletionRequest::from_prompt(prompt, metadata());

        let body = serde_json::to_value(provider().to_openai_request(&request)).unwrap();
        let parts = &body["messages"][1]["content"];

        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "¿Puedo comer esto en la dieta keto?");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "https://media.example/m1");
    }

    #[test]
    fn parses_completion() {
        let raw: OpenAIResponse = serde_json::from_value(json!({
            "model": "gpt-4o-2024-08-06",
            "choices": [{"message": {"role": "assistant", "content": "Sí, es apto."}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 40, "completion_tokens": 8}
        }))
        .unwrap();

        let completion = OpenAIProvider::into_completion(raw).unwrap();
        assert_eq!(completion.content, "Sí, es apto.");
        assert_eq!(completion.usage.total_tokens, 48);
        assert_eq!(completion.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn empty_choices_is_parse_error() {
        let raw: OpenAIResponse =
            serde_json::from_value(json!({"model": "gpt-4o", "choices": []})).unwrap();
        assert!(matches!(
            OpenAIProvider::into_completion(raw),
            Err(AIError::Parse(_))
        ));
    }

    #[test]
    fn null_content_is_empty_response() {
        let raw: OpenAIResponse = serde_json::from_value(json!({
            "model": "gpt-4o",
            "choices": [{"message": {"content": null}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert!(matches!(
            OpenAIProvider::into_completion(raw),
            Err(AIError::EmptyResponse)
        ));
    }

    #[test]
    fn filtered_empty_content_is_content_filtered() {
        let raw: OpenAIResponse = serde_json::from_value(json!({
            "model": "gpt-4o",
            "choices": [{"message": {"content": ""}, "finish_reason": "content_filter"}]
        }))
        .unwrap();
        assert!(matches!(
            OpenAIProvider::into_completion(raw),
            Err(AIError::ContentFiltered { .. })
        ));
    }

    #[test]
    fn provider_info_reports_vision_for_gpt_4o() {
        let info = provider().provider_info();
        assert_eq!(info.name, "openai");
        assert!(info.supports_vision);

        let legacy = OpenAIProvider::new(OpenAIConfig::new("k").with_model("gpt-3.5-turbo"));
        assert!(!legacy.provider_info().supports_vision);
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 20s."}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 20);
    }

    #[test]
    fn parse_retry_after_default() {
        let error = r#"{"error":{"message":"Something went wrong"}}"#;
        assert_eq!(OpenAIProvider::parse_retry_after(error), 30);
    }
}
