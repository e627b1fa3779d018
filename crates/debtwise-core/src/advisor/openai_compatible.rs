//! OpenAI-compatible backend implementation
//!
//! Works with any server that implements the OpenAI chat completions API:
//! - OpenAI (https://api.openai.com)
//! - vLLM (http://localhost:8000)
//! - LocalAI (http://localhost:8080)
//! - llama-server / llama.cpp (http://localhost:8080)
//!
//! # Configuration
//!
//! Environment variables:
//! - `OPENAI_COMPATIBLE_HOST`: Server URL
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: advisor.toml `model`)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)
//! - `OPENAI_API_KEY`: used against api.openai.com when no host is set

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AdvisorConfig, ChatBackend, GenerationOptions, PromptMessage};
use crate::error::{Error, Result};

const OPENAI_HOST: &str = "https://api.openai.com";

/// OpenAI-compatible backend
///
/// Sends the conversation to `{host}/v1/chat/completions` and returns the
/// first choice's message content.
#[derive(Clone)]
pub struct OpenAICompatibleBackend {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAICompatibleBackend {
    /// Create a new OpenAI-compatible backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
        }
    }

    /// Create with an API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::new(base_url, model)
        }
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Apply a request timeout to every call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        match Client::builder().timeout(timeout).build() {
            Ok(client) => self.http_client = client,
            Err(e) => tracing::warn!(error = %e, "Failed to build HTTP client with timeout"),
        }
        self
    }

    /// Create from environment variables
    ///
    /// Uses `OPENAI_COMPATIBLE_HOST`, or api.openai.com when only
    /// `OPENAI_API_KEY` is set. Returns None if neither is present.
    pub fn from_env(config: &AdvisorConfig) -> Option<Self> {
        let openai_key = std::env::var("OPENAI_API_KEY").ok();
        let host = std::env::var("OPENAI_COMPATIBLE_HOST")
            .ok()
            .or_else(|| openai_key.as_ref().map(|_| OPENAI_HOST.to_string()))?;
        let model =
            std::env::var("OPENAI_COMPATIBLE_MODEL").unwrap_or_else(|_| config.model.clone());
        let api_key = std::env::var("OPENAI_COMPATIBLE_API_KEY")
            .ok()
            .or(openai_key);

        let mut backend = Self::new(&host, &model).with_timeout(config.timeout());
        backend.api_key = api_key;
        Some(backend)
    }

    async fn chat_completion(
        &self,
        messages: &[PromptMessage],
        options: &GenerationOptions,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: Some(options.temperature),
            max_tokens: Some(options.max_tokens),
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = req_builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::AdvisoryUnavailable(format!(
                "chat API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::AdvisoryUnavailable("No response from chat API".into()))
    }
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<PromptMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatBackend for OpenAICompatibleBackend {
    async fn chat(
        &self,
        messages: &[PromptMessage],
        options: &GenerationOptions,
    ) -> Result<String> {
        let reply = self
            .chat_completion(messages, options)
            .await
            .map_err(|e| match e {
                Error::AdvisoryUnavailable(_) => e,
                other => Error::AdvisoryUnavailable(other.to_string()),
            })?;
        debug!(model = %self.model, chars = reply.len(), "Chat completion received");
        Ok(reply)
    }

    async fn health_check(&self) -> bool {
        let mut req_builder = self
            .http_client
            .get(format!("{}/v1/models", self.base_url));
        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        match req_builder.send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockChatServer;

    #[test]
    fn test_backend_new() {
        let backend = OpenAICompatibleBackend::new("http://localhost:8080", "gpt-4o-mini");
        assert_eq!(backend.model(), "gpt-4o-mini");
        assert_eq!(backend.host(), "http://localhost:8080");
        assert_eq!(backend.api_key, None);
    }

    #[test]
    fn test_backend_new_trims_trailing_slash() {
        let backend = OpenAICompatibleBackend::new("http://localhost:8080/", "gpt-4o-mini");
        assert_eq!(backend.host(), "http://localhost:8080");
    }

    #[test]
    fn test_backend_with_api_key() {
        let backend =
            OpenAICompatibleBackend::with_api_key("https://api.openai.com", "gpt-4o", "sk-test");
        assert_eq!(backend.model(), "gpt-4o");
        assert_eq!(backend.api_key, Some("sk-test".to_string()));
    }

    #[tokio::test]
    async fn test_health_check_unreachable() {
        let backend = OpenAICompatibleBackend::new("http://localhost:99999", "gpt-4o-mini");
        assert!(!backend.health_check().await);
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![PromptMessage::system("sys"), PromptMessage::user("Hello")],
            temperature: Some(0.7),
            max_tokens: Some(500),
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hello");
        let temp = json["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 0.001);
        assert_eq!(json["max_tokens"], 500);
        assert_eq!(json["stream"], false);
    }

    #[test]
    fn test_response_with_null_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[tokio::test]
    async fn test_chat_against_mock_server() {
        let server = MockChatServer::with_reply("Tackle the Visa first.").await;
        let backend = OpenAICompatibleBackend::with_api_key(&server.url(), "gpt-4o-mini", "sk-1");

        let reply = backend
            .chat(
                &[PromptMessage::system("ctx"), PromptMessage::user("Help")],
                &GenerationOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(reply, "Tackle the Visa first.");
        assert!(backend.health_check().await);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer sk-1"));
        assert_eq!(requests[0].body["model"], "gpt-4o-mini");
        assert_eq!(requests[0].body["max_tokens"], 500);
        assert_eq!(requests[0].body["messages"][1]["content"], "Help");
    }

    #[tokio::test]
    async fn test_upstream_error_is_advisory_unavailable() {
        let server = MockChatServer::failing(503).await;
        let backend = OpenAICompatibleBackend::new(&server.url(), "gpt-4o-mini");

        let err = backend
            .chat(&[PromptMessage::user("Help")], &GenerationOptions::default())
            .await
            .unwrap_err();

        match err {
            Error::AdvisoryUnavailable(msg) => assert!(msg.contains("503")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_advisory_unavailable() {
        let backend = OpenAICompatibleBackend::new("http://127.0.0.1:1", "gpt-4o-mini");
        let err = backend
            .chat(&[PromptMessage::user("Help")], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AdvisoryUnavailable(_)));
    }
}
