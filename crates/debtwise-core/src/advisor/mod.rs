//! Debt advisor
//!
//! Turns a user's ledger into a plain-text financial summary and runs a
//! conversation with a chat-completion service seeded with that summary.
//!
//! # Architecture
//!
//! - `ChatBackend` trait: the interface every completion service implements
//! - `ChatClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`
//! - `AdvisorySession`: the conversation log and its side effects
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = AdvisorConfig::load()?;
//! let client = ChatClient::from_config(&config);
//!
//! if let Some(ref client) = client {
//!     let mut session = AdvisorySession::with_options(config.generation_options());
//!     let context = ledger.financial_context().render();
//!     let reply = session.send(client, "Which debt first?", Some(&context)).await?;
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, mock). Default: openai_compatible
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (defaults to api.openai.com when only
//!   `OPENAI_API_KEY` is set)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: from advisor.toml)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod config;
mod context;
mod mock;
mod openai_compatible;
mod session;

pub use config::{default_config_path, AdvisorConfig};
pub use context::{
    format_financial_context, DebtSummary, FinancialContext, PaymentSummary,
    RECENT_PAYMENT_LIMIT,
};
pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use session::{send_advisory_message, system_prompt, AdvisorySession};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A `{role, content}` pair sent to the completion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Sampling settings for a completion request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
        }
    }
}

/// Trait defining the interface for all chat-completion backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send an ordered message list and return the generated reply text
    async fn chat(&self, messages: &[PromptMessage], options: &GenerationOptions)
        -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete chat client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ChatClient {
    /// OpenAI chat completions API (OpenAI, vLLM, LocalAI, llama-server, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing and offline use
    Mock(MockBackend),
}

impl ChatClient {
    /// Create a client from environment variables using default advisor settings
    pub fn from_env() -> Option<Self> {
        Self::from_config(&AdvisorConfig::default())
    }

    /// Create a client from environment variables, taking the model and
    /// timeout defaults from the advisor config
    ///
    /// Returns None if the required environment variables are not set.
    pub fn from_config(config: &AdvisorConfig) -> Option<Self> {
        let backend =
            std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai_compatible".to_string());

        match backend.to_lowercase().as_str() {
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env(config).map(ChatClient::OpenAICompatible)
            }
            "mock" => Some(ChatClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(
                    backend = %backend,
                    "Unknown AI_BACKEND, falling back to openai_compatible"
                );
                OpenAICompatibleBackend::from_env(config).map(ChatClient::OpenAICompatible)
            }
        }
    }

    /// Create an OpenAI-compatible backend directly
    pub fn openai_compatible(host: &str, model: &str) -> Self {
        ChatClient::OpenAICompatible(OpenAICompatibleBackend::new(host, model))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ChatClient::Mock(MockBackend::new())
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            ChatClient::OpenAICompatible(b) => ChatClient::OpenAICompatible(b.with_model(model)),
            ChatClient::Mock(b) => ChatClient::Mock(b.with_model(model)),
        }
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn chat(
        &self,
        messages: &[PromptMessage],
        options: &GenerationOptions,
    ) -> Result<String> {
        match self {
            ChatClient::OpenAICompatible(b) => b.chat(messages, options).await,
            ChatClient::Mock(b) => b.chat(messages, options).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ChatClient::OpenAICompatible(b) => b.health_check().await,
            ChatClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            ChatClient::OpenAICompatible(b) => b.model(),
            ChatClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            ChatClient::OpenAICompatible(b) => b.host(),
            ChatClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_defaults() {
        let options = GenerationOptions::default();
        assert!((options.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(options.max_tokens, 500);
    }

    #[test]
    fn test_prompt_message_constructors() {
        assert_eq!(PromptMessage::system("x").role, "system");
        assert_eq!(PromptMessage::user("x").role, "user");
        assert_eq!(PromptMessage::assistant("x").role, "assistant");
    }

    #[tokio::test]
    async fn test_client_delegates_to_mock() {
        let client = ChatClient::Mock(MockBackend::with_reply("Pay the card first."));
        let reply = client
            .chat(&[PromptMessage::user("hi")], &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "Pay the card first.");
        assert!(client.health_check().await);
        assert_eq!(client.host(), "mock");
    }

    #[test]
    fn test_with_model_openai() {
        let client = ChatClient::openai_compatible("http://localhost:8080", "gpt-4o-mini");
        let other = client.with_model("llama3.2");
        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(other.model(), "llama3.2");
        assert_eq!(other.host(), "http://localhost:8080");
    }
}
