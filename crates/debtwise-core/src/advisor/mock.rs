//! Mock backend for testing
//!
//! Returns a fixed reply (or a fixed failure) and records every message
//! list it receives. Useful for unit tests and development without a
//! completion service.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{ChatBackend, GenerationOptions, PromptMessage};
use crate::error::{Error, Result};

const DEFAULT_REPLY: &str = "**Focus on your highest-interest debt first** while keeping \
minimum payments on the rest.";

/// Mock chat backend for testing
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: String,
    failure: Option<String>,
    model: String,
    calls: Arc<Mutex<Vec<Vec<PromptMessage>>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            reply: DEFAULT_REPLY.to_string(),
            failure: None,
            model: "mock".to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock that always answers with `reply`
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::new()
        }
    }

    /// Mock whose chat calls always fail with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            healthy: false,
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    /// Create a new instance with a different model name. Recorded calls are shared.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Message lists received so far, oldest first
    pub fn calls(&self) -> Vec<Vec<PromptMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn chat(
        &self,
        messages: &[PromptMessage],
        _options: &GenerationOptions,
    ) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }

        match self.failure {
            Some(ref message) => Err(Error::AdvisoryUnavailable(message.clone())),
            None => Ok(self.reply.clone()),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock"
    }
}
