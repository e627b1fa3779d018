//! Advisor configuration
//!
//! Loaded from an embedded default (`config/advisor.toml`) unless a user
//! override exists at `<data_local_dir>/debtwise/config/advisor.toml`.
//! Keys missing from the override keep their default values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::GenerationOptions;
use crate::error::{Error, Result};
use crate::ledger::MissingDebtPolicy;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../config/advisor.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub missing_debt_policy: MissingDebtPolicy,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            timeout_secs: 60,
            missing_debt_policy: MissingDebtPolicy::TreatAsPrincipal,
        }
    }
}

/// On-disk layout; every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    chat: Option<RawChat>,
    ledger: Option<RawLedger>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawChat {
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLedger {
    missing_debt_policy: Option<MissingDebtPolicy>,
}

impl AdvisorConfig {
    /// Load from the default override location, falling back to the embedded config
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path().as_deref())
    }

    /// Load from `path` if it exists, otherwise the embedded config
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::parse(DEFAULT_CONFIG)?;

        match path {
            Some(path) if path.exists() => {
                let content = fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;
                tracing::debug!(path = %path.display(), "Loaded advisor config override");
                defaults.merged(&content)
            }
            _ => Ok(defaults),
        }
    }

    /// Parse a config file on top of the built-in defaults
    pub fn parse(content: &str) -> Result<Self> {
        Self::default().merged(content)
    }

    fn merged(mut self, content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        if let Some(chat) = raw.chat {
            if let Some(model) = chat.model {
                self.model = model;
            }
            if let Some(temperature) = chat.temperature {
                self.temperature = temperature;
            }
            if let Some(max_tokens) = chat.max_tokens {
                self.max_tokens = max_tokens;
            }
            if let Some(timeout) = chat.timeout_secs {
                self.timeout_secs = timeout;
            }
        }
        if let Some(policy) = raw.ledger.and_then(|l| l.missing_debt_policy) {
            self.missing_debt_policy = policy;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::Config("chat.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "chat.temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(Error::Config("chat.max_tokens must be positive".into()));
        }
        Ok(())
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("debtwise").join("config").join("advisor.toml"))
}
