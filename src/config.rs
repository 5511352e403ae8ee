//! Configuration System
//!
//! Environment-driven configuration for the worker. Settings come from an
//! optional TOML file with `GUIA_*` environment variable overrides and are
//! validated before the worker starts. Nested fields use a double-underscore
//! separator, e.g. `GUIA_COMPLETION__API_KEY` for `completion.api_key`.

use crate::error::WorkerError;
use crate::logging::LoggingConfig;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GuiaConfig {
    /// Project service base URL, trailing slash included
    #[serde(default)]
    pub project_api_url: String,

    /// Completion service settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Prompt templates
    #[serde(default)]
    pub prompts: PromptConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Single-turn generation endpoint
    #[serde(default = "default_completion_endpoint")]
    pub endpoint: String,

    /// API key sent in the `x-goog-api-key` header
    #[serde(default)]
    pub api_key: String,

    /// Total attempts for a rate-limited request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between rate-limit retries, in seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_completion_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1/models/gemini-pro:generateContent".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    20
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_completion_endpoint(),
            api_key: String::new(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

impl CompletionConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Prompt templates for context summarization and system instructions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PromptConfig {
    /// Context-summarization template, English
    #[serde(default)]
    pub resume_english: String,

    /// Context-summarization template, Spanish
    #[serde(default)]
    pub resume_spanish: String,

    /// System prompt, English
    #[serde(default)]
    pub system_english: String,

    /// System prompt, Spanish
    #[serde(default)]
    pub system_spanish: String,
}

impl GuiaConfig {
    /// Load configuration from an optional file plus `GUIA_*` environment
    /// variables, environment taking precedence.
    pub fn load(file: Option<&Path>) -> Result<Self, WorkerError> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("GUIA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: GuiaConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), WorkerError> {
        if self.project_api_url.is_empty() {
            return Err(WorkerError::Config(
                "project_api_url must be set".to_string(),
            ));
        }
        if self.completion.api_key.is_empty() {
            return Err(WorkerError::Config(
                "completion.api_key must be set".to_string(),
            ));
        }
        if self.completion.max_retries == 0 {
            return Err(WorkerError::Config(
                "completion.max_retries must be at least 1".to_string(),
            ));
        }
        if self.prompts.resume_english.is_empty() || self.prompts.resume_spanish.is_empty() {
            return Err(WorkerError::Config(
                "prompts.resume_english and prompts.resume_spanish must be set".to_string(),
            ));
        }
        if self.prompts.system_english.is_empty() {
            return Err(WorkerError::Config(
                "prompts.system_english must be set".to_string(),
            ));
        }
        Ok(())
    }
}
