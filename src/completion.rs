//! Generative Completion Client
//!
//! Single-turn text generation against an external completion service. The
//! [`GenerativeBackend`] trait isolates the wire protocol so the retry policy
//! and the orchestration above it can be tested without a network.
//! [`RetryingCompletionClient`] layers the bounded rate-limit retry on top of
//! any backend: 429 is the only transient condition worth retrying, all other
//! failures are deterministic and fail fast.

use crate::config::{CompletionConfig, PromptConfig};
use crate::error::CompletionError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Guide language, detected from the project record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Spanish,
}

impl Language {
    /// The project service stores the language as a display string; anything
    /// other than "English" selects Spanish.
    pub fn from_project_lang(lang: &str) -> Self {
        if lang == "English" {
            Language::English
        } else {
            Language::Spanish
        }
    }
}

/// One attempt against the completion service
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Send a single-turn request and return the generated text.
    async fn request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CompletionError>;
}

// Completion wire format: multi-part prompt payload, generated text nested in
// the first candidate.
#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

/// HTTP backend speaking the completion service's wire format
pub struct HttpCompletionBackend {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpCompletionBackend {
    pub fn new(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                CompletionError::Transport(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl GenerativeBackend for HttpCompletionBackend {
    async fn request(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CompletionError> {
        // The system prompt rides as a first user-role message; the service
        // has no dedicated system role in this API version.
        let request = GenerateRequest {
            contents: vec![
                Content {
                    role: "user".to_string(),
                    parts: vec![Part {
                        text: system_prompt.to_string(),
                    }],
                },
                Content {
                    role: "user".to_string(),
                    parts: vec![Part {
                        text: user_prompt.to_string(),
                    }],
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::RateLimited(body));
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| {
                CompletionError::MalformedResponse("no candidates in response".to_string())
            })
    }
}

/// Completion client with a bounded rate-limit retry policy
pub struct RetryingCompletionClient {
    backend: Arc<dyn GenerativeBackend>,
    max_retries: u32,
    retry_delay: Duration,
    system_english: String,
    // Configured but not yet selected; see system_prompt().
    #[allow(dead_code)]
    system_spanish: String,
}

impl RetryingCompletionClient {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        completion: &CompletionConfig,
        prompts: &PromptConfig,
    ) -> Self {
        Self {
            backend,
            max_retries: completion.max_retries.max(1),
            retry_delay: completion.retry_delay(),
            system_english: prompts.system_english.clone(),
            system_spanish: prompts.system_spanish.clone(),
        }
    }

    /// Build a client over the HTTP backend.
    pub fn from_config(
        completion: &CompletionConfig,
        prompts: &PromptConfig,
    ) -> Result<Self, CompletionError> {
        let backend = Arc::new(HttpCompletionBackend::new(completion)?);
        Ok(Self::new(backend, completion, prompts))
    }

    // The English system prompt is used for both languages. Observed behavior
    // of the deployed service; kept until product confirms intent.
    fn system_prompt(&self, language: Language) -> &str {
        match language {
            Language::English | Language::Spanish => &self.system_english,
        }
    }

    /// Generate text for `prompt`, retrying on rate limits up to the
    /// configured attempt cap with a fixed delay between attempts.
    pub async fn complete(
        &self,
        prompt: &str,
        language: Language,
    ) -> Result<String, CompletionError> {
        let system = self.system_prompt(language);
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.backend.request(system, prompt).await {
                Ok(text) => {
                    debug!(attempts, "completion succeeded");
                    return Ok(text);
                }
                Err(err) if err.is_rate_limit() && attempts < self.max_retries => {
                    warn!(
                        attempts,
                        delay_secs = self.retry_delay.as_secs(),
                        "rate limited, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
