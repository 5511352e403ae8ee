//! Error types for the GuIA guide-generation worker.

use thiserror::Error;

/// Completion-service errors
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Rate limited by completion service: {0}")]
    RateLimited(String),

    #[error("Completion request failed with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Completion transport error: {0}")]
    Transport(String),

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    /// True for the only transient condition worth retrying.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, CompletionError::RateLimited(_))
    }
}

/// Project-service errors
#[derive(Debug, Error)]
pub enum ProjectApiError {
    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Project request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Project transport error: {0}")]
    Transport(String),
}

/// Errors surfaced by the worker entry point and message decoding
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to decode queue message: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for WorkerError {
    fn from(err: config::ConfigError) -> Self {
        WorkerError::Config(err.to_string())
    }
}
