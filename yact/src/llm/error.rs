//! Model client error types

use thiserror::Error;

/// Errors that can occur while talking to a model provider
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0}")]
    MissingApiKey(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("empty response from {0}")]
    EmptyResponse(String),
}
