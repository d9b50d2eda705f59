//! Error types for kbchat.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! validation, retrieval, generation and prompt errors. The retrieval and
//! generation variants are the ones the fallback chain absorbs.

use thiserror::Error;

/// Unified error type for kbchat.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller-side input errors (missing question or knowledge base id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Retriever or composite call failed or returned no usable data
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Generator call failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// Transport succeeded but the payload had no recognised text shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Whether the fallback chain may absorb this error and move on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Retrieval(_) | AppError::Generation(_) | AppError::MalformedResponse(_)
        )
    }

    /// Short, stable name for the error kind, used in logs and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Validation(_) => "validation",
            AppError::Retrieval(_) => "retrieval",
            AppError::Generation(_) => "generation",
            AppError::MalformedResponse(_) => "malformed_response",
            AppError::Cancelled => "cancelled",
            AppError::Prompt(_) => "prompt",
            AppError::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
