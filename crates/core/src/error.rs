//! Error types for the notebook workspace.
//!
//! This module defines a unified error enum that covers every error category
//! in the notebook: configuration, I/O, the answering service, the shared
//! store, draft validation, prompt rendering and serialization.

use thiserror::Error;

/// Unified error type for the notebook crates.
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

    /// Answering service / LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Shared key-value store errors
    #[error("Store error: {0}")]
    Store(String),

    /// A draft failed validation; the message is user-facing
    #[error("{0}")]
    Validation(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error was raised by draft validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
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
