//! Application error types for core domain logic.
use thiserror::Error;

/// Top-level domain error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found")]
    NotFound,

    #[error("Missing team scope")]
    MissingTeam,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Shorthand for a [`AppError::Validation`] with a displayable message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
