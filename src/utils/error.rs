//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions.

use lintview_core::CoreError;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The analyzer process could not be launched
    #[error("Process failed to start: {0}")]
    StartFailure(String),

    /// The analyzer exited having written only to stderr
    #[error("Process produced only error output: {0}")]
    RunFailure(String),

    /// Nothing cached for the requested target
    #[error("No prior result available for target: {0}")]
    NoResult(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors from the diagnostics layer
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a start failure
    pub fn start_failure(msg: impl Into<String>) -> Self {
        Self::StartFailure(msg.into())
    }

    /// Create a run failure carrying the analyzer's error output
    pub fn run_failure(stderr: impl Into<String>) -> Self {
        Self::RunFailure(stderr.into())
    }

    /// Create a missing-result error
    pub fn no_result(target: impl Into<String>) -> Self {
        Self::NoResult(target.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert AppError to a string for display by the host
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
