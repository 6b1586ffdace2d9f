use std::io;
use thiserror::Error;

/// Crate-wide error type, consolidating all possible errors into a single enum.
///
/// None of these escape the question-processing path: the processor recovers
/// from each of them and answers with a safe default response.
#[derive(Debug, Error)]
pub enum AppError {
    /// The intent source (or a config file) is missing or cannot be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No question text was supplied.
    #[error("Empty input")]
    EmptyInput,

    /// The optional semantic-similarity backend could not be initialised or failed.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Represents standard input/output errors.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Represents data validation errors (e.g., an intent record without responses).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Represents unexpected internal errors that indicate a bug.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::Config(s) => AppError::Config(s.clone()),
            AppError::EmptyInput => AppError::EmptyInput,
            AppError::ResourceUnavailable(s) => AppError::ResourceUnavailable(s.clone()),
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Validation(s) => AppError::Validation(s.clone()),
            AppError::Internal(s) => AppError::Internal(s.clone()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation errors: {}", err))
    }
}
