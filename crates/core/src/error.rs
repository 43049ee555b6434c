//! Error types for the Knowledge Hub.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! language model, vector index, dataset, and prompt failures.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the Knowledge Hub.
///
/// All fallible functions return `Result<T, AppError>`.
/// A workflow run that hits any of these aborts; nothing is retried locally.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The vector index is missing, unreadable, or incompatible
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Transport or authentication failure talking to the language model
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The language model answered, but not in the expected structured shape
    #[error("Malformed model output: {0}")]
    ModelMalformedOutput(String),

    /// Index build input does not exist
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    /// Index build input has zero rows
    #[error("Dataset has no rows: {}", .0.display())]
    EmptyDataset(PathBuf),

    /// Index build input could not be parsed
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    /// Knowledge base errors not covered above (embedding, storage)
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
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
    /// Whether the error came from the language model boundary.
    pub fn is_model_failure(&self) -> bool {
        matches!(
            self,
            AppError::ModelUnavailable(_) | AppError::ModelMalformedOutput(_)
        )
    }

    /// Whether the error came from the vector index boundary.
    pub fn is_index_failure(&self) -> bool {
        matches!(self, AppError::IndexUnavailable(_))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(AppError::ModelUnavailable("down".to_string()).is_model_failure());
        assert!(AppError::ModelMalformedOutput("bad".to_string()).is_model_failure());
        assert!(!AppError::IndexUnavailable("missing".to_string()).is_model_failure());
        assert!(AppError::IndexUnavailable("missing".to_string()).is_index_failure());
    }

    #[test]
    fn test_dataset_error_messages() {
        let err = AppError::DatasetNotFound(PathBuf::from("data/rag_dataset.csv"));
        assert_eq!(err.to_string(), "Dataset not found: data/rag_dataset.csv");

        let err = AppError::EmptyDataset(PathBuf::from("empty.csv"));
        assert!(err.to_string().contains("no rows"));
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
