//! Error types for QuestForge services
//!
//! Provides:
//! - Distinct error types for different failure modes
//! - A `Result` alias used throughout the workspace
//! - Conversions from the library errors we sit on top of

use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid extraction pattern {name}: {message}")]
    InvalidPattern { name: String, message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Question paper not found: {id}")]
    PaperNotFound { id: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Build a validation error for a single field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    /// Check whether this error means "the row does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. } | AppError::PaperNotFound { .. }
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = AppError::PaperNotFound { id: "test".into() };
        assert!(err.is_not_found());

        let err = AppError::Internal {
            message: "boom".into(),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_validation_display() {
        let err = AppError::validation("file", "Only PDF files are allowed");
        assert_eq!(
            err.to_string(),
            "Validation failed: Only PDF files are allowed"
        );
    }

    #[test]
    fn test_invalid_pattern_display() {
        let err = AppError::InvalidPattern {
            name: "subject-header".into(),
            message: "unclosed group".into(),
        };
        assert!(err.to_string().contains("subject-header"));
    }
}
