//! Extraction service error types
//!
//! Display strings double as the persisted `processing_error` text, so
//! they are written for administrators reviewing failed papers.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("File is not a PDF: {0}")]
    InvalidFileType(String),

    #[error("PDF has no pages")]
    EmptyDocument,

    #[error("No text extracted from PDF")]
    NoTextExtracted,

    #[error("PDF parse error for {name}: {message}")]
    PdfParse { name: String, message: String },

    #[error("Question paper not found: {0}")]
    PaperNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<questforge_common::errors::AppError> for ExtractionError {
    fn from(e: questforge_common::errors::AppError) -> Self {
        ExtractionError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_error_messages() {
        assert_eq!(ExtractionError::EmptyDocument.to_string(), "PDF has no pages");
        assert_eq!(
            ExtractionError::NoTextExtracted.to_string(),
            "No text extracted from PDF"
        );
    }

    #[test]
    fn test_app_error_conversion() {
        let app = questforge_common::errors::AppError::Internal {
            message: "pool exhausted".into(),
        };
        let err = ExtractionError::from(app);
        assert!(matches!(err, ExtractionError::Database(_)));
    }
}
