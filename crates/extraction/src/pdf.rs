//! PDF text extraction module
//!
//! Converts an uploaded PDF into normalized, page-delimited plain text
//! using lopdf.

use crate::errors::ExtractionError;
use lopdf::Document;
use regex_lite::Regex;
use std::path::Path;
use tracing::{debug, warn};

/// Extract normalized text from a PDF file on disk
pub fn extract_text(path: &Path) -> Result<String, ExtractionError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    require_pdf_extension(&name)?;

    let doc = Document::load(path).map_err(|e| ExtractionError::PdfParse {
        name: name.clone(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    extract_document(&name, &doc)
}

/// Extract normalized text from in-memory PDF bytes
pub fn extract_text_from_bytes(name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
    require_pdf_extension(name)?;

    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::PdfParse {
        name: name.to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    extract_document(name, &doc)
}

fn require_pdf_extension(name: &str) -> Result<(), ExtractionError> {
    if name.to_lowercase().ends_with(".pdf") {
        Ok(())
    } else {
        Err(ExtractionError::InvalidFileType(name.to_string()))
    }
}

fn extract_document(name: &str, doc: &Document) -> Result<String, ExtractionError> {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }

    debug!(page_count = pages.len(), "Extracting text from PDF");

    let mut text = String::new();
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => {
                let cleaned = normalize_page_text(&page_text);
                if cleaned.is_empty() {
                    continue;
                }
                text.push_str(&format!("--- Page {} ---\n{}\n\n", page_num, cleaned));
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "Failed to extract text from page, skipping");
            }
        }
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractionError::NoTextExtracted);
    }

    debug!(name, len = text.len(), "Text extraction complete");
    Ok(text)
}

/// Collapse whitespace runs and rejoin words broken across line wraps
fn normalize_page_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    match Regex::new(r"(\w+)-\s+(\w+)") {
        Ok(re) => re.replace_all(&collapsed, "${1}${2}").into_owned(),
        Err(_) => collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{empty_pdf_bytes, pdf_bytes};

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(
            normalize_page_text("Answer   all \n\n questions\tbelow"),
            "Answer all questions below"
        );
    }

    #[test]
    fn test_normalize_repairs_hyphen_breaks() {
        assert_eq!(normalize_page_text("photo- \n synthesis"), "photosynthesis");
        // a hyphen glued to both words is a real compound, not a line break
        assert_eq!(normalize_page_text("well-known fact"), "well-known fact");
    }

    #[test]
    fn test_rejects_non_pdf_extension() {
        let err = extract_text_from_bytes("notes.txt", b"whatever").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidFileType(_)));
    }

    #[test]
    fn test_rejects_unparsable_bytes() {
        let err = extract_text_from_bytes("paper.pdf", b"not a pdf at all").unwrap_err();
        assert!(matches!(err, ExtractionError::PdfParse { .. }));
    }

    #[test]
    fn test_zero_page_document() {
        let err = extract_text_from_bytes("paper.pdf", &empty_pdf_bytes()).unwrap_err();
        assert!(matches!(err, ExtractionError::EmptyDocument));
        assert_eq!(err.to_string(), "PDF has no pages");
    }

    #[test]
    fn test_single_page_extraction() {
        let bytes = pdf_bytes(&["Question 1. Define momentum."]);
        let text = extract_text_from_bytes("paper.pdf", &bytes).unwrap();

        assert!(text.starts_with("--- Page 1 ---"));
        assert!(text.contains("Question 1. Define momentum."));
    }

    #[test]
    fn test_multi_page_markers() {
        let bytes = pdf_bytes(&["Section A: Mechanics", "Section B: Optics"]);
        let text = extract_text_from_bytes("paper.pdf", &bytes).unwrap();

        assert!(text.contains("--- Page 1 ---"));
        assert!(text.contains("--- Page 2 ---"));
        assert!(text.contains("Mechanics"));
        assert!(text.contains("Optics"));
        // trailing page separator is trimmed off
        assert!(!text.ends_with('\n'));
    }
}
