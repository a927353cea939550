//! Processing orchestrator
//!
//! Runs the full pipeline for one paper and always leaves the record in a
//! terminal processed state: failures become persisted `processing_error`
//! text instead of escaping to the caller.

use crate::engine::extract_fields;
use crate::errors::ExtractionError;
use crate::pdf::extract_text;
use crate::questions::count_questions;
use crate::resolver::resolve_references;
use crate::topics::detect_topics;
use questforge_common::db::models::{DetectedFields, FieldKind, QuestionPaper};
use questforge_common::db::Store;
use questforge_common::metrics::{record_pattern_failures, record_processing, record_topics};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Orchestrates extraction for question papers
pub struct Processor {
    store: Arc<dyn Store>,
    storage_root: PathBuf,
}

impl Processor {
    pub fn new(store: Arc<dyn Store>, storage_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            storage_root: storage_root.into(),
        }
    }

    /// Run the pipeline for a paper. `Ok(true)` means the run completed
    /// cleanly; `Ok(false)` means it terminated in a recorded error state.
    /// `Err` is returned only when the terminal state itself could not be
    /// persisted, or the paper does not exist.
    #[instrument(skip(self))]
    pub async fn process(&self, paper_id: Uuid) -> Result<bool, ExtractionError> {
        let mut paper = self
            .store
            .find_paper(paper_id)
            .await?
            .ok_or(ExtractionError::PaperNotFound(paper_id))?;

        self.run(&mut paper).await
    }

    /// Reset a paper's extraction state and run the pipeline again,
    /// synchronously
    #[instrument(skip(self))]
    pub async fn reprocess(&self, paper_id: Uuid) -> Result<bool, ExtractionError> {
        let mut paper = self
            .store
            .find_paper(paper_id)
            .await?
            .ok_or(ExtractionError::PaperNotFound(paper_id))?;

        paper.is_processed = false;
        paper.processing_error = None;
        paper.extraction_confidence = 0.0;
        paper.detected_fields = DetectedFields::default();
        self.store.save_paper(&paper).await?;

        self.run(&mut paper).await
    }

    async fn run(&self, paper: &mut QuestionPaper) -> Result<bool, ExtractionError> {
        let started = Instant::now();
        info!(file = %paper.file_name(), "Starting processing");

        match self.pipeline(paper).await {
            Ok(()) => {
                record_processing(
                    started.elapsed().as_secs_f64(),
                    paper.extraction_confidence,
                    true,
                );
                info!(
                    file = %paper.file_name(),
                    confidence = paper.extraction_confidence,
                    questions = paper.question_count,
                    "Processing complete"
                );
                Ok(true)
            }
            Err(e) => {
                warn!(file = %paper.file_name(), error = %e, "Processing failed");
                paper.is_processed = true;
                paper.processing_error = Some(e.to_string());
                self.store.save_paper(paper).await?;
                record_processing(started.elapsed().as_secs_f64(), 0.0, false);
                Ok(false)
            }
        }
    }

    async fn pipeline(&self, paper: &mut QuestionPaper) -> Result<(), ExtractionError> {
        let text = extract_text(&self.resolve_path(paper))?;
        paper.extracted_text = Some(text.clone());

        let patterns = self.store.active_patterns().await?;
        let extraction = extract_fields(&text, &patterns);
        record_pattern_failures(extraction.failures.len());

        let topics = detect_topics(self.store.as_ref(), &text).await;
        record_topics(topics.len());

        let mut fields = extraction.fields;
        if !fields.contains(FieldKind::QuestionCount) {
            let count = count_questions(&text);
            if count > 0 {
                fields.set(FieldKind::QuestionCount, count.to_string());
                paper.question_count = count as i32;
            }
        } else if let Some(declared) = fields.get(FieldKind::QuestionCount) {
            // a malformed declared count is ignored, not fatal
            if let Ok(count) = declared.parse::<i32>() {
                paper.question_count = count;
            }
        }

        resolve_references(self.store.as_ref(), paper, &fields).await;

        paper.detected_fields = fields;
        paper.extraction_confidence = extraction.confidence;
        paper.is_processed = true;
        paper.processing_error = None;
        self.store.save_paper(paper).await?;

        if !topics.is_empty() {
            let topic_ids: Vec<Uuid> = topics.iter().map(|t| t.id).collect();
            self.store.attach_topics(paper.id, &topic_ids).await?;
        }

        Ok(())
    }

    fn resolve_path(&self, paper: &QuestionPaper) -> PathBuf {
        let path = Path::new(&paper.file_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.storage_root.join(path)
        }
    }
}
