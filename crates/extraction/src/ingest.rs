//! Paper ingestion service
//!
//! Creates the paper record and hands it to the processing queue. Upload
//! plumbing (HTTP, forms, storage of the file itself) lives outside this
//! crate; by the time `upload` is called the file is already on disk.

use crate::errors::ExtractionError;
use crate::queue::ProcessingQueue;
use questforge_common::db::models::QuestionPaper;
use questforge_common::db::{NewPaper, Repository};
use std::sync::Arc;
use tracing::info;

pub struct IngestService {
    repository: Repository,
    queue: Arc<ProcessingQueue>,
}

impl IngestService {
    pub fn new(repository: Repository, queue: Arc<ProcessingQueue>) -> Self {
        Self { repository, queue }
    }

    /// Create the paper record and schedule exactly one processing job for
    /// it, decoupled from the caller.
    pub async fn upload(&self, input: NewPaper) -> Result<QuestionPaper, ExtractionError> {
        let paper = self.repository.create_paper(input).await?;
        self.queue.enqueue(paper.id).await?;

        info!(paper_id = %paper.id, file = %paper.file_name(), "Paper uploaded and queued");
        Ok(paper)
    }
}
