//! In-process processing queue
//!
//! One idempotent job per paper: a bounded channel plus a pending set
//! keyed by paper id. An id that is already queued or in flight is not
//! enqueued again; the key is released only after its run completes, so
//! at most one run per paper is ever in flight.

use crate::errors::ExtractionError;
use crate::processor::Processor;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

pub struct ProcessingQueue {
    tx: Mutex<Option<mpsc::Sender<Uuid>>>,
    pending: Arc<Mutex<HashSet<Uuid>>>,
    worker: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ProcessingQueue {
    /// Start the queue with a single worker task
    pub fn new(processor: Arc<Processor>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Uuid>(capacity.max(1));
        let pending: Arc<Mutex<HashSet<Uuid>>> = Arc::default();

        let worker_pending = Arc::clone(&pending);
        let worker = tokio::spawn(async move {
            while let Some(paper_id) = rx.recv().await {
                match processor.process(paper_id).await {
                    Ok(true) => debug!(paper_id = %paper_id, "Paper processed"),
                    Ok(false) => {
                        debug!(paper_id = %paper_id, "Paper processed with recorded error")
                    }
                    Err(e) => error!(paper_id = %paper_id, error = %e, "Processing job failed"),
                }
                if let Ok(mut pending) = worker_pending.lock() {
                    pending.remove(&paper_id);
                }
            }
        });

        Self {
            tx: Mutex::new(Some(tx)),
            pending,
            worker: tokio::sync::Mutex::new(Some(worker)),
        }
    }

    /// Enqueue a processing job for a paper. Returns false when the paper
    /// is already queued or in flight.
    pub async fn enqueue(&self, paper_id: Uuid) -> Result<bool, ExtractionError> {
        let tx = self
            .tx
            .lock()
            .map_err(|_| ExtractionError::Queue("queue state poisoned".to_string()))?
            .clone()
            .ok_or_else(|| ExtractionError::Queue("queue is shut down".to_string()))?;

        {
            let mut pending = self
                .pending
                .lock()
                .map_err(|_| ExtractionError::Queue("pending set poisoned".to_string()))?;
            if !pending.insert(paper_id) {
                debug!(paper_id = %paper_id, "Duplicate processing job suppressed");
                return Ok(false);
            }
        }

        if let Err(e) = tx.send(paper_id).await {
            if let Ok(mut pending) = self.pending.lock() {
                pending.remove(&paper_id);
            }
            return Err(ExtractionError::Queue(format!("enqueue failed: {}", e)));
        }

        Ok(true)
    }

    /// Number of jobs queued or in flight
    pub fn pending_len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Close the queue and wait for the worker to drain
    pub async fn shutdown(&self) {
        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }

        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Queue worker terminated abnormally");
            }
        }

        info!("Processing queue shut down");
    }
}
