//! QuestForge Extraction Worker
//!
//! Processes uploaded question papers off the request path:
//! 1. Sweeps unprocessed papers at startup
//! 2. Runs the extraction pipeline, one idempotent job per paper
//! 3. Persists detected metadata, confidence and topics

use metrics_exporter_prometheus::PrometheusBuilder;
use questforge_common::{config::AppConfig, db::DbPool, db::Repository, VERSION};
use questforge_extraction::processor::Processor;
use questforge_extraction::queue::ProcessingQueue;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .json()
        .init();

    info!("Starting QuestForge extraction worker v{}", VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    // Expose Prometheus metrics
    if config.observability.metrics_port != 0 {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new().with_http_listener(addr).install()?;
        questforge_common::metrics::register_metrics();
    }

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    let repository = Repository::new(db);

    let processor = Arc::new(Processor::new(
        Arc::new(repository.clone()),
        config.storage.root.clone(),
    ));
    let queue = ProcessingQueue::new(processor, config.worker.queue_capacity);

    // Redundant trigger path: anything uploaded while the worker was down.
    // The queue's pending set keeps this idempotent against live uploads.
    let backlog = repository.unprocessed_papers().await?;
    if !backlog.is_empty() {
        info!(count = backlog.len(), "Queueing unprocessed papers");
        for paper_id in backlog {
            queue.enqueue(paper_id).await?;
        }
    }

    info!("Extraction worker ready");

    tokio::signal::ctrl_c().await?;

    info!("Extraction worker shutting down");
    queue.shutdown().await;

    Ok(())
}
