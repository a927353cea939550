//! Metrics and observability utilities
//!
//! Provides Prometheus metrics for the extraction pipeline
//! with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all QuestForge metrics
pub const METRICS_PREFIX: &str = "questforge";

/// Histogram buckets for pipeline latency (in seconds).
/// A single paper is parsed, scanned and persisted; runs past a
/// minute indicate a pathological document.
pub const PROCESSING_BUCKETS: &[f64] = &[
    0.010, // 10ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
    5.000, // 5s
    10.00, // 10s
    30.00, // 30s
    60.00, // 60s
];

/// Buckets for the extraction confidence ratio
pub const CONFIDENCE_BUCKETS: &[f64] = &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_papers_processed_total", METRICS_PREFIX),
        Unit::Count,
        "Total question papers run through the extraction pipeline"
    );

    describe_histogram!(
        format!("{}_processing_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "End-to-end pipeline latency per paper in seconds"
    );

    describe_histogram!(
        format!("{}_extraction_confidence", METRICS_PREFIX),
        Unit::Count,
        "Extraction confidence score per successfully processed paper"
    );

    describe_counter!(
        format!("{}_topics_detected_total", METRICS_PREFIX),
        Unit::Count,
        "Total topics detected across all papers"
    );

    describe_counter!(
        format!("{}_pattern_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Total configured patterns that failed to compile or match"
    );

    tracing::info!("Metrics registered");
}

/// Record the outcome of one pipeline run
pub fn record_processing(duration_secs: f64, confidence: f64, success: bool) {
    let outcome = if success { "ok" } else { "error" };

    counter!(
        format!("{}_papers_processed_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(format!("{}_processing_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    if success {
        histogram!(format!("{}_extraction_confidence", METRICS_PREFIX)).record(confidence);
    }
}

/// Record topics detected in one pipeline run
pub fn record_topics(count: usize) {
    counter!(format!("{}_topics_detected_total", METRICS_PREFIX)).increment(count as u64);
}

/// Record configured-pattern failures in one pipeline run
pub fn record_pattern_failures(count: usize) {
    if count > 0 {
        counter!(format!("{}_pattern_failures_total", METRICS_PREFIX)).increment(count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in PROCESSING_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_confidence_buckets_cover_unit_interval() {
        assert_eq!(*CONFIDENCE_BUCKETS.last().unwrap(), 1.0);
        assert!(CONFIDENCE_BUCKETS.iter().all(|&b| b > 0.0 && b <= 1.0));
    }

    #[test]
    fn test_record_helpers_run() {
        record_processing(0.05, 0.8, true);
        record_processing(0.05, 0.0, false);
        record_topics(3);
        record_pattern_failures(0);
        // Just verify they run without panic
    }
}
