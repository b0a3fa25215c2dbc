//! Metrics and observability utilities
//!
//! Provides Prometheus metric descriptions and recording helpers
//! with standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all CyberSentry metrics
pub const METRICS_PREFIX: &str = "cybersentry";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    3.000,  // 3s - geo lookup ceiling
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // View analytics
    describe_counter!(
        format!("{}_article_views_total", METRICS_PREFIX),
        Unit::Count,
        "Article view log attempts by outcome"
    );

    describe_counter!(
        format!("{}_geo_lookups_total", METRICS_PREFIX),
        Unit::Count,
        "Geo enrichment attempts by source and outcome"
    );

    describe_histogram!(
        format!("{}_geo_lookup_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Outbound geo lookup latency in seconds"
    );

    // Content writes
    describe_counter!(
        format!("{}_articles_published_total", METRICS_PREFIX),
        Unit::Count,
        "Total news articles published"
    );

    describe_counter!(
        format!("{}_image_uploads_total", METRICS_PREFIX),
        Unit::Count,
        "Article image uploads by outcome"
    );

    describe_counter!(
        format!("{}_contact_messages_total", METRICS_PREFIX),
        Unit::Count,
        "Total contact messages stored"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Helper to record a view log outcome (recorded, skipped, failed)
pub fn record_view(outcome: &str) {
    counter!(
        format!("{}_article_views_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Helper to record geo enrichment
pub fn record_geo_lookup(source: &str, success: bool, duration_secs: Option<f64>) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_geo_lookups_total", METRICS_PREFIX),
        "source" => source.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if let Some(duration) = duration_secs {
        histogram!(
            format!("{}_geo_lookup_duration_seconds", METRICS_PREFIX),
            "source" => source.to_string()
        )
        .record(duration);
    }
}

/// Helper to record a published article
pub fn record_publish(with_image: bool) {
    counter!(
        format!("{}_articles_published_total", METRICS_PREFIX),
        "image" => with_image.to_string()
    )
    .increment(1);
}

/// Helper to record an image upload attempt
pub fn record_image_upload(success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_image_uploads_total", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Helper to record a stored contact message
pub fn record_contact_message() {
    counter!(format!("{}_contact_messages_total", METRICS_PREFIX)).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        // The geo lookup timeout should land on a bucket edge
        assert!(LATENCY_BUCKETS.contains(&3.0));
    }

    #[test]
    fn test_recorders_without_exporter() {
        let metrics = RequestMetrics::start("POST", "/api/log-article-view");
        metrics.finish(200);
        record_view("recorded");
        record_geo_lookup("ipapi", false, Some(0.2));
        record_publish(false);
        record_image_upload(true);
        record_contact_message();
    }

    #[test]
    fn test_publish_counter_has_bounded_labels() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_publish(true);
            record_publish(true);
            record_publish(false);
        });

        let rendered = handle.render();
        assert!(rendered.contains("cybersentry_articles_published_total{image=\"true\"} 2"));
        assert!(rendered.contains("cybersentry_articles_published_total{image=\"false\"} 1"));
        assert!(!rendered.contains("category"));
    }
}
