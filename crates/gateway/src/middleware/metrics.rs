//! Per-request metrics

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use cybersentry_common::metrics::RequestMetrics;

/// Record count and latency per matched route
pub async fn track_metrics(request: Request, next: Next) -> Response {
    // Label by route template so ids do not explode cardinality
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let metrics = RequestMetrics::start(request.method().as_str(), &endpoint);
    let response = next.run(request).await;
    metrics.finish(response.status().as_u16());

    response
}
