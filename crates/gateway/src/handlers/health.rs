//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub store: CheckResult,
    pub object_storage: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness check; healthy whenever the server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: cybersentry_common::VERSION.to_string(),
    })
}

/// Readiness check; the content store must answer.
///
/// Object storage is reported but optional; publishing degrades to
/// articles without images when it is missing.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let start = std::time::Instant::now();

    let store_check = match state.store.ping().await {
        Ok(_) => CheckResult {
            status: "up".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let object_storage = CheckResult {
        status: if state.images.is_enabled() { "configured" } else { "disabled" }.to_string(),
        latency_ms: None,
        error: None,
    };

    let ready = store_check.status == "up";
    let code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        code,
        Json(ReadyResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks {
                store: store_check,
                object_storage,
            },
        }),
    )
}
