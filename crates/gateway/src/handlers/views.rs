//! Article view logging
//!
//! Tracking must never break the page that calls it: once the request is
//! well formed, every failure below is answered with 200 and
//! `success: false`.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::AppJson;
use crate::AppState;
use cybersentry_common::{
    analytics::{ClientContext, ViewOutcome},
    errors::{AppError, Result},
    metrics,
};

#[derive(Debug, Deserialize)]
pub struct LogViewRequest {
    #[serde(default)]
    pub article_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogViewResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Record one view of an article for the calling client
pub async fn log_article_view(
    State(state): State<AppState>,
    client: ClientContext,
    AppJson(request): AppJson<LogViewRequest>,
) -> Result<Json<LogViewResponse>> {
    let article_id = request
        .article_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::missing_fields(["article_id"]))?;

    let response = match state.tracker.track(&article_id, &client).await {
        Ok(ViewOutcome::Recorded) => {
            metrics::record_view("recorded");
            LogViewResponse { success: true, skipped: None, error: None }
        }
        Ok(ViewOutcome::Skipped) => {
            metrics::record_view("skipped");
            LogViewResponse { success: true, skipped: Some(true), error: None }
        }
        Err(e) => {
            metrics::record_view("failed");
            tracing::error!(
                article_id = %article_id,
                error = %e,
                "Failed to store article view"
            );
            LogViewResponse {
                success: false,
                skipped: None,
                error: Some("Failed to log view".to_string()),
            }
        }
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{
        app, app_with, broken_app, location, post_json, send, BrokenStore,
    };
    use axum::{body::Body, http::{Request, StatusCode}};
    use cybersentry_common::{
        analytics::MockLocator, config::AppConfig, media::MockImageStore, LOCALHOST_LOCATION,
        UNKNOWN_LOCATION,
    };
    use serde_json::json;

    fn view_from(address: &str, body: serde_json::Value) -> Request<Body> {
        Request::post("/api/log-article-view")
            .header("content-type", "application/json")
            .header("x-forwarded-for", address)
            .header("user-agent", "Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_view_recorded_with_geo() {
        let app = app();
        let (status, body) = send(&app.router, view_from("203.0.113.7", json!({"article_id": "X"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        let views = app.store.views().await;
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].article_id, "X");
        assert_eq!(views[0].country, location().country);
        assert_eq!(views[0].region, location().region);
        assert_eq!(views[0].city, location().city);
        assert_eq!(views[0].device_type, "desktop");
    }

    #[tokio::test]
    async fn test_repeat_view_is_skipped() {
        let app = app();
        let first = send(&app.router, view_from("203.0.113.7", json!({"article_id": "X"}))).await;
        let second = send(&app.router, view_from("203.0.113.7", json!({"article_id": "X"}))).await;

        assert_eq!(first.1["skipped"], serde_json::Value::Null);
        assert_eq!(second.0, StatusCode::OK);
        assert_eq!(second.1, json!({"success": true, "skipped": true}));
        assert_eq!(app.store.views().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_article_id_rejected_without_write() {
        let app = app();

        for body in [json!({}), json!({"article_id": ""}), json!({"article_id": null})] {
            let (status, response) = send(&app.router, post_json("/api/log-article-view", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["success"], false);
            assert_eq!(response["fields"], json!(["article_id"]));
        }

        let (status, response) = send(
            &app.router,
            Request::post("/api/log-article-view")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["code"], "INVALID_FORMAT");

        assert!(app.store.views().await.is_empty());
        assert_eq!(app.geo.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_client_gets_localhost_sentinels() {
        // No forwarding headers and no peer address in a oneshot request
        let app = app();
        let (status, _) = send(&app.router, post_json("/api/log-article-view", json!({"article_id": "X"}))).await;
        assert_eq!(status, StatusCode::OK);

        let views = app.store.views().await;
        assert_eq!(views[0].country, LOCALHOST_LOCATION);
        assert_eq!(views[0].region, LOCALHOST_LOCATION);
        assert_eq!(views[0].city, LOCALHOST_LOCATION);
        assert_eq!(app.geo.calls(), 0);
    }

    #[tokio::test]
    async fn test_geo_failure_still_records() {
        let app = app_with(AppConfig::default(), MockLocator::failing(), MockImageStore::new());
        let (status, body) = send(&app.router, view_from("198.51.100.4", json!({"article_id": "X"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let views = app.store.views().await;
        assert_eq!(views[0].country, UNKNOWN_LOCATION);
        assert_eq!(views[0].city, UNKNOWN_LOCATION);
    }

    #[tokio::test]
    async fn test_tablet_user_agent() {
        let app = app();
        let request = Request::post("/api/log-article-view")
            .header("content-type", "application/json")
            .header("x-real-ip", "203.0.113.9")
            .header("user-agent", "Mozilla/5.0 (iPad; CPU OS 16_6) Mobile/15E148")
            .body(Body::from(json!({"article_id": "X"}).to_string()))
            .unwrap();

        send(&app.router, request).await;
        assert_eq!(app.store.views().await[0].device_type, "tablet");
    }

    #[tokio::test]
    async fn test_platform_headers_skip_lookup() {
        let app = app();
        let request = Request::post("/api/log-article-view")
            .header("content-type", "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .header("x-vercel-ip-country", "BR")
            .header("x-vercel-ip-country-region", "SP")
            .header("x-vercel-ip-city", "S%C3%A3o%20Paulo")
            .body(Body::from(json!({"article_id": "X"}).to_string()))
            .unwrap();

        send(&app.router, request).await;

        let views = app.store.views().await;
        assert_eq!(views[0].country, "BR");
        assert_eq!(views[0].region, "SP");
        assert_eq!(views[0].city, "São Paulo");
        assert_eq!(app.geo.calls(), 0);
    }

    #[tokio::test]
    async fn test_raw_address_never_stored() {
        let app = app();
        send(&app.router, view_from("203.0.113.7", json!({"article_id": "X"}))).await;

        let views = app.store.views().await;
        assert_ne!(views[0].client_identity, "203.0.113.7");
        assert_eq!(views[0].client_identity.len(), 64);
    }

    #[tokio::test]
    async fn test_storage_failure_is_soft() {
        let router = broken_app(BrokenStore::failing());
        let (status, body) = send(&router, view_from("203.0.113.7", json!({"article_id": "X"}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": false, "error": "Failed to log view"}));
        assert!(body.get("skipped").is_none());
    }

    #[tokio::test]
    async fn test_missing_article_id_checked_before_storage() {
        let router = broken_app(BrokenStore::failing());
        let (status, body) = send(&router, post_json("/api/log-article-view", json!({}))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"], json!(["article_id"]));
    }
}
