//! API handlers module

pub mod cases;
pub mod contact;
pub mod health;
pub mod news;
pub mod views;

use axum::{
    extract::{FromRequest, FromRequestParts},
    BoxError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cybersentry_common::errors::{AppError, Result};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::any::Any;
use validator::ValidationErrors;

/// JSON body extractor whose rejections use the API error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string extractor whose rejections use the API error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `?limit=N` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
}

/// Treat an explicit `null` the same as a missing field
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fail with every blank field, in the order given
pub(crate) fn require_fields(fields: &[(&'static str, &str)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::missing_fields(missing))
    }
}

/// Trimmed optional text, `None` when blank
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn validation_error(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|name| name.to_string())
        .collect();
    fields.sort();

    AppError::Validation {
        message: errors.to_string(),
        field: fields.into_iter().next(),
    }
}

/// Body for requests that panicked inside a handler
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "error": "Internal Server Error" })),
    )
        .into_response()
}

/// Errors surfaced by fallible tower layers
pub async fn layer_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout
    } else {
        AppError::ServiceUnavailable {
            message: err.to_string(),
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> AppError {
    AppError::NotFound {
        resource_type: "route".to_string(),
        id: "unknown".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{create_router, AppState};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use async_trait::async_trait;
    use cybersentry_common::{
        analytics::{GeoLocation, IdentityHasher, MockLocator, ViewTracker},
        config::AppConfig,
        db::models::*,
        errors::{AppError, Result},
        media::MockImageStore,
        ContentStore, MemoryStore,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    pub struct TestApp {
        pub router: Router,
        pub store: MemoryStore,
        pub geo: Arc<MockLocator>,
        pub images: Arc<MockImageStore>,
    }

    pub fn location() -> GeoLocation {
        GeoLocation::from_parts(Some("IN".into()), Some("MH".into()), Some("Mumbai".into()))
    }

    /// Router over fresh in-memory state, rate limiting off
    pub fn app() -> TestApp {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        app_with(config, MockLocator::resolving(location()), MockImageStore::new())
    }

    pub fn app_with(config: AppConfig, geo: MockLocator, images: MockImageStore) -> TestApp {
        let store = MemoryStore::new();
        let geo = Arc::new(geo);
        let images = Arc::new(images);
        let router = router_over(config, Arc::new(store.clone()), geo.clone(), images.clone());

        TestApp { router, store, geo, images }
    }

    /// Default router over a store that never succeeds
    pub fn broken_app(store: BrokenStore) -> Router {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        router_over(
            config,
            Arc::new(store),
            Arc::new(MockLocator::resolving(location())),
            Arc::new(MockImageStore::new()),
        )
    }

    fn router_over(
        config: AppConfig,
        store: Arc<dyn ContentStore>,
        geo: Arc<MockLocator>,
        images: Arc<MockImageStore>,
    ) -> Router {
        let tracker = ViewTracker::new(
            store.clone(),
            geo,
            IdentityHasher::new("test-salt"),
            config.geo.trust_platform_headers,
        );

        create_router(AppState {
            config: Arc::new(config),
            store,
            tracker,
            images,
        })
    }

    /// Store whose every call errors, or panics
    pub struct BrokenStore {
        panics: bool,
    }

    impl BrokenStore {
        pub fn failing() -> Self {
            Self { panics: false }
        }

        pub fn panicking() -> Self {
            Self { panics: true }
        }

        fn fail<T>(&self) -> Result<T> {
            if self.panics {
                panic!("store invariant broken");
            }
            Err(AppError::DatabaseConnection {
                message: "connection refused".to_string(),
            })
        }
    }

    #[async_trait]
    impl ContentStore for BrokenStore {
        async fn ping(&self) -> Result<()> {
            self.fail()
        }

        async fn record_view(&self, _view: NewArticleView) -> Result<ViewWrite> {
            self.fail()
        }

        async fn create_article(&self, _article: NewArticle) -> Result<NewsArticle> {
            self.fail()
        }

        async fn list_published_articles(&self, _limit: u64) -> Result<Vec<NewsArticle>> {
            self.fail()
        }

        async fn find_published_article(&self, _id: Uuid) -> Result<Option<NewsArticle>> {
            self.fail()
        }

        async fn list_public_reports(&self, _limit: u64) -> Result<Vec<FraudReport>> {
            self.fail()
        }

        async fn find_public_report(&self, _id: Uuid) -> Result<Option<FraudReport>> {
            self.fail()
        }

        async fn create_contact_message(&self, _message: NewContactMessage) -> Result<ContactMessage> {
            self.fail()
        }
    }

    pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }
}
