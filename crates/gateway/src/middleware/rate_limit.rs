//! Rate limiting middleware using token bucket algorithm

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use cybersentry_common::{analytics::ClientContext, config::RateLimitConfig, errors::AppError};
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Client buckets kept before idle ones are pruned
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Rate limiter keyed by client address
pub type ClientRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Shared limiter plus the configured rate for error reporting
#[derive(Clone)]
pub struct RateLimitState {
    limiter: Arc<ClientRateLimiter>,
    requests_per_second: u32,
}

impl RateLimitState {
    /// Create a new rate limiter; zero values are raised to one
    pub fn new(requests_per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(rate);
        let quota = Quota::per_second(rate).allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            requests_per_second: rate.get(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_second, config.burst)
    }

    fn check(&self, client: &str) -> bool {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }
        self.limiter.check_key(&client.to_string()).is_ok()
    }
}

/// Rate limiting middleware, one bucket per client address
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    client: ClientContext,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.check(&client.address) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(
        path = %request.uri().path(),
        client = %client.address,
        "Rate limit exceeded"
    );
    Err(AppError::RateLimited {
        limit: state.requests_per_second,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::post, Router};
    use tower::ServiceExt;

    #[test]
    fn test_rate_limiter_creation() {
        let state = RateLimitState::new(100, 200);
        assert!(state.check("203.0.113.7"));

        let zero = RateLimitState::new(0, 0);
        assert_eq!(zero.requests_per_second, 1);
    }

    #[test]
    fn test_clients_have_separate_buckets() {
        let state = RateLimitState::new(1, 1);
        assert!(state.check("203.0.113.7"));
        assert!(!state.check("203.0.113.7"));
        assert!(state.check("198.51.100.1"));
    }

    async fn statuses(app: &Router, client: &str, count: usize) -> Vec<StatusCode> {
        let mut statuses = Vec::new();
        for _ in 0..count {
            let response = app
                .clone()
                .oneshot(
                    axum::http::Request::post("/write")
                        .header("x-forwarded-for", client)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            statuses.push(response.status());
        }
        statuses
    }

    #[tokio::test]
    async fn test_burst_exhaustion_returns_429() {
        let app = Router::new()
            .route("/write", post(|| async { "ok" }))
            .route_layer(from_fn_with_state(RateLimitState::new(1, 2), rate_limit_middleware));

        assert_eq!(
            statuses(&app, "203.0.113.7", 3).await,
            vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );

        // Another client still has its full burst
        assert_eq!(
            statuses(&app, "198.51.100.1", 1).await,
            vec![StatusCode::OK]
        );
    }
}
