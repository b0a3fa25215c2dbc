//! Geo enrichment for article views
//!
//! Provides:
//! - The `GeoLocator` abstraction over IP geolocation services
//! - An ipapi-compatible HTTP client with a bounded timeout
//! - Location parsing from proxy-injected platform headers

use crate::errors::{AppError, Result};
use crate::{LOCALHOST_LOCATION, UNKNOWN_LOCATION};
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Best-effort location of a client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub country: String,
    pub region: String,
    pub city: String,
}

impl GeoLocation {
    /// All fields set to `Unknown`
    pub fn unknown() -> Self {
        Self {
            country: UNKNOWN_LOCATION.to_string(),
            region: UNKNOWN_LOCATION.to_string(),
            city: UNKNOWN_LOCATION.to_string(),
        }
    }

    /// All fields set to `Localhost`
    pub fn localhost() -> Self {
        Self {
            country: LOCALHOST_LOCATION.to_string(),
            region: LOCALHOST_LOCATION.to_string(),
            city: LOCALHOST_LOCATION.to_string(),
        }
    }

    /// Build from optional parts, each missing or blank part becomes `Unknown`
    pub fn from_parts(
        country: Option<String>,
        region: Option<String>,
        city: Option<String>,
    ) -> Self {
        let or_unknown = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
        };

        Self {
            country: or_unknown(country),
            region: or_unknown(region),
            city: or_unknown(city),
        }
    }

    /// Location from proxy headers, if the platform supplied a country
    pub fn from_platform_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        if let Some(country) = header("x-vercel-ip-country") {
            let city = header("x-vercel-ip-city").map(|raw| percent_decode(&raw));
            return Some(Self::from_parts(
                Some(country),
                header("x-vercel-ip-country-region"),
                city,
            ));
        }

        // Cloudflare reports XX when it has no answer
        header("cf-ipcountry")
            .filter(|c| !c.eq_ignore_ascii_case("xx"))
            .map(|country| Self::from_parts(Some(country), None, None))
    }
}

fn percent_decode(raw: &str) -> String {
    url::form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_else(|| raw.to_string())
}

/// Whether an address must skip geo lookup and be tagged `Localhost`
pub fn is_local_address(address: &str) -> bool {
    if address.eq_ignore_ascii_case(super::client::UNKNOWN_ADDRESS) {
        return true;
    }

    match address.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_loopback(),
        Ok(IpAddr::V6(v6)) => {
            v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
        }
        Err(_) => false,
    }
}

/// Trait for IP geolocation
#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Resolve an address to a location
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation>;

    /// Name used in logs and metrics
    fn provider(&self) -> &str;

    /// Whether lookups should be attempted at all
    fn is_enabled(&self) -> bool {
        true
    }
}

/// ipapi.co compatible lookup client
pub struct IpApiLocator {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct IpApiResponse {
    country_code: Option<String>,
    region_code: Option<String>,
    city: Option<String>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

impl IpApiLocator {
    /// Create a new locator; every lookup is bounded by `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create geo HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    async fn locate(&self, ip: IpAddr) -> Result<GeoLocation> {
        let url = format!("{}/{}/json/", self.base_url, ip);

        let response = self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::GeoLookup {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AppError::GeoLookup {
                message: format!("Lookup service returned {}", response.status()),
            });
        }

        let body: IpApiResponse = response.json().await.map_err(|e| AppError::GeoLookup {
            message: format!("Failed to parse response: {}", e),
        })?;

        if body.error {
            return Err(AppError::GeoLookup {
                message: body.reason.unwrap_or_else(|| "service reported an error".to_string()),
            });
        }

        Ok(GeoLocation::from_parts(body.country_code, body.region_code, body.city))
    }

    fn provider(&self) -> &str {
        "ipapi"
    }
}

/// Locator used when lookups are switched off
pub struct DisabledLocator;

#[async_trait]
impl GeoLocator for DisabledLocator {
    async fn locate(&self, _ip: IpAddr) -> Result<GeoLocation> {
        Err(AppError::ServiceUnavailable {
            message: "geo lookup disabled".to_string(),
        })
    }

    fn provider(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Mock locator for testing
pub struct MockLocator {
    result: Option<GeoLocation>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockLocator {
    /// Always answers with `location`
    pub fn resolving(location: GeoLocation) -> Self {
        Self { result: Some(location), delay: None, calls: AtomicUsize::new(0) }
    }

    /// Always fails
    pub fn failing() -> Self {
        Self { result: None, delay: None, calls: AtomicUsize::new(0) }
    }

    /// Wait `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of lookups performed so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeoLocator for MockLocator {
    async fn locate(&self, _ip: IpAddr) -> Result<GeoLocation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone().ok_or_else(|| AppError::GeoLookup {
            message: "mock failure".to_string(),
        })
    }

    fn provider(&self) -> &str {
        "mock"
    }
}
