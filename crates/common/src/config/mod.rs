//! Configuration management for CyberSentry services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Geo enrichment configuration
    #[serde(default)]
    pub geo: GeoConfig,

    /// Client identity hashing
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Object storage for article images
    #[serde(default)]
    pub media: MediaConfig,

    /// List endpoint sizing
    #[serde(default)]
    pub content: ContentConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Keep all content in process memory instead of Postgres
    #[serde(default)]
    pub in_memory: bool,

    /// Apply embedded migrations at startup
    #[serde(default = "default_enabled")]
    pub run_migrations: bool,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeoConfig {
    /// Perform outbound lookups at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Base URL of the ipapi-compatible lookup service
    #[serde(default = "default_geo_base_url")]
    pub base_url: String,

    /// Lookup timeout in milliseconds
    #[serde(default = "default_geo_timeout")]
    pub timeout_ms: u64,

    /// Prefer proxy-injected location headers over the lookup service
    #[serde(default = "default_enabled")]
    pub trust_platform_headers: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentityConfig {
    /// Salt mixed into client address hashes
    #[serde(default)]
    pub hash_salt: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaConfig {
    /// Object storage base URL; uploads are disabled when unset
    pub base_url: Option<String>,

    /// Service key sent as a bearer token
    pub api_key: Option<String>,

    /// Bucket receiving article images
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Folder inside the bucket
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,

    /// Largest accepted image in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Upload timeout in seconds
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContentConfig {
    /// Page size used when a list request has no limit
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,

    /// Upper bound for any list request
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name reported in logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second per client on publish and contact
    #[serde(default = "default_rate_limit")]
    pub requests_per_second: u32,

    /// Burst capacity per client
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Enable rate limiting
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_concurrent() -> usize { 256 }
fn default_database_url() -> String { "postgres://localhost/cybersentry".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_geo_base_url() -> String { "https://ipapi.co".to_string() }
fn default_geo_timeout() -> u64 { 3000 }
fn default_bucket() -> String { "news-images".to_string() }
fn default_path_prefix() -> String { "news-articles".to_string() }
fn default_max_image_bytes() -> usize { 10 * 1024 * 1024 }
fn default_upload_timeout() -> u64 { 30 }
fn default_page_size() -> u64 { 20 }
fn default_max_page_size() -> u64 { 100 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "cybersentry".to_string() }
fn default_rate_limit() -> u32 { 2 }
fn default_burst() -> u32 { 10 }
fn default_enabled() -> bool { true }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            read_url: None,
            in_memory: false,
            run_migrations: default_enabled(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_geo_base_url(),
            timeout_ms: default_geo_timeout(),
            trust_platform_headers: default_enabled(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            bucket: default_bucket(),
            path_prefix: default_path_prefix(),
            max_image_bytes: default_max_image_bytes(),
            timeout_secs: default_upload_timeout(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rate_limit(),
            burst: default_burst(),
            enabled: default_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__GEO__TIMEOUT_MS=1500
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get the geo lookup timeout as Duration
    pub fn geo_timeout(&self) -> Duration {
        Duration::from_millis(self.geo.timeout_ms)
    }

    /// Resolve a requested list size against the configured bounds
    pub fn page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.content.default_page_size)
            .clamp(1, self.content.max_page_size.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            geo: GeoConfig::default(),
            identity: IdentityConfig::default(),
            media: MediaConfig::default(),
            content: ContentConfig::default(),
            observability: ObservabilityConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.geo.timeout_ms, 3000);
        assert_eq!(config.geo_timeout(), Duration::from_secs(3));
        assert_eq!(config.media.bucket, "news-images");
        assert!(config.media.base_url.is_none());
    }

    #[test]
    fn test_page_size_clamping() {
        let config = AppConfig::default();
        assert_eq!(config.page_size(None), 20);
        assert_eq!(config.page_size(Some(6)), 6);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(10_000)), 100);
    }

    #[test]
    fn test_from_empty_sources() {
        let config: AppConfig = Config::builder()
            .set_override("geo.timeout_ms", 1500)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.geo.timeout_ms, 1500);
        assert_eq!(config.server.port, 8080);
        assert!(config.geo.trust_platform_headers);
    }
}
