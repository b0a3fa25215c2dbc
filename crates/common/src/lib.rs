//! CyberSentry Common Library
//!
//! Shared code for the CyberSentry services including:
//! - Database models, repository and the in-memory store
//! - Article view analytics (client identity, geo enrichment, devices)
//! - Object storage client for article images
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod analytics;
pub mod config;
pub mod db;
pub mod errors;
pub mod media;
pub mod metrics;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{ContentStore, MemoryStore, Repository};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Location sentinel for addresses that could not be resolved
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Location sentinel for loopback and unidentifiable clients
pub const LOCALHOST_LOCATION: &str = "Localhost";
