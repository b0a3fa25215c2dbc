//! Article view analytics
//!
//! Provides:
//! - Client context extraction from proxy headers
//! - Salted client identity hashing
//! - Device classification
//! - Geo enrichment with graceful degradation
//! - The view tracker tying them to the content store

pub mod client;
pub mod device;
pub mod geo;
pub mod identity;
mod tracker;

pub use client::ClientContext;
pub use device::DeviceType;
pub use geo::{DisabledLocator, GeoLocation, GeoLocator, IpApiLocator, MockLocator};
pub use identity::IdentityHasher;
pub use tracker::{ViewOutcome, ViewTracker};
