//! Article view tracking
//!
//! Linear per request: identity, location, device, then a single
//! insert-if-absent write. Geo enrichment never fails the request; only
//! the storage write can return an error.

use super::client::ClientContext;
use super::device::DeviceType;
use super::geo::{is_local_address, GeoLocation, GeoLocator};
use super::identity::IdentityHasher;
use crate::db::models::{NewArticleView, ViewWrite};
use crate::db::ContentStore;
use crate::errors::Result;
use crate::metrics;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome of a view log request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewOutcome {
    Recorded,
    Skipped,
}

#[derive(Clone)]
pub struct ViewTracker {
    store: Arc<dyn ContentStore>,
    geo: Arc<dyn GeoLocator>,
    hasher: IdentityHasher,
    trust_platform_headers: bool,
}

impl ViewTracker {
    pub fn new(
        store: Arc<dyn ContentStore>,
        geo: Arc<dyn GeoLocator>,
        hasher: IdentityHasher,
        trust_platform_headers: bool,
    ) -> Self {
        Self { store, geo, hasher, trust_platform_headers }
    }

    /// Record one view of `article_id` by the client in `ctx`
    pub async fn track(&self, article_id: &str, ctx: &ClientContext) -> Result<ViewOutcome> {
        let location = self.resolve_location(ctx).await;
        let device = DeviceType::from_user_agent(&ctx.user_agent);

        let view = NewArticleView {
            article_id: article_id.to_string(),
            client_identity: self.hasher.identity(&ctx.address),
            country: location.country,
            region: location.region,
            city: location.city,
            device_type: device.to_string(),
        };

        let outcome = match self.store.record_view(view).await? {
            ViewWrite::Recorded => ViewOutcome::Recorded,
            ViewWrite::Duplicate => ViewOutcome::Skipped,
        };

        debug!(
            article_id = %article_id,
            device = %device,
            outcome = ?outcome,
            "Article view processed"
        );

        Ok(outcome)
    }

    /// Location for a client; always yields a value
    pub async fn resolve_location(&self, ctx: &ClientContext) -> GeoLocation {
        if is_local_address(&ctx.address) {
            return GeoLocation::localhost();
        }

        if self.trust_platform_headers {
            if let Some(location) = &ctx.platform_geo {
                metrics::record_geo_lookup("platform_header", true, None);
                return location.clone();
            }
        }

        if !self.geo.is_enabled() {
            return GeoLocation::unknown();
        }

        // Only well-formed addresses go out to the lookup service
        let Ok(ip) = ctx.address.parse::<IpAddr>() else {
            debug!(address = %ctx.address, "Unparseable client address, skipping geo lookup");
            return GeoLocation::unknown();
        };

        let start = Instant::now();
        match self.geo.locate(ip).await {
            Ok(location) => {
                metrics::record_geo_lookup(
                    self.geo.provider(),
                    true,
                    Some(start.elapsed().as_secs_f64()),
                );
                location
            }
            Err(e) => {
                metrics::record_geo_lookup(
                    self.geo.provider(),
                    false,
                    Some(start.elapsed().as_secs_f64()),
                );
                warn!(
                    provider = self.geo.provider(),
                    error = %e,
                    "Geo lookup failed, keeping defaults"
                );
                GeoLocation::unknown()
            }
        }
    }
}
