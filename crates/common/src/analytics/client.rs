//! Client context extraction
//!
//! Everything the view pipeline needs to know about the caller, pulled out
//! of proxy headers and the connection.

use super::geo::GeoLocation;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Address used when no source yields one
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Request facts used to log a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientContext {
    /// Best-known client address, or `unknown`
    pub address: String,

    /// Declared user agent, empty when absent
    pub user_agent: String,

    /// Location supplied by the hosting platform's proxy
    pub platform_geo: Option<GeoLocation>,
}

impl ClientContext {
    /// Build from request headers and the peer address, if known.
    ///
    /// Address precedence: first entry of `x-forwarded-for`, then
    /// `x-real-ip`, then the socket peer, then `unknown`.
    pub fn from_headers(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        let forwarded = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let real_ip = header("x-real-ip")
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let address = forwarded
            .or(real_ip)
            .map(String::from)
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string());

        let user_agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Self {
            address,
            user_agent,
            platform_geo: GeoLocation::from_platform_headers(headers),
        }
    }
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self::from_headers(&parts.headers, peer))
    }
}
