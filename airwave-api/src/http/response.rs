//! Response assembly
//!
//! Content type and `Cache-Control` are decided here from the resource class so
//! that all three origin families produce identical headers. CORS headers are
//! added for every response by [`super::middleware::cors_middleware`].

use axum::{
    body::Body,
    http::{header, HeaderValue},
    response::Response,
};

use airwave_core::{CachePolicy, CachedResponse, ResourceClass};

use super::{AppError, AppResult};

pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
pub const X_CACHE: &str = "x-cache";

/// Edge cache outcome reported in the `X-Cache` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

impl CacheStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
            Self::Bypass => "BYPASS",
        }
    }
}

#[must_use]
pub fn cache_control(class: ResourceClass, policy: &CachePolicy) -> String {
    match class {
        // Edge-cacheable, but players must revalidate
        ResourceClass::MasterPlaylist => {
            format!("public, s-maxage={}, max-age=0", policy.edge_ttl_seconds)
        }
        ResourceClass::Chunklist => "no-cache, no-store, must-revalidate".to_string(),
        ResourceClass::Segment => format!("public, max-age={}", policy.client_max_age),
    }
}

/// Content type for a response body, falling back to what the upstream sent.
#[must_use]
pub fn content_type(class: ResourceClass, extension: &str, upstream: Option<&str>) -> String {
    if class.is_playlist() {
        return PLAYLIST_CONTENT_TYPE.to_string();
    }

    let by_extension = match extension.to_ascii_lowercase().as_str() {
        "ts" => Some("video/mp2t"),
        "aac" => Some("audio/aac"),
        "mp3" => Some("audio/mpeg"),
        "m4a" | "m4s" | "mp4" => Some("audio/mp4"),
        _ => None,
    };

    by_extension
        .or(upstream)
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Build the cacheable representation of a successful upstream response.
#[must_use]
pub fn build_cached(
    status: u16,
    class: ResourceClass,
    policy: &CachePolicy,
    content_type: String,
    body: bytes::Bytes,
) -> CachedResponse {
    CachedResponse {
        status,
        headers: vec![
            (header::CONTENT_TYPE.to_string(), content_type),
            (header::CACHE_CONTROL.to_string(), cache_control(class, policy)),
        ],
        body,
    }
}

/// Turn a stored or freshly built response into an HTTP response.
pub fn into_response(cached: CachedResponse, cache_status: CacheStatus) -> AppResult<Response> {
    let mut builder = Response::builder().status(cached.status);
    for (name, value) in &cached.headers {
        if name.eq_ignore_ascii_case(X_CACHE) {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }

    builder
        .header(X_CACHE, HeaderValue::from_static(cache_status.as_str()))
        .body(Body::from(cached.body))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            AppError::internal("Internal server error")
        })
}
