// Module: http
// Public HLS endpoints: health, master playlists, and everything a playlist references

pub mod error;
pub mod health;
pub mod middleware;
pub mod response;
pub mod stream;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use airwave_core::{
    cache::FetchGroup, CachePolicies, CachedResponse, ChannelRegistry, Config, EdgeCache,
};
use airwave_proxy::{OriginAdapters, ProxyError};

pub use error::{AppError, AppResult, ErrorResponse};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ChannelRegistry>,
    pub adapters: OriginAdapters,
    pub cache: Arc<dyn EdgeCache>,
    pub policies: CachePolicies,
    /// Present when concurrent cache misses for one key share a single upstream fetch
    pub fetches: Option<FetchGroup<CachedResponse, ProxyError>>,
    pub public_origin: Option<String>,
    pub environment: String,
}

impl AppState {
    pub fn from_config(config: &Config, cache: Arc<dyn EdgeCache>) -> anyhow::Result<Self> {
        let registry = ChannelRegistry::from_config(&config.channels)?;
        let adapters = OriginAdapters::from_config(config)?;

        Ok(Self {
            registry: Arc::new(registry),
            adapters,
            cache,
            policies: CachePolicies::from(&config.cache),
            fetches: config.cache.coalesce_misses.then(FetchGroup::new),
            public_origin: config
                .server
                .public_origin
                .as_ref()
                .map(|origin| origin.trim_end_matches('/').to_string()),
            environment: config.server.environment.clone(),
        })
    }

    /// Origin that rewritten playlist URLs point at.
    ///
    /// The configured public origin wins; otherwise it is taken from the
    /// forwarding headers set by the fronting load balancer, then `Host`.
    pub fn proxy_origin(&self, headers: &HeaderMap) -> String {
        if let Some(origin) = &self.public_origin {
            return origin.clone();
        }

        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let scheme = header_str("x-forwarded-proto").unwrap_or("http");
        let host = header_str("x-forwarded-host")
            .or_else(|| header_str(header::HOST.as_str()))
            .unwrap_or("localhost");

        format!("{scheme}://{host}")
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("channels", &self.registry.len())
            .field("adapters", &self.adapters)
            .field("policies", &self.policies)
            .field("coalesce_misses", &self.fetches.is_some())
            .field("public_origin", &self.public_origin)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::create_health_router())
        .route("/{channel}", get(stream::channel_master))
        .route("/{channel}/", get(stream::channel_master))
        .route("/{channel}/{*resource}", get(stream::channel_resource))
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(axum::middleware::from_fn(middleware::cors_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> AppError {
    AppError::not_found("Not found")
}

fn handle_panic(panic: Box<dyn std::any::Any + Send + 'static>) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use airwave_core::MemoryEdgeCache;
    use axum::http::HeaderValue;

    fn state(public_origin: Option<&str>) -> AppState {
        let mut config = Config::default();
        config.server.public_origin = public_origin.map(String::from);
        AppState::from_config(&config, Arc::new(MemoryEdgeCache::new(16))).unwrap()
    }

    #[test]
    fn test_configured_origin_wins() {
        let state = state(Some("https://radio.example.com/"));
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:8787"));

        assert_eq!(state.proxy_origin(&headers), "https://radio.example.com");
    }

    #[test]
    fn test_origin_from_forwarding_headers() {
        let state = state(None);
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:8787"));
        assert_eq!(state.proxy_origin(&headers), "http://internal:8787");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("radio.example.com, lb.local"));
        assert_eq!(state.proxy_origin(&headers), "https://radio.example.com");
    }

    #[test]
    fn test_coalescing_follows_config() {
        let mut config = Config::default();
        config.cache.coalesce_misses = false;
        let state = AppState::from_config(&config, Arc::new(MemoryEdgeCache::new(16))).unwrap();
        assert!(state.fetches.is_none());
    }
}
