//! Stream proxy handlers
//!
//! `GET /{channel}[/]` and `GET /{channel}/{*resource}` run the same pipeline:
//! classify, pick the channel's origin adapter, then either serve straight from
//! upstream (chunklists) or go through the edge cache (master playlists and segments).

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Uri},
    response::Response,
};
use bytes::Bytes;

use airwave_core::{CachePolicy, CachedResponse, ResourceClass, ResourceRequest};
use airwave_proxy::{rewrite_playlist, OriginAdapter, ProxyError};

use super::response::{build_cached, content_type, into_response, CacheStatus};
use super::{AppResult, AppState};

/// GET /{channel} and /{channel}/ - master playlist
pub async fn channel_master(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    headers: HeaderMap,
    uri: Uri,
) -> AppResult<Response> {
    serve(&state, &channel, None, &headers, &uri)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                channel = %channel,
                status = %e.status,
                "Stream request failed: {}",
                e.message
            );
        })
}

/// GET /{channel}/{*resource} - variant playlist, chunklist or segment
pub async fn channel_resource(
    State(state): State<AppState>,
    Path((channel, resource)): Path<(String, String)>,
    headers: HeaderMap,
    uri: Uri,
) -> AppResult<Response> {
    serve(&state, &channel, Some(&resource), &headers, &uri)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                channel = %channel,
                resource = %resource,
                status = %e.status,
                "Stream request failed: {}",
                e.message
            );
        })
}

async fn serve(
    state: &AppState,
    channel_id: &str,
    resource: Option<&str>,
    headers: &HeaderMap,
    uri: &Uri,
) -> AppResult<Response> {
    let request = ResourceRequest::parse(&state.registry, channel_id, resource)?;
    let adapter = state.adapters.for_channel(&request.channel)?;
    let class = adapter.effective_class(request.class);
    let policy = state.policies.for_class(class);
    let proxy_origin = state.proxy_origin(headers);

    tracing::debug!(
        channel = %request.channel.id,
        family = %request.channel.family,
        resource = %request.resource_path,
        class = class.as_str(),
        "Serving stream resource"
    );

    if !policy.cacheable {
        let built = fetch_and_build(adapter, &request, class, &policy, &proxy_origin).await?;
        return into_response(built, CacheStatus::Bypass);
    }

    let key = cache_key(&proxy_origin, uri);
    if let Some(hit) = state.cache.lookup(&key).await {
        tracing::debug!(key = %key, "Edge cache hit");
        return into_response(hit, CacheStatus::Hit);
    }

    let cache = state.cache.clone();
    let store_key = key.clone();
    let ttl = policy.edge_ttl();
    let fetch = async move {
        let built = fetch_and_build(adapter, &request, class, &policy, &proxy_origin).await?;

        // Only successful responses reach this point; errors are never stored
        let stored = built.clone();
        tokio::spawn(async move {
            cache.store(store_key, stored, ttl).await;
        });

        Ok::<_, ProxyError>(built)
    };

    let built = match &state.fetches {
        Some(group) => group.fetch(&key, fetch, || ProxyError::Abandoned).await?,
        None => fetch.await?,
    };

    into_response(built, CacheStatus::Miss)
}

/// Resolve, fetch and (for playlists) rewrite one resource.
async fn fetch_and_build(
    adapter: &dyn OriginAdapter,
    request: &ResourceRequest,
    class: ResourceClass,
    policy: &CachePolicy,
    proxy_origin: &str,
) -> Result<CachedResponse, ProxyError> {
    let target = adapter.resolve(&request.channel, &request.resource_path)?;
    let upstream = adapter.fetch(&target).await?;

    let body = if class.is_playlist() {
        let text = String::from_utf8_lossy(&upstream.body);
        Bytes::from(rewrite_playlist(
            &text,
            &request.channel.id,
            proxy_origin,
            adapter.rewrite_mode(),
        ))
    } else {
        upstream.body
    };

    let content_type = content_type(class, request.extension(), upstream.content_type.as_deref());
    Ok(build_cached(upstream.status, class, policy, content_type, body))
}

/// Edge cache key: the full public URL of the request
fn cache_key(proxy_origin: &str, uri: &Uri) -> String {
    let path_and_query = uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str());
    format!("{}{}", proxy_origin.trim_end_matches('/'), path_and_query)
}
