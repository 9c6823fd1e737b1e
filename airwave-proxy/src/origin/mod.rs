// Origin adapters
//
// One adapter per channel family. Each knows how to turn (channel, resource path)
// into an upstream URL; fetching is shared unless an adapter needs otherwise.
//
//   tunnel          -> private authenticated origin, channel/path as query params
//   direct_resolve  -> public CDN, sibling-relative to a known master playlist
//   direct_flat     -> public CDN, chunklist-only, date-structured segment paths

pub mod direct_flat;
pub mod direct_resolve;
pub mod tunnel;

pub use direct_flat::DirectFlatAdapter;
pub use direct_resolve::DirectResolveAdapter;
pub use tunnel::TunnelAdapter;

use std::collections::HashMap;
use std::sync::Arc;

use airwave_core::{Channel, ChannelFamily, Config, ResourceClass};
use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::client::build_http_client;
use crate::rewrite::RewriteMode;
use crate::{ProxyError, Result};

/// Upstream location computed for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    pub url: Url,
    pub resolved_via: ChannelFamily,
}

/// Successful (2xx) upstream response, fully buffered
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
    /// URL after redirects
    pub final_url: Url,
}

#[async_trait]
pub trait OriginAdapter: Send + Sync {
    fn family(&self) -> ChannelFamily;

    /// HTTP client used by the default [`OriginAdapter::fetch`]
    fn http(&self) -> &reqwest::Client;

    /// Compute the upstream URL for a resource of `channel`.
    fn resolve(&self, channel: &Channel, resource_path: &str) -> Result<UpstreamTarget>;

    /// Fetch a resolved target. Non-2xx statuses become [`ProxyError::Upstream`].
    async fn fetch(&self, target: &UpstreamTarget) -> Result<UpstreamResponse> {
        fetch_upstream(self.http(), target).await
    }

    /// Class the response is served as, which may differ from the requested class
    /// when the upstream has no separate master playlist.
    fn effective_class(&self, requested: ResourceClass) -> ResourceClass {
        requested
    }

    fn rewrite_mode(&self) -> RewriteMode {
        RewriteMode::LastSegment
    }
}

/// GET a target, following redirects, and buffer the body.
pub async fn fetch_upstream(
    http: &reqwest::Client,
    target: &UpstreamTarget,
) -> Result<UpstreamResponse> {
    tracing::debug!(
        url = %target.url,
        family = %target.resolved_via,
        "Fetching upstream"
    );

    let response = http
        .get(target.url.clone())
        .send()
        .await
        .map_err(|e| ProxyError::Transport(format!("{}: {e}", target.url)))?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(
            url = %target.url,
            status = status.as_u16(),
            "Upstream returned error status"
        );
        return Err(ProxyError::Upstream {
            status: status.as_u16(),
            url: target.url.to_string(),
        });
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let body = response
        .bytes()
        .await
        .map_err(|e| ProxyError::Transport(format!("Failed to read body of {}: {e}", target.url)))?;

    Ok(UpstreamResponse {
        status: status.as_u16(),
        content_type,
        body,
        final_url,
    })
}

/// Adapters for every family, chosen once per channel at request time
#[derive(Clone)]
pub struct OriginAdapters {
    adapters: HashMap<ChannelFamily, Arc<dyn OriginAdapter>>,
}

impl OriginAdapters {
    /// Build all three adapters from configuration, sharing one HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = build_http_client(&config.upstream)?;

        let tunnel = TunnelAdapter::new(http.clone(), &config.upstream.tunnel_origin)?;
        let direct_resolve =
            DirectResolveAdapter::new(http.clone(), &config.channels.direct_resolve)?;
        let direct_flat = DirectFlatAdapter::new(http, &config.channels.direct_flat)?;

        Ok(Self::new(vec![
            Arc::new(tunnel),
            Arc::new(direct_resolve),
            Arc::new(direct_flat),
        ]))
    }

    #[must_use]
    pub fn new(adapters: Vec<Arc<dyn OriginAdapter>>) -> Self {
        Self {
            adapters: adapters.into_iter().map(|a| (a.family(), a)).collect(),
        }
    }

    pub fn for_channel(&self, channel: &Channel) -> Result<&dyn OriginAdapter> {
        self.adapters
            .get(&channel.family)
            .map(|adapter| adapter.as_ref())
            .ok_or_else(|| ProxyError::UnknownChannel(channel.id.clone()))
    }
}

impl std::fmt::Debug for OriginAdapters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginAdapters")
            .field("families", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Parse a configured `channel -> url` table.
fn parse_url_table(
    table: &std::collections::BTreeMap<String, String>,
) -> Result<HashMap<String, Url>> {
    table
        .iter()
        .map(|(id, raw)| {
            Url::parse(raw)
                .map(|url| (id.clone(), url))
                .map_err(|e| ProxyError::InvalidUrl(format!("{id}: {raw}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(url: &str) -> UpstreamTarget {
        UpstreamTarget {
            url: Url::parse(url).unwrap(),
            resolved_via: ChannelFamily::DirectResolve,
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live/seg1.aac"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "audio/aac")
                    .set_body_bytes(b"AAC".to_vec()),
            )
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let response = fetch_upstream(&http, &target(&format!("{}/live/seg1.aac", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("audio/aac"));
        assert_eq!(&response.body[..], b"AAC");
    }

    #[tokio::test]
    async fn test_fetch_propagates_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let err = fetch_upstream(&http, &target(&format!("{}/missing.aac", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err, ProxyError::Upstream { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/master.m3u8"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/renamed.m3u8", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/renamed.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n"))
            .mount(&server)
            .await;

        let http = reqwest::Client::new();
        let response = fetch_upstream(&http, &target(&format!("{}/master.m3u8", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert!(response.final_url.path().ends_with("/renamed.m3u8"));
    }

    #[tokio::test]
    async fn test_adapters_selected_by_family() {
        let adapters = OriginAdapters::from_config(&Config::default()).unwrap();

        for family in ChannelFamily::ALL {
            let channel = Channel {
                id: "any".to_string(),
                family,
            };
            assert_eq!(adapters.for_channel(&channel).unwrap().family(), family);
        }
    }
}
