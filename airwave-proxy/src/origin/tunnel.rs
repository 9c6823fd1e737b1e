//! Tunnel adapter
//!
//! Restricted channels are fetched through a private origin service that owns
//! authentication and URL signing. This adapter only forwards the channel and,
//! below the master playlist, the resource path as query parameters.

use airwave_core::{Channel, ChannelFamily, MASTER_PLAYLIST};
use url::Url;

use super::{OriginAdapter, UpstreamTarget};
use crate::{ProxyError, Result};

pub struct TunnelAdapter {
    http: reqwest::Client,
    origin: Url,
}

impl TunnelAdapter {
    pub fn new(http: reqwest::Client, origin: &str) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| ProxyError::InvalidUrl(format!("tunnel origin {origin}: {e}")))?;
        Ok(Self { http, origin })
    }
}

impl OriginAdapter for TunnelAdapter {
    fn family(&self) -> ChannelFamily {
        ChannelFamily::Tunnel
    }

    fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn resolve(&self, channel: &Channel, resource_path: &str) -> Result<UpstreamTarget> {
        let mut url = self.origin.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("channel", &channel.id);
            if resource_path != MASTER_PLAYLIST {
                query.append_pair("path", resource_path);
            }
        }

        Ok(UpstreamTarget {
            url,
            resolved_via: ChannelFamily::Tunnel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> TunnelAdapter {
        TunnelAdapter::new(reqwest::Client::new(), "https://tunnel.internal/stream").unwrap()
    }

    fn channel() -> Channel {
        Channel {
            id: "crhk881".to_string(),
            family: ChannelFamily::Tunnel,
        }
    }

    #[test]
    fn test_master_passes_channel_only() {
        let target = adapter().resolve(&channel(), MASTER_PLAYLIST).unwrap();
        assert_eq!(target.url.as_str(), "https://tunnel.internal/stream?channel=crhk881");
        assert_eq!(target.resolved_via, ChannelFamily::Tunnel);
    }

    #[test]
    fn test_sub_resource_passes_path() {
        let target = adapter()
            .resolve(&channel(), "chunklist_w1234.m3u8")
            .unwrap();
        assert_eq!(
            target.url.as_str(),
            "https://tunnel.internal/stream?channel=crhk881&path=chunklist_w1234.m3u8"
        );
    }

    #[test]
    fn test_path_is_encoded() {
        let target = adapter().resolve(&channel(), "a b/c.aac").unwrap();
        let path = target
            .url
            .query_pairs()
            .find(|(k, _)| k == "path")
            .map(|(_, v)| v.into_owned());
        assert_eq!(path.as_deref(), Some("a b/c.aac"));
    }

    #[test]
    fn test_rejects_bad_origin() {
        assert!(TunnelAdapter::new(reqwest::Client::new(), "::not a url").is_err());
    }
}
