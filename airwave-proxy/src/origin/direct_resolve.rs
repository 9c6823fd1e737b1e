//! Direct-resolve adapter
//!
//! Public CDN channels with a real master playlist. Chunklists and segments are
//! siblings of the master playlist, so they resolve against its directory.

use std::collections::{BTreeMap, HashMap};

use airwave_core::{Channel, ChannelFamily, MASTER_PLAYLIST};
use url::Url;

use super::{parse_url_table, OriginAdapter, UpstreamTarget};
use crate::{ProxyError, Result};

pub struct DirectResolveAdapter {
    http: reqwest::Client,
    masters: HashMap<String, Url>,
}

impl DirectResolveAdapter {
    /// `masters` maps channel id to its upstream master playlist URL.
    pub fn new(http: reqwest::Client, masters: &BTreeMap<String, String>) -> Result<Self> {
        Ok(Self {
            http,
            masters: parse_url_table(masters)?,
        })
    }
}

impl OriginAdapter for DirectResolveAdapter {
    fn family(&self) -> ChannelFamily {
        ChannelFamily::DirectResolve
    }

    fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn resolve(&self, channel: &Channel, resource_path: &str) -> Result<UpstreamTarget> {
        let master = self
            .masters
            .get(&channel.id)
            .ok_or_else(|| ProxyError::UnknownChannel(channel.id.clone()))?;

        let url = if resource_path == MASTER_PLAYLIST {
            master.clone()
        } else {
            let mut url = master.clone();
            let directory = master
                .path()
                .rsplit_once('/')
                .map_or("", |(dir, _)| dir);
            url.set_path(&format!("{directory}/{resource_path}"));
            url.set_query(None);
            url
        };

        Ok(UpstreamTarget {
            url,
            resolved_via: ChannelFamily::DirectResolve,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> DirectResolveAdapter {
        let masters = BTreeMap::from([(
            "rthk1".to_string(),
            "https://rthkradio1-live.akamaized.net/hls/live/2035313/radio1/master.m3u8".to_string(),
        )]);
        DirectResolveAdapter::new(reqwest::Client::new(), &masters).unwrap()
    }

    fn channel(id: &str) -> Channel {
        Channel {
            id: id.to_string(),
            family: ChannelFamily::DirectResolve,
        }
    }

    #[test]
    fn test_master_uses_known_url() {
        let target = adapter().resolve(&channel("rthk1"), MASTER_PLAYLIST).unwrap();
        assert_eq!(
            target.url.as_str(),
            "https://rthkradio1-live.akamaized.net/hls/live/2035313/radio1/master.m3u8"
        );
    }

    #[test]
    fn test_sibling_relative_resolution() {
        let target = adapter()
            .resolve(&channel("rthk1"), "index_64_a-p.m3u8")
            .unwrap();
        assert_eq!(
            target.url.as_str(),
            "https://rthkradio1-live.akamaized.net/hls/live/2035313/radio1/index_64_a-p.m3u8"
        );

        let target = adapter()
            .resolve(&channel("rthk1"), "segment_64_123.aac")
            .unwrap();
        assert_eq!(
            target.url.as_str(),
            "https://rthkradio1-live.akamaized.net/hls/live/2035313/radio1/segment_64_123.aac"
        );
    }

    #[test]
    fn test_channel_without_master_url() {
        assert!(matches!(
            adapter().resolve(&channel("rthk9"), MASTER_PLAYLIST),
            Err(ProxyError::UnknownChannel(_))
        ));
    }
}
