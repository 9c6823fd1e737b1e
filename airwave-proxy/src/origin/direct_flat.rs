//! Direct-flat adapter
//!
//! Public CDN channels whose only manifest is the live chunklist. The master
//! playlist request is answered with that chunklist, and segments live under
//! `{scheme}://{host}/{stream_id}/YYYY/MM/DD/HH/mm/NN-NNNNN.ts`.

use std::collections::{BTreeMap, HashMap};

use airwave_core::{Channel, ChannelFamily, ResourceClass, MASTER_PLAYLIST};
use url::Url;

use super::{parse_url_table, OriginAdapter, UpstreamTarget};
use crate::rewrite::{is_stream_id, RewriteMode};
use crate::{ProxyError, Result};

struct FlatStream {
    chunklist: Url,
    /// `{scheme}://{host}/{stream_id}/`
    base: Url,
}

pub struct DirectFlatAdapter {
    http: reqwest::Client,
    streams: HashMap<String, FlatStream>,
}

impl DirectFlatAdapter {
    /// `streams` maps channel id to its upstream chunklist URL.
    pub fn new(http: reqwest::Client, streams: &BTreeMap<String, String>) -> Result<Self> {
        let streams = parse_url_table(streams)?
            .into_iter()
            .map(|(id, chunklist)| {
                let base = stream_base(&chunklist)?;
                Ok((id, FlatStream { chunklist, base }))
            })
            .collect::<Result<_>>()?;

        Ok(Self { http, streams })
    }
}

fn stream_base(chunklist: &Url) -> Result<Url> {
    let stream_id = chunklist
        .path_segments()
        .and_then(|mut segments| segments.next())
        .filter(|segment| is_stream_id(segment))
        .ok_or_else(|| ProxyError::InvalidUrl(format!("{chunklist} has no numeric stream id")))?;

    let mut base = chunklist.clone();
    base.set_path(&format!("/{stream_id}/"));
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}

impl OriginAdapter for DirectFlatAdapter {
    fn family(&self) -> ChannelFamily {
        ChannelFamily::DirectFlat
    }

    fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn resolve(&self, channel: &Channel, resource_path: &str) -> Result<UpstreamTarget> {
        let stream = self
            .streams
            .get(&channel.id)
            .ok_or_else(|| ProxyError::UnknownChannel(channel.id.clone()))?;

        let url = if resource_path == MASTER_PLAYLIST {
            stream.chunklist.clone()
        } else {
            let mut url = stream.base.clone();
            url.set_path(&format!("{}{resource_path}", stream.base.path()));
            url
        };

        Ok(UpstreamTarget {
            url,
            resolved_via: ChannelFamily::DirectFlat,
        })
    }

    fn effective_class(&self, requested: ResourceClass) -> ResourceClass {
        match requested {
            ResourceClass::MasterPlaylist => ResourceClass::Chunklist,
            other => other,
        }
    }

    fn rewrite_mode(&self) -> RewriteMode {
        RewriteMode::PreserveAfterStreamId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> DirectFlatAdapter {
        let streams = BTreeMap::from([(
            "metro104".to_string(),
            "https://hls.metroradio.com.hk/1002/index.m3u8?src=web".to_string(),
        )]);
        DirectFlatAdapter::new(reqwest::Client::new(), &streams).unwrap()
    }

    fn channel() -> Channel {
        Channel {
            id: "metro104".to_string(),
            family: ChannelFamily::DirectFlat,
        }
    }

    #[test]
    fn test_master_request_fetches_chunklist() {
        let target = adapter().resolve(&channel(), MASTER_PLAYLIST).unwrap();
        assert_eq!(
            target.url.as_str(),
            "https://hls.metroradio.com.hk/1002/index.m3u8?src=web"
        );
    }

    #[test]
    fn test_master_served_as_chunklist() {
        let adapter = adapter();
        assert_eq!(
            adapter.effective_class(ResourceClass::MasterPlaylist),
            ResourceClass::Chunklist
        );
        assert_eq!(
            adapter.effective_class(ResourceClass::Segment),
            ResourceClass::Segment
        );
    }

    #[test]
    fn test_date_structured_segment_resolution() {
        let target = adapter()
            .resolve(&channel(), "2024/05/01/12/30/01-00042.ts")
            .unwrap();
        assert_eq!(
            target.url.as_str(),
            "https://hls.metroradio.com.hk/1002/2024/05/01/12/30/01-00042.ts"
        );
    }

    #[test]
    fn test_stream_url_without_numeric_id_rejected() {
        let streams = BTreeMap::from([(
            "metro_bad".to_string(),
            "https://hls.example.com/live/index.m3u8".to_string(),
        )]);
        assert!(DirectFlatAdapter::new(reqwest::Client::new(), &streams).is_err());
    }
}
