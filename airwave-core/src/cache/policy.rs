//! Cache policy per resource class
//!
//! Chunklists list the live window and are never cached. Master playlists are
//! cached briefly at the edge only; segments are immutable once published and
//! may be cached by both the edge and the client.

use std::time::Duration;

use crate::config::CacheConfig;
use crate::resource::ResourceClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub cacheable: bool,
    pub edge_ttl_seconds: u64,
    pub client_max_age: u64,
}

impl CachePolicy {
    pub const BYPASS: Self = Self {
        cacheable: false,
        edge_ttl_seconds: 0,
        client_max_age: 0,
    };

    #[must_use]
    pub const fn edge_ttl(&self) -> Duration {
        Duration::from_secs(self.edge_ttl_seconds)
    }
}

/// Configured TTLs, resolved into a [`CachePolicy`] per class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicies {
    master_playlist_ttl_seconds: u64,
    segment_ttl_seconds: u64,
}

impl CachePolicies {
    #[must_use]
    pub const fn new(master_playlist_ttl_seconds: u64, segment_ttl_seconds: u64) -> Self {
        Self {
            master_playlist_ttl_seconds,
            segment_ttl_seconds,
        }
    }

    #[must_use]
    pub const fn for_class(&self, class: ResourceClass) -> CachePolicy {
        match class {
            ResourceClass::MasterPlaylist => CachePolicy {
                cacheable: true,
                edge_ttl_seconds: self.master_playlist_ttl_seconds,
                client_max_age: 0,
            },
            ResourceClass::Chunklist => CachePolicy::BYPASS,
            ResourceClass::Segment => CachePolicy {
                cacheable: true,
                edge_ttl_seconds: self.segment_ttl_seconds,
                client_max_age: self.segment_ttl_seconds,
            },
        }
    }
}

impl From<&CacheConfig> for CachePolicies {
    fn from(config: &CacheConfig) -> Self {
        Self::new(
            config.master_playlist_ttl_seconds,
            config.segment_ttl_seconds,
        )
    }
}

impl Default for CachePolicies {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}
