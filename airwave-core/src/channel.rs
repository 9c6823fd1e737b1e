//! Static channel registry
//!
//! Every channel belongs to exactly one origin family. The registry is built once
//! from [`ChannelsConfig`] at startup and never changes afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ChannelsConfig;
use crate::{Error, Result};

/// Upstream origin family a channel is served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelFamily {
    /// Restricted origin reachable only through the authenticated tunnel service
    Tunnel,
    /// Public CDN with a master playlist and sibling-relative chunklists
    DirectResolve,
    /// Public CDN whose only manifest is the live chunklist
    DirectFlat,
}

impl ChannelFamily {
    pub const ALL: [Self; 3] = [Self::Tunnel, Self::DirectResolve, Self::DirectFlat];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tunnel => "tunnel",
            Self::DirectResolve => "direct_resolve",
            Self::DirectFlat => "direct_flat",
        }
    }
}

impl std::fmt::Display for ChannelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub id: String,
    pub family: ChannelFamily,
}

#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    // Registration order is kept for error messages and /health
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    /// Build the registry, rejecting ids registered under more than one family.
    pub fn from_config(config: &ChannelsConfig) -> Result<Self> {
        let tunnel = config
            .tunnel
            .iter()
            .map(|id| (id, ChannelFamily::Tunnel));
        let direct_resolve = config
            .direct_resolve
            .keys()
            .map(|id| (id, ChannelFamily::DirectResolve));
        let direct_flat = config
            .direct_flat
            .keys()
            .map(|id| (id, ChannelFamily::DirectFlat));

        let mut channels: Vec<Channel> = Vec::new();
        for (id, family) in tunnel.chain(direct_resolve).chain(direct_flat) {
            if let Some(existing) = channels.iter().find(|c| &c.id == id) {
                return Err(Error::InvalidConfig(format!(
                    "channel {id} registered as both {} and {family}",
                    existing.family
                )));
            }
            channels.push(Channel {
                id: id.clone(),
                family,
            });
        }

        Ok(Self { channels })
    }

    /// Look up a channel, failing with [`Error::InvalidChannel`] for unknown ids.
    pub fn get(&self, id: &str) -> Result<&Channel> {
        self.channels
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::InvalidChannel {
                channel: id.to_string(),
                valid: self.ids(),
            })
    }

    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.id.clone()).collect()
    }

    /// Channel ids grouped by family; families without channels are listed empty.
    #[must_use]
    pub fn by_family(&self) -> BTreeMap<ChannelFamily, Vec<String>> {
        let mut grouped: BTreeMap<ChannelFamily, Vec<String>> =
            ChannelFamily::ALL.iter().map(|f| (*f, Vec::new())).collect();
        for channel in &self.channels {
            grouped
                .entry(channel.family)
                .or_default()
                .push(channel.id.clone());
        }
        grouped
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_covers_all_families() {
        let registry = ChannelRegistry::from_config(&ChannelsConfig::default()).unwrap();

        assert_eq!(registry.get("crhk881").unwrap().family, ChannelFamily::Tunnel);
        assert_eq!(registry.get("rthk1").unwrap().family, ChannelFamily::DirectResolve);
        assert_eq!(registry.get("metro104").unwrap().family, ChannelFamily::DirectFlat);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_empty_registry() {
        let config = ChannelsConfig {
            tunnel: Vec::new(),
            direct_resolve: BTreeMap::new(),
            direct_flat: BTreeMap::new(),
        };
        let registry = ChannelRegistry::from_config(&config).unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.by_family().values().all(Vec::is_empty));
    }

    #[test]
    fn test_unknown_channel() {
        let registry = ChannelRegistry::from_config(&ChannelsConfig::default()).unwrap();

        match registry.get("xyz") {
            Err(Error::InvalidChannel { channel, valid }) => {
                assert_eq!(channel, "xyz");
                assert_eq!(valid.len(), registry.len());
                assert!(valid.contains(&"rthk1".to_string()));
            }
            other => panic!("expected InvalidChannel, got {other:?}"),
        }
    }

    #[test]
    fn test_family_sets_partition_registry() {
        let registry = ChannelRegistry::from_config(&ChannelsConfig::default()).unwrap();
        let grouped = registry.by_family();

        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, registry.len());
        assert_eq!(grouped[&ChannelFamily::Tunnel], vec!["crhk881", "crhk903", "crhk864"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut config = ChannelsConfig::default();
        config
            .direct_flat
            .insert("rthk1".to_string(), "https://hls.example.com/1/a.m3u8".to_string());

        assert!(matches!(
            ChannelRegistry::from_config(&config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_family_still_listed() {
        let config = ChannelsConfig {
            tunnel: Vec::new(),
            ..ChannelsConfig::default()
        };
        let registry = ChannelRegistry::from_config(&config).unwrap();

        assert!(registry.by_family()[&ChannelFamily::Tunnel].is_empty());
    }
}
