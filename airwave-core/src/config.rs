use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use url::Url;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub upstream: UpstreamConfig,
    pub channels: ChannelsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Public origin used when rewriting playlists (e.g. `https://radio.example.com`).
    /// Derived from the request's forwarding headers when unset.
    pub public_origin: Option<String>,
    /// Deployment name reported by `/health`
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 8787,
            public_origin: None,
            environment: "development".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

/// Edge cache sizing and TTLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached responses
    pub max_capacity: u64,
    pub master_playlist_ttl_seconds: u64,
    pub segment_ttl_seconds: u64,
    /// Share one upstream fetch between concurrent misses on the same key
    pub coalesce_misses: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            master_playlist_ttl_seconds: 60,
            segment_ttl_seconds: 86_400,
            coalesce_misses: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Private origin service that signs requests for tunnel channels
    pub tunnel_origin: String,
    pub user_agent: String,
    pub connect_timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            tunnel_origin: "http://127.0.0.1:8788/stream".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            connect_timeout_seconds: 10,
            max_redirects: 10,
        }
    }
}

/// Static channel registry, one table per origin family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    /// Channels served through the tunnel origin
    pub tunnel: Vec<String>,
    /// Channel id -> upstream master playlist URL
    pub direct_resolve: BTreeMap<String, String>,
    /// Channel id -> upstream chunklist URL (`https://host/{stream_id}/...`)
    pub direct_flat: BTreeMap<String, String>,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        let tunnel = ["crhk881", "crhk903", "crhk864"]
            .into_iter()
            .map(String::from)
            .collect();

        let direct_resolve = [
            (
                "rthk1",
                "https://rthkradio1-live.akamaized.net/hls/live/2035313/radio1/master.m3u8",
            ),
            (
                "rthk2",
                "https://rthkradio2-live.akamaized.net/hls/live/2040078/radio2/master.m3u8",
            ),
            (
                "rthk3",
                "https://rthkradio3-live.akamaized.net/hls/live/2040079/radio3/master.m3u8",
            ),
            (
                "rthk4",
                "https://rthkradio4-live.akamaized.net/hls/live/2040080/radio4/master.m3u8",
            ),
            (
                "rthk5",
                "https://rthkradio5-live.akamaized.net/hls/live/2040081/radio5/master.m3u8",
            ),
            (
                "rthkpth",
                "https://rthkradiopth-live.akamaized.net/hls/live/2040082/radiopth/master.m3u8",
            ),
        ]
        .into_iter()
        .map(|(id, url)| (id.to_string(), url.to_string()))
        .collect();

        let direct_flat = [
            ("metro997", "https://hls.metroradio.com.hk/1001/index.m3u8"),
            ("metro104", "https://hls.metroradio.com.hk/1002/index.m3u8"),
            ("metro1044", "https://hls.metroradio.com.hk/1003/index.m3u8"),
        ]
        .into_iter()
        .map(|(id, url)| (id.to_string(), url.to_string()))
        .collect();

        Self {
            tunnel,
            direct_resolve,
            direct_flat,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // AIRWAVE_SERVER__HTTP_PORT, AIRWAVE_CACHE__SEGMENT_TTL_SECONDS, ...
        builder = builder.add_source(
            Environment::with_prefix("AIRWAVE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only (for Docker/K8s)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Get HTTP address
    #[must_use]
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.http_port)
    }

    /// Check the configuration, collecting every problem instead of stopping at the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(origin) = &self.server.public_origin {
            if Url::parse(origin).is_err() {
                errors.push(format!("server.public_origin is not a valid URL: {origin}"));
            }
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got {:?}",
                self.logging.format
            ));
        }

        if self.cache.master_playlist_ttl_seconds == 0 || self.cache.segment_ttl_seconds == 0 {
            errors.push("cache TTLs must be greater than zero".to_string());
        }

        if Url::parse(&self.upstream.tunnel_origin).is_err() {
            errors.push(format!(
                "upstream.tunnel_origin is not a valid URL: {}",
                self.upstream.tunnel_origin
            ));
        }

        errors.extend(self.channels.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ChannelsConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        let ids = self
            .tunnel
            .iter()
            .chain(self.direct_resolve.keys())
            .chain(self.direct_flat.keys());
        for id in ids {
            if id.is_empty() || id.contains('/') {
                errors.push(format!("invalid channel id: {id:?}"));
            }
            if !seen.insert(id.as_str()) {
                errors.push(format!("channel {id} is registered in more than one family"));
            }
        }

        for (id, url) in &self.direct_resolve {
            if Url::parse(url).is_err() {
                errors.push(format!("channel {id}: invalid master playlist URL {url}"));
            }
        }

        for (id, url) in &self.direct_flat {
            match Url::parse(url) {
                Ok(parsed) => {
                    let stream_id = parsed
                        .path_segments()
                        .and_then(|mut segments| segments.next())
                        .unwrap_or_default();
                    if stream_id.is_empty() || !stream_id.bytes().all(|b| b.is_ascii_digit()) {
                        errors.push(format!(
                            "channel {id}: stream URL {url} has no numeric stream id"
                        ));
                    }
                }
                Err(_) => errors.push(format!("channel {id}: invalid stream URL {url}")),
            }
        }

        errors
    }
}
