//! Shared building blocks for the Airwave streaming edge proxy: configuration,
//! logging, the static channel registry, resource classification and the edge cache.

pub mod bootstrap;
pub mod cache;
pub mod channel;
pub mod config;
pub mod error;
pub mod logging;
pub mod resource;

pub use cache::{CachePolicies, CachePolicy, CachedResponse, EdgeCache, MemoryEdgeCache};
pub use channel::{Channel, ChannelFamily, ChannelRegistry};
pub use config::Config;
pub use error::{Error, Result};
pub use resource::{ResourceClass, ResourceRequest, MASTER_PLAYLIST};
