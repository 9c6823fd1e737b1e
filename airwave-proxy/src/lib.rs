//! Upstream side of the streaming edge proxy
//!
//! Resolves channel resources against their origin family, fetches them, and
//! rewrites playlists so that every URI points back through the proxy.

pub mod client;
pub mod error;
pub mod origin;
pub mod rewrite;

pub use error::{ProxyError, Result};
pub use origin::{OriginAdapter, OriginAdapters, UpstreamResponse, UpstreamTarget};
pub use rewrite::{rewrite_playlist, RewriteMode};
