pub mod edge;
pub mod policy;
pub mod singleflight;

pub use edge::{CachedResponse, EdgeCache, MemoryEdgeCache};
pub use policy::{CachePolicies, CachePolicy};
pub use singleflight::FetchGroup;
