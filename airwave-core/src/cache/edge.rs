//! Edge cache gateway
//!
//! Key-addressed response cache shared by all requests. The request pipeline only
//! sees the [`EdgeCache`] trait; [`MemoryEdgeCache`] is the in-process Moka backend.
//! Entries expire by their own TTL and are never invalidated explicitly.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::{Duration, Instant};

/// A response as stored in the edge cache, replayed verbatim on hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

#[async_trait]
pub trait EdgeCache: Send + Sync {
    async fn lookup(&self, key: &str) -> Option<CachedResponse>;

    async fn store(&self, key: String, response: CachedResponse, ttl: Duration);
}

#[derive(Clone)]
struct Entry {
    response: CachedResponse,
    ttl: Duration,
}

/// Expire each entry after the TTL it was stored with
struct PerEntryTtl;

impl moka::Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory edge cache backed by Moka
#[derive(Clone)]
pub struct MemoryEdgeCache {
    inner: moka::future::Cache<String, Entry>,
}

impl MemoryEdgeCache {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let inner = moka::future::Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { inner }
    }
}

impl std::fmt::Debug for MemoryEdgeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEdgeCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

#[async_trait]
impl EdgeCache for MemoryEdgeCache {
    async fn lookup(&self, key: &str) -> Option<CachedResponse> {
        let hit = self.inner.get(key).await.map(|entry| entry.response);
        tracing::debug!(key = %key, hit = hit.is_some(), "Edge cache lookup");
        hit
    }

    async fn store(&self, key: String, response: CachedResponse, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        tracing::debug!(
            key = %key,
            ttl_seconds = ttl.as_secs(),
            bytes = response.body.len(),
            "Edge cache store"
        );
        self.inner.insert(key, Entry { response, ttl }).await;
    }
}
