//! Miss coalescing
//!
//! When several requests miss the edge cache for the same key at once, only the
//! first one goes upstream; the others wait for and share its result.

use std::future::Future;
use std::sync::Arc;

/// Groups concurrent fetches by cache key
pub struct FetchGroup<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    group: Arc<async_singleflight::Group<String, V, E>>,
}

impl<V, E> Clone for FetchGroup<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            group: self.group.clone(),
        }
    }
}

impl<V, E> FetchGroup<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            group: Arc::new(async_singleflight::Group::new()),
        }
    }

    /// Run `fetch` unless a fetch for `key` is already in flight, in which case
    /// wait for that one. `on_abandoned` builds the error returned when the
    /// leading fetch was dropped before finishing.
    pub async fn fetch<Fut, F>(&self, key: &str, fetch: Fut, on_abandoned: F) -> Result<V, E>
    where
        Fut: Future<Output = Result<V, E>> + Send,
        F: FnOnce() -> E,
    {
        self.group
            .work(&key.to_string(), fetch)
            .await
            .map_err(|err| err.unwrap_or_else(on_abandoned))
    }
}

impl<V, E> Default for FetchGroup<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let group: FetchGroup<String, String> = FetchGroup::new();
        let upstream_calls = Arc::new(AtomicU32::new(0));

        let mut handles = vec![];
        for _ in 0..8 {
            let group = group.clone();
            let upstream_calls = upstream_calls.clone();
            handles.push(tokio::spawn(async move {
                group
                    .fetch(
                        "https://radio.example.com/rthk1/seg1.aac",
                        async move {
                            sleep(Duration::from_millis(50)).await;
                            upstream_calls.fetch_add(1, Ordering::SeqCst);
                            Ok("segment".to_string())
                        },
                        || "abandoned".to_string(),
                    )
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "segment");
        }
        assert_eq!(upstream_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_independently() {
        let group: FetchGroup<u32, String> = FetchGroup::new();
        let upstream_calls = Arc::new(AtomicU32::new(0));

        for key in ["a", "b"] {
            let calls = upstream_calls.clone();
            let value = group
                .fetch(
                    key,
                    async move { Ok(calls.fetch_add(1, Ordering::SeqCst)) },
                    || "abandoned".to_string(),
                )
                .await
                .unwrap();
            assert!(value < 2);
        }
        assert_eq!(upstream_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_is_not_remembered() {
        let group: FetchGroup<u32, String> = FetchGroup::new();

        let first = group
            .fetch("k", async { Err("upstream 503".to_string()) }, || "abandoned".to_string())
            .await;
        assert_eq!(first.unwrap_err(), "upstream 503");

        let second = group
            .fetch("k", async { Ok(7) }, || "abandoned".to_string())
            .await;
        assert_eq!(second.unwrap(), 7);
    }
}
