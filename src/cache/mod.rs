use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, Mutex};

use crate::api::error;

/// One cached query result: the JSON value plus its freshness stamp.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CacheEntry {
    value: Value,
    fetched_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.ttl
    }
}

/// Raw entries captured before an optimistic rewrite, reinstated exactly on
/// rollback (values and freshness stamps included).
pub struct CacheSnapshot {
    prefixes: Vec<String>,
    entries: Vec<(String, CacheEntry)>,
}

enum Flight {
    Leader(broadcast::Sender<Result<Value, error::Error>>),
    Follower(broadcast::Receiver<Result<Value, error::Error>>),
}

/// Process-wide in-memory store of query results, keyed by query shape
/// (`feed:2`, `comments:{entry}:latest:1`, ...). Reads within a key's
/// staleness window are served locally; stale or absent keys fetch, and
/// concurrent readers of one key share a single in-flight request.
///
/// The cache is plain state, injected into every service. Invalidation is the
/// only cross-service coordination: any mutation may drop keys, and the next
/// read of a dropped key refetches.
pub struct QueryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    inflight: Mutex<HashMap<String, broadcast::Sender<Result<Value, error::Error>>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        QueryCache { entries: Mutex::new(HashMap::new()), inflight: Mutex::new(HashMap::new()) }
    }

    /// Returns the cached value for `key` if present and fresh.
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, error::Error>
    where
        T: DeserializeOwned,
    {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_fresh() => {
                let value = serde_json::from_value(entry.value.clone())?;
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }

    /// Cached read with fetch-on-miss. While a fetch for `key` is in flight,
    /// further callers subscribe to its outcome instead of fetching again.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, error::Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, error::Error>>,
    {
        if let Some(value) = self.get::<T>(key).await? {
            return Ok(value);
        }

        let flight = {
            let mut inflight = self.inflight.lock().await;
            match inflight.get(key) {
                // Subscribing under the map lock: the leader removes itself
                // from the map before sending, so a subscriber that found the
                // sender here cannot miss the broadcast.
                Some(tx) => Flight::Follower(tx.subscribe()),
                None => {
                    let (tx, _rx) = broadcast::channel(1);
                    inflight.insert(key.to_string(), tx.clone());
                    Flight::Leader(tx)
                }
            }
        };

        match flight {
            Flight::Follower(mut rx) => match rx.recv().await {
                Ok(Ok(value)) => serde_json::from_value(value).map_err(error::Error::from),
                Ok(Err(err)) => Err(err),
                // Leader dropped mid-flight; whatever it managed to cache is
                // still usable.
                Err(_) => match self.get::<T>(key).await? {
                    Some(value) => Ok(value),
                    None => Err(error::Error::network("shared request was abandoned")),
                },
            },
            Flight::Leader(tx) => {
                let outcome = match fetch().await {
                    Ok(value) => match serde_json::to_value(&value) {
                        Ok(json) => Ok((value, json)),
                        Err(err) => Err(error::Error::from(err)),
                    },
                    Err(err) => Err(err),
                };

                self.inflight.lock().await.remove(key);

                match outcome {
                    Ok((value, json)) => {
                        let mut entries = self.entries.lock().await;
                        entries.insert(
                            key.to_string(),
                            CacheEntry { value: json.clone(), fetched_at: Instant::now(), ttl },
                        );
                        drop(entries);
                        let _ = tx.send(Ok(json));
                        Ok(value)
                    }
                    Err(err) => {
                        let _ = tx.send(Err(err.clone()));
                        Err(err)
                    }
                }
            }
        }
    }

    /// Rewrites the cached value under `key` in place, preserving its
    /// freshness stamp. Returns whether the closure reported a change.
    /// Missing keys are left missing.
    pub async fn update_cached<T, F>(&self, key: &str, apply: F) -> Result<bool, error::Error>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> bool,
    {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get_mut(key) else {
            return Ok(false);
        };

        let mut value: T = serde_json::from_value(entry.value.clone())?;
        if !apply(&mut value) {
            return Ok(false);
        }
        entry.value = serde_json::to_value(&value)?;
        Ok(true)
    }

    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let entries = self.entries.lock().await;
        entries.keys().filter(|k| k.starts_with(prefix)).cloned().collect()
    }

    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    pub async fn invalidate_prefix(&self, prefix: &str) {
        self.entries.lock().await.retain(|k, _| !k.starts_with(prefix));
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Captures every entry under the given prefixes, for exact rollback.
    pub async fn snapshot(&self, prefixes: &[&str]) -> CacheSnapshot {
        let entries = self.entries.lock().await;
        let captured = entries
            .iter()
            .filter(|(k, _)| prefixes.iter().any(|p| k.starts_with(p)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        CacheSnapshot {
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            entries: captured,
        }
    }

    /// Reinstates a snapshot: entries created under the snapshot's prefixes
    /// since the capture are dropped, captured ones return byte-for-byte.
    pub async fn restore(&self, snapshot: CacheSnapshot) {
        let mut entries = self.entries.lock().await;
        entries.retain(|k, _| !snapshot.prefixes.iter().any(|p| k.starts_with(p)));
        for (key, entry) in snapshot.entries {
            entries.insert(key, entry);
        }
    }

    #[cfg(test)]
    pub(crate) async fn dump(&self) -> std::collections::BTreeMap<String, CacheEntry> {
        self.entries.lock().await.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    const MINUTE: Duration = Duration::from_secs(60);

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[tokio::test]
    async fn fresh_read_is_served_without_refetch() {
        init_logging();
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            let value: u32 = cache
                .get_or_fetch("answer", MINUTE, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_entry_refetches_on_next_read() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            cache
                .get_or_fetch::<u32, _, _>("answer", Duration::ZERO, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let cache = QueryCache::new();

        let err = cache
            .get_or_fetch::<u32, _, _>("answer", MINUTE, || async {
                Err(error::Error::network("boom"))
            })
            .await
            .unwrap_err();
        assert_eq!(err, error::Error::network("boom"));

        let value: u32 = cache.get_or_fetch("answer", MINUTE, || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn concurrent_readers_share_one_inflight_fetch() {
        init_logging();
        let cache = Arc::new(QueryCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(AtomicBool::new(false));
        let gate = Arc::new(Notify::new());

        let fetcher = |value: u32| {
            let calls = calls.clone();
            let started = started.clone();
            let gate = gate.clone();
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                started.store(true, Ordering::SeqCst);
                gate.notified().await;
                Ok(value)
            }
        };

        let first = cache.get_or_fetch("shared", MINUTE, fetcher(1));
        let second = cache.get_or_fetch("shared", MINUTE, fetcher(2));
        let release = {
            let started = started.clone();
            let gate = gate.clone();
            async move {
                while !started.load(Ordering::SeqCst) {
                    tokio::task::yield_now().await;
                }
                gate.notify_one();
            }
        };

        let (first, second, _) = tokio::join!(first, second, release);
        // Both observe the leader's value; only one fetch ran.
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_prefix_drops_only_matching_keys() {
        let cache = QueryCache::new();
        cache.get_or_fetch::<u32, _, _>("feed:1", MINUTE, || async { Ok(1) }).await.unwrap();
        cache.get_or_fetch::<u32, _, _>("feed:2", MINUTE, || async { Ok(2) }).await.unwrap();
        cache
            .get_or_fetch::<u32, _, _>("friendships:all", MINUTE, || async { Ok(3) })
            .await
            .unwrap();

        cache.invalidate_prefix("feed:").await;

        assert_eq!(cache.get::<u32>("feed:1").await.unwrap(), None);
        assert_eq!(cache.get::<u32>("feed:2").await.unwrap(), None);
        assert_eq!(cache.get::<u32>("friendships:all").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn restore_reinstates_snapshot_exactly() {
        let cache = QueryCache::new();
        cache.get_or_fetch::<Vec<u32>, _, _>("feed:1", MINUTE, || async { Ok(vec![1, 2]) })
            .await
            .unwrap();
        let before = cache.dump().await;

        let snapshot = cache.snapshot(&["feed:"]).await;
        let changed = cache
            .update_cached::<Vec<u32>, _>("feed:1", |page| {
                page.push(3);
                true
            })
            .await
            .unwrap();
        assert!(changed);
        assert_ne!(cache.dump().await, before);

        cache.restore(snapshot).await;
        assert_eq!(cache.dump().await, before);
    }

    #[tokio::test]
    async fn update_cached_on_missing_key_is_a_noop() {
        let cache = QueryCache::new();
        let changed =
            cache.update_cached::<Vec<u32>, _>("feed:9", |_| true).await.unwrap();
        assert!(!changed);
    }
}
