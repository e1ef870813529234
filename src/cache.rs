use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

/// Expiry used when `now + ttl` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deterministic cache key for an operation and its arguments.
///
/// SHA-256 over the JSON array `[operation, args...]`, hex encoded. Argument
/// order is part of the key.
pub fn cache_key(operation: &str, args: &[Value]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(Value::from(operation));
    parts.extend_from_slice(args);
    let canonical = Value::Array(parts).to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Fill lock for one key plus the number of callers holding a slot on it.
#[derive(Debug, Default)]
struct Inflight {
    lock: Arc<Mutex<()>>,
    holders: usize,
}

type InflightMap = StdMutex<HashMap<String, Inflight>>;

fn lock_map(map: &InflightMap) -> MutexGuard<'_, HashMap<String, Inflight>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A caller's registration on a key's fill lock. Dropping it, including when
/// the owning future is cancelled, releases the registration and removes the
/// entry once nobody holds it.
struct InflightSlot<'a> {
    map: &'a InflightMap,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> InflightSlot<'a> {
    fn join(map: &'a InflightMap, key: &'a str) -> Self {
        let mut inflight = lock_map(map);
        let entry = inflight.entry(key.to_string()).or_default();
        entry.holders += 1;
        Self {
            map,
            key,
            lock: entry.lock.clone(),
        }
    }
}

impl Drop for InflightSlot<'_> {
    fn drop(&mut self) {
        let mut inflight = lock_map(self.map);
        if let Some(entry) = inflight.get_mut(self.key) {
            entry.holders -= 1;
            if entry.holders == 0 {
                inflight.remove(self.key);
            }
        }
    }
}

/// In-memory response cache with per-entry expiry.
///
/// Expired entries are invisible to readers and are removed lazily when read.
/// Nothing survives a restart.
#[derive(Debug)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    // One lock per key currently being filled, so concurrent misses on the
    // same key wait for a single upstream fetch.
    inflight: InflightMap,
    default_ttl: Duration,
}

impl ResponseCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: StdMutex::new(HashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.is_live(now) => {
                    return serde_json::from_value(entry.value.clone())
                        .inspect_err(|e| tracing::warn!("Cached value for {} has unexpected shape: {}", key, e))
                        .ok();
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
            tracing::debug!("Evicted expired cache entry {}", key);
        }
        None
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Not caching {}: {}", key, e);
                return;
            }
        };
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now.checked_add(FAR_FUTURE).unwrap_or(now));
        let entry = CacheEntry { value, expires_at };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Empties the cache and returns how many entries it held.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Number of entries that have not expired yet.
    pub async fn live_entries(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|entry| entry.is_live(now)).count()
    }

    /// Returns the cached value for `key`, or runs `fill` and caches its
    /// successful result for `ttl`.
    ///
    /// Concurrent callers missing on the same key are serialized: the first one
    /// runs `fill`, the others wait and then read its result from the cache.
    /// Errors are returned to the caller that produced them and never cached.
    pub async fn get_or_try_insert_with<T, E, F, Fut>(&self, key: &str, ttl: Duration, fill: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get(key).await {
            tracing::debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let slot = InflightSlot::join(&self.inflight, key);
        let _filling = slot.lock.lock().await;

        match self.get(key).await {
            Some(hit) => {
                tracing::debug!("Cache filled by concurrent request for {}", key);
                Ok(hit)
            }
            None => {
                tracing::debug!("Cache miss for {}", key);
                let result = fill().await;
                if let Ok(value) = &result {
                    self.put(key, value, ttl).await;
                }
                result
            }
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_put_get() {
        let cache = Arc::new(ResponseCache::new(TTL));
        let key = cache_key("search_docs", &[json!("agent"), json!(5)]);

        assert!(cache.get::<Vec<String>>(&key).await.is_none());

        cache.put(&key, &vec!["a".to_string(), "b".to_string()], TTL).await;

        assert_eq!(cache.get::<Vec<String>>(&key).await, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_until_ttl_elapses() {
        let cache = ResponseCache::new(TTL);
        cache.put("k", &"value", Duration::from_secs(10)).await;

        tokio::time::advance(Duration::from_millis(9_999)).await;
        assert_eq!(cache.get::<String>("k").await.as_deref(), Some("value"));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get::<String>("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_ttl_does_not_overflow() {
        let cache = ResponseCache::new(TTL);
        cache.put("k", &1u32, Duration::from_secs(u64::MAX)).await;

        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
        assert_eq!(cache.get::<u32>("k").await, Some(1));
        assert_eq!(cache.live_entries().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_evicted_on_read() {
        let cache = ResponseCache::new(TTL);
        cache.put("k", &1u32, Duration::from_secs(1)).await;
        assert_eq!(cache.entries.read().await.len(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.live_entries().await, 0);
        assert_eq!(cache.entries.read().await.len(), 1, "no background sweeping");

        assert!(cache.get::<u32>("k").await.is_none());
        assert!(cache.entries.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = ResponseCache::new(TTL);
        cache.put("k", &"old", TTL).await;
        cache.put("k", &"new", TTL).await;
        assert_eq!(cache.get::<String>("k").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_clear_returns_prior_size() {
        let cache = ResponseCache::new(TTL);
        cache.put("a", &1, TTL).await;
        cache.put("b", &2, TTL).await;

        assert_eq!(cache.clear().await, 2);
        assert!(cache.get::<i32>("a").await.is_none());
        assert_eq!(cache.clear().await, 0);
    }

    #[test]
    fn test_cache_key_determinism() {
        let a = cache_key("search_docs", &[json!("agent"), json!(5)]);
        let b = cache_key("search_docs", &[json!("agent"), json!(5)]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        assert_ne!(a, cache_key("search_docs", &[json!("agent"), json!(6)]));
        assert_ne!(a, cache_key("search_api", &[json!("agent"), json!(5)]));
        assert_ne!(
            cache_key("op", &[json!("x"), json!("y")]),
            cache_key("op", &[json!("y"), json!("x")])
        );
        assert_ne!(cache_key("op", &[json!(null)]), cache_key("op", &[json!("null")]));
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_caches_success() {
        let cache = ResponseCache::new(TTL);
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<String, String> = cache
                .get_or_try_insert_with("k", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("fresh".to_string())
                })
                .await;
            assert_eq!(value.unwrap(), "fresh");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_with_does_not_cache_errors() {
        let cache = ResponseCache::new(TTL);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Result<String, String> = cache
                .get_or_try_insert_with("k", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("upstream down".to_string())
                })
                .await;
            assert!(value.is_err());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.live_entries().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let cache = Arc::new(ResponseCache::new(TTL));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_try_insert_with("shared", TTL, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok::<_, String>(42u32)
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(42));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(lock_map(&cache.inflight).is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_fill_releases_key() {
        let cache = Arc::new(ResponseCache::new(TTL));

        let task = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .get_or_try_insert_with("slow", TTL, || async {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok::<_, String>(1u32)
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(lock_map(&cache.inflight).len(), 1);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(lock_map(&cache.inflight).is_empty());

        let value: Result<u32, String> = cache.get_or_try_insert_with("slow", TTL, || async { Ok(2) }).await;
        assert_eq!(value, Ok(2));
    }
}
