//! Short-lived response cache shared by all planning branches
//!
//! Read-through, write-on-miss store keyed by (provider, query fingerprint).
//! Entries expire by TTL (configurable per provider) and the total entry
//! count is capped with least-recently-used eviction. Concurrent lookups for
//! the same key coalesce into a single provider call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::OnceCell;

use crate::config::CacheConfig;
use crate::error::{ProviderFault, ProviderResult};
use crate::providers::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    provider: ProviderId,
    fingerprint: u64,
}

struct CacheEntry {
    payload: Value,
    inserted_at: Instant,
    last_accessed: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }
}

/// In-process response cache with single-flight coalescing.
///
/// Owned by the process, shared across branches behind an `Arc`. Entries die
/// with the process; there is no persistence.
pub struct ResponseCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    inflight: Mutex<HashMap<CacheKey, Arc<OnceCell<Value>>>>,
    config: CacheConfig,
}

impl ResponseCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn ttl_for(&self, provider: ProviderId) -> Duration {
        let seconds = match provider {
            ProviderId::Flights => self.config.flights_ttl_seconds,
            ProviderId::Hotels => self.config.hotels_ttl_seconds,
            ProviderId::Attractions => self.config.attractions_ttl_seconds,
            ProviderId::Weather => self.config.weather_ttl_seconds,
            // Narratives are plan-specific and never routed through the cache
            ProviderId::Synthesizer => 0,
        };
        Duration::from_secs(seconds)
    }

    /// Fresh payload for the key, or `None` on miss/expiry.
    #[must_use]
    pub fn get(&self, provider: ProviderId, fingerprint: u64) -> Option<Value> {
        let key = CacheKey {
            provider,
            fingerprint,
        };
        let ttl = self.ttl_for(provider);
        let mut entries = self.entries.lock().unwrap();

        match entries.get_mut(&key) {
            Some(entry) if entry.is_expired(ttl) => {
                tracing::debug!(provider = %provider, "cache entry expired");
                entries.remove(&key);
                None
            }
            Some(entry) => {
                entry.last_accessed = Instant::now();
                Some(entry.payload.clone())
            }
            None => None,
        }
    }

    /// Store a successful payload, evicting the least recently used entries
    /// beyond the configured capacity.
    pub fn put(&self, provider: ProviderId, fingerprint: u64, payload: Value) {
        let key = CacheKey {
            provider,
            fingerprint,
        };
        let mut entries = self.entries.lock().unwrap();

        while entries.len() >= self.config.max_entries && !entries.contains_key(&key) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(k, _)| *k);
            match oldest {
                Some(k) => {
                    entries.remove(&k);
                }
                None => break,
            }
        }

        let now = Instant::now();
        entries.insert(
            key,
            CacheEntry {
                payload,
                inserted_at: now,
                last_accessed: now,
            },
        );
    }

    /// Read-through lookup: return the cached payload when fresh, otherwise
    /// run `fetch` and store its result.
    ///
    /// Concurrent callers with the same key share one in-flight `fetch`; a
    /// failed fetch is not stored, so the next caller tries again.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        provider: ProviderId,
        fingerprint: u64,
        fetch: F,
    ) -> ProviderResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<Value>>,
    {
        if let Some(hit) = self.get(provider, fingerprint) {
            tracing::debug!(provider = %provider, "cache hit");
            return Ok(hit);
        }

        let key = CacheKey {
            provider,
            fingerprint,
        };
        let cell = self
            .inflight
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .clone();

        let result = cell
            .get_or_try_init(|| async move {
                let payload = fetch().await?;
                self.put(provider, fingerprint, payload.clone());
                Ok::<Value, ProviderFault>(payload)
            })
            .await
            .cloned();

        let mut inflight = self.inflight.lock().unwrap();
        if let Some(existing) = inflight.get(&key) {
            if Arc::ptr_eq(existing, &cell) {
                inflight.remove(&key);
            }
        }

        result
    }

    /// Number of stored entries, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config(ttl_seconds: u64, max_entries: usize) -> CacheConfig {
        CacheConfig {
            flights_ttl_seconds: ttl_seconds,
            hotels_ttl_seconds: ttl_seconds,
            attractions_ttl_seconds: ttl_seconds,
            weather_ttl_seconds: ttl_seconds,
            max_entries,
        }
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let cache = ResponseCache::new(test_config(60, 16));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let payload = cache
                .get_or_fetch(ProviderId::Hotels, 42, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"properties": []}))
                })
                .await
                .unwrap();
            assert_eq!(payload, json!({"properties": []}));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_coalesce() {
        let cache = Arc::new(ResponseCache::new(test_config(60, 16)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(ProviderId::Flights, 7, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Ok(json!({"data": []}))
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), json!({"data": []}));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetched() {
        let cache = ResponseCache::new(CacheConfig {
            weather_ttl_seconds: 1,
            ..test_config(60, 16)
        });
        cache.put(ProviderId::Weather, 1, json!({"old": true}));
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(cache.get(ProviderId::Weather, 1).is_none());

        let calls = AtomicUsize::new(0);
        let payload = cache
            .get_or_fetch(ProviderId::Weather, 1, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"old": false}))
            })
            .await
            .unwrap();
        assert_eq!(payload, json!({"old": false}));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_not_cached() {
        let cache = ResponseCache::new(test_config(60, 16));
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_fetch(ProviderId::Attractions, 5, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderFault::transient("connection reset"))
            })
            .await;
        assert!(first.is_err());

        let second = cache
            .get_or_fetch(ProviderId::Attractions, 5, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"organic_results": []}))
            })
            .await;
        assert!(second.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = ResponseCache::new(test_config(60, 2));
        cache.put(ProviderId::Hotels, 1, json!(1));
        cache.put(ProviderId::Hotels, 2, json!(2));

        // Touch key 1 so key 2 becomes the eviction candidate
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get(ProviderId::Hotels, 1).is_some());

        cache.put(ProviderId::Hotels, 3, json!(3));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(ProviderId::Hotels, 1).is_some());
        assert!(cache.get(ProviderId::Hotels, 2).is_none());
        assert!(cache.get(ProviderId::Hotels, 3).is_some());
    }
}
