//! In-process cache implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::Cache;

struct Entry {
    value: Value,
    expires_at: Instant,
}

/// DashMap-backed cache with per-entry deadlines.
///
/// Expired entries are evicted lazily on read; [`MemoryCache::sweep`]
/// removes all expired entries and is intended for a periodic background
/// task. Both strategies satisfy the contract — TTL enforcement is an
/// implementation detail of the backing store.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!(dropped, "cache sweep removed expired entries");
        }
        dropped
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            None => return None,
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }
        // Evict-on-read. remove_if re-checks the deadline so a concurrent
        // fresh set for the same key is not lost.
        let _ = self
            .entries
            .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
        None
    }

    async fn set(&self, key: &str, value: Value, ttl_secs: u64) {
        if ttl_secs == 0 {
            return;
        }
        let _ = self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
    }

    async fn clear(&self) {
        self.entries.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get() {
        let cache = MemoryCache::new();
        cache.set("k", json!({"a": 1}), 60).await;
        assert_eq!(cache.get("k").await, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("nope").await, None);
    }

    #[tokio::test]
    async fn zero_ttl_stores_nothing() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), 0).await;
        assert_eq!(cache.get("k").await, None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), 60).await;
        cache.set("k", json!(2), 60).await;
        assert_eq!(cache.get("k").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = MemoryCache::new();
        cache.set("a", json!(1), 60).await;
        cache.set("b", json!(2), 60).await;
        cache.clear().await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, None);
        assert!(cache.is_empty());
    }

    /// Force a stored entry's deadline into the past (tests run on the real
    /// clock; TTLs are whole seconds, too coarse to sleep through).
    fn expire(cache: &MemoryCache, key: &str) {
        cache.entries.get_mut(key).unwrap().expires_at = Instant::now();
    }

    #[tokio::test]
    async fn expired_entry_evicted_on_read() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), 60).await;
        expire(&cache, "k");
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(cache.get("k").await, None);
        assert!(cache.is_empty(), "read should have evicted the entry");
    }

    #[tokio::test]
    async fn sweep_removes_only_expired() {
        let cache = MemoryCache::new();
        cache.set("short", json!(1), 60).await;
        cache.set("long", json!(2), 600).await;
        expire(&cache, "short");
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.get("long").await, Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_access_from_many_tasks() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let cache = std::sync::Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let key = format!("k{}", i % 4);
                cache.set(&key, json!(i), 60).await;
                let _ = cache.get(&key).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // Last write wins per key; all four keys must hold some value.
        for i in 0..4 {
            assert!(cache.get(&format!("k{i}")).await.is_some());
        }
    }
}
