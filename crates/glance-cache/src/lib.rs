//! # glance-cache
//!
//! Key→value store with per-entry TTL.
//!
//! Two surfaces over the same store:
//!
//! - the [`Cache`] trait, used by the orchestrator to memoize validated
//!   integration results and by the registry to clear everything on reload;
//! - the [`NamespacedCache`] facade, which prefixes every key with
//!   `i:<integrationName>:` and is the only cache surface a running module
//!   ever sees — a module's self-managed entries cannot collide with, or be
//!   mistaken for, the orchestrator's result cache.
//!
//! [`MemoryCache`] is the in-process implementation (DashMap + monotonic
//! deadlines). Any backend implementing [`Cache`] can substitute — the rest
//! of the engine depends only on the trait.
//!
//! ## Crate Position
//!
//! Standalone. Depended on by: glance-registry, glance-sandbox,
//! glance-runtime.

#![deny(unsafe_code)]

pub mod memory;

pub use memory::MemoryCache;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// Key→value store with per-entry TTL, shared across execution cycles.
///
/// Concurrent `get`/`set` from multiple cycles (and from modules' own
/// namespaced usage) must not corrupt state; last-write-wins per key is
/// acceptable and no cross-key transactional guarantees exist.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a live value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store a value for `ttl_secs` seconds. A zero TTL stores nothing.
    async fn set(&self, key: &str, value: Value, ttl_secs: u64);

    /// Drop every entry. Invoked by the registry on integration reload so
    /// no stale result from a removed or changed module can be served.
    async fn clear(&self);
}

/// Prefixing facade handed to running modules.
///
/// Wraps a shared [`Cache`] and rewrites every key to
/// `i:<integrationName>:<key>`. The integration name grammar requires at
/// least four characters, so module keys can never collide with the
/// orchestrator's `<name>:<derived>` result keys.
#[derive(Clone)]
pub struct NamespacedCache {
    inner: Arc<dyn Cache>,
    prefix: String,
}

impl NamespacedCache {
    /// Create a facade scoped to the given integration name.
    pub fn new(inner: Arc<dyn Cache>, integration_name: &str) -> Self {
        Self {
            inner,
            prefix: format!("i:{integration_name}:"),
        }
    }

    /// Namespaced get.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(&format!("{}{key}", self.prefix)).await
    }

    /// Namespaced set.
    pub async fn set(&self, key: &str, value: Value, ttl_secs: u64) {
        self.inner
            .set(&format!("{}{key}", self.prefix), value, ttl_secs)
            .await;
    }
}

impl std::fmt::Debug for NamespacedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
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
    async fn namespaced_keys_do_not_leak_across_integrations() {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        let a = NamespacedCache::new(Arc::clone(&cache), "pagerduty");
        let b = NamespacedCache::new(Arc::clone(&cache), "grafana");

        a.set("token", json!("secret-a"), 60).await;
        assert_eq!(a.get("token").await, Some(json!("secret-a")));
        assert_eq!(b.get("token").await, None);
    }

    #[tokio::test]
    async fn namespaced_entries_are_distinct_from_raw_keys() {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        let facade = NamespacedCache::new(Arc::clone(&cache), "pagerduty");

        facade.set("result", json!(1), 60).await;
        // The raw key space sees the prefixed entry, not the bare one.
        assert_eq!(cache.get("result").await, None);
        assert_eq!(cache.get("i:pagerduty:result").await, Some(json!(1)));
    }

    #[tokio::test]
    async fn clear_wipes_namespaced_entries_too() {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        let facade = NamespacedCache::new(Arc::clone(&cache), "pagerduty");

        facade.set("x", json!(true), 60).await;
        cache.clear().await;
        assert_eq!(facade.get("x").await, None);
    }
}
