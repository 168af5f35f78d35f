//! Snapshot-based integration registry and context resolution.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use glance_cache::Cache;
use glance_core::{Context, Integration};
use glance_rules::evaluate;

/// Immutable, validated, priority-ordered integration set.
///
/// Built fully before publication; never mutated afterwards.
#[derive(Debug, Default)]
struct RegistrySnapshot {
    /// Sorted by priority descending; equal priorities keep load order.
    integrations: Vec<Arc<Integration>>,
}

/// Summary of one wholesale load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// How many integrations made it into the active snapshot.
    pub loaded: usize,
    /// `(id, reason)` for every integration excluded by validation.
    pub skipped: Vec<(String, String)>,
}

/// Registry owning the integration set for its lifetime.
///
/// The set is replaced wholesale by [`IntegrationRegistry::load`]; there is
/// no partial mutation. [`IntegrationRegistry::resolve`] is lock-cheap: it
/// clones the snapshot `Arc` and works off the immutable set.
pub struct IntegrationRegistry {
    snapshot: RwLock<Arc<RegistrySnapshot>>,
    cache: Arc<dyn Cache>,
}

impl IntegrationRegistry {
    /// Create an empty registry sharing the engine's result cache.
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(RegistrySnapshot::default())),
            cache,
        }
    }

    /// Replace the integration set wholesale and clear the result cache.
    ///
    /// Structurally invalid metadata excludes that integration (logged,
    /// reported) without failing the load. Duplicate names keep the last
    /// occurrence — rejecting would fail a whole reload over one module,
    /// which the per-integration isolation contract forbids.
    pub async fn load(&self, integrations: Vec<Integration>) -> LoadReport {
        let mut accepted: Vec<Arc<Integration>> = Vec::with_capacity(integrations.len());
        let mut skipped = Vec::new();

        for integration in integrations {
            if let Err(err) = integration.metadata.validate() {
                warn!(
                    integration = %integration.id,
                    error = %err,
                    "excluding integration with invalid metadata"
                );
                skipped.push((integration.id.clone(), err.to_string()));
                continue;
            }
            if let Some(pos) = accepted
                .iter()
                .position(|existing| existing.name() == integration.name())
            {
                warn!(
                    name = integration.name(),
                    "duplicate integration name, keeping the later one"
                );
                let _ = accepted.remove(pos);
            }
            accepted.push(Arc::new(integration));
        }

        // Stable sort: equal priorities retain load order, which is an
        // externally observable contract (result ordering).
        accepted.sort_by(|a, b| b.metadata.priority.cmp(&a.metadata.priority));

        let report = LoadReport {
            loaded: accepted.len(),
            skipped,
        };

        let snapshot = Arc::new(RegistrySnapshot {
            integrations: accepted,
        });
        *self.snapshot.write() = snapshot;

        // New set is live; stale memoized results must not outlive it.
        self.cache.clear().await;

        info!(loaded = report.loaded, skipped = report.skipped.len(), "integration set loaded");
        report
    }

    /// All integrations matching the context, priority descending.
    ///
    /// Never errors: a context without a usable `url` resolves to nothing,
    /// and rule evaluation failures simply exclude that integration.
    pub fn resolve(&self, context: &Context) -> Vec<Arc<Integration>> {
        if context.url().is_empty() {
            return Vec::new();
        }

        let snapshot = Arc::clone(&self.snapshot.read());

        snapshot
            .integrations
            .iter()
            .filter(|integration| {
                let match_spec = &integration.metadata.match_spec;
                if match_spec.context_type != "*"
                    && match_spec.context_type != context.context_type()
                {
                    return false;
                }
                let outcome = evaluate(context, &match_spec.context);
                debug!(
                    integration = integration.name(),
                    is_valid = outcome.is_valid,
                    paths = ?outcome.matched_paths,
                    "rule evaluation"
                );
                outcome.is_valid
            })
            .map(Arc::clone)
            .collect()
    }

    /// Number of integrations in the active snapshot.
    pub fn len(&self) -> usize {
        self.snapshot.read().integrations.len()
    }

    /// Whether the active snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.snapshot.read().integrations.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use glance_cache::MemoryCache;
    use serde_json::json;

    fn integration(name: &str, context_type: &str, priority: u32) -> Integration {
        serde_json::from_value(json!({
            "id": name,
            "code": "module.exports = {}",
            "metadata": {
                "name": name,
                "match": { "contextType": context_type },
                "priority": priority,
            },
        }))
        .unwrap()
    }

    fn registry() -> (IntegrationRegistry, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        let registry = IntegrationRegistry::new(cache.clone() as Arc<dyn Cache>);
        (registry, cache)
    }

    fn github_context() -> Context {
        Context::from_value(json!({
            "type": "github",
            "url": "https://github.com/acme/widgets",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn resolve_filters_by_context_type() {
        let (registry, _cache) = registry();
        let _ = registry
            .load(vec![
                integration("gh-deploys", "github", 100),
                integration("jira-board", "jira", 100),
            ])
            .await;

        let resolved = registry.resolve(&github_context());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name(), "gh-deploys");
    }

    #[tokio::test]
    async fn wildcard_matches_any_context_type() {
        let (registry, _cache) = registry();
        let _ = registry.load(vec![integration("everywhere", "*", 100)]).await;

        assert_eq!(registry.resolve(&github_context()).len(), 1);
    }

    #[tokio::test]
    async fn resolve_applies_context_rules() {
        let (registry, _cache) = registry();
        let with_rules: Integration = serde_json::from_value(json!({
            "id": "scoped",
            "code": "",
            "metadata": {
                "name": "scoped",
                "match": {
                    "contextType": "github",
                    "context": { "url": { "startsWith": "https://gitlab.com/" } },
                },
            },
        }))
        .unwrap();
        let _ = registry.load(vec![with_rules]).await;

        assert!(registry.resolve(&github_context()).is_empty());
    }

    #[tokio::test]
    async fn resolve_orders_by_priority_then_load_order() {
        let (registry, _cache) = registry();
        let _ = registry
            .load(vec![
                integration("low-prio", "github", 10),
                integration("first-default", "github", 100),
                integration("second-default", "github", 100),
                integration("urgent", "github", 900),
            ])
            .await;

        let names: Vec<String> = registry
            .resolve(&github_context())
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["urgent", "first-default", "second-default", "low-prio"]
        );
    }

    #[tokio::test]
    async fn invalid_metadata_excluded_and_reported() {
        let (registry, _cache) = registry();
        let report = registry
            .load(vec![
                integration("ok-module", "github", 100),
                integration("bad", "github", 100), // name too short
            ])
            .await;

        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "bad");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_name_keeps_later_entry() {
        let (registry, _cache) = registry();
        let mut second = integration("gh-deploys", "github", 100);
        second.code = "updated".into();
        let report = registry
            .load(vec![integration("gh-deploys", "github", 100), second])
            .await;

        assert_eq!(report.loaded, 1);
        let resolved = registry.resolve(&github_context());
        assert_eq!(resolved[0].code, "updated");
    }

    #[tokio::test]
    async fn reload_replaces_wholesale_and_clears_cache() {
        let (registry, cache) = registry();
        let _ = registry.load(vec![integration("gh-deploys", "github", 100)]).await;

        cache.set("gh-deploys:key", json!(["cached"]), 600).await;
        assert!(cache.get("gh-deploys:key").await.is_some());

        let _ = registry.load(vec![integration("jira-board", "jira", 100)]).await;

        // Old set gone, cache cleared.
        assert!(registry.resolve(&github_context()).is_empty());
        assert_eq!(cache.get("gh-deploys:key").await, None);
    }
}
