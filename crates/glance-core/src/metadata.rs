//! Author-declared integration metadata and the loaded integration record.

use std::path::PathBuf;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::MetadataError;
use crate::rule::Rule;

/// Default TTL for cached integration results (seconds).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Upper bound for declared cache TTLs: 30 days.
pub const MAX_CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Default priority when the author declares none.
pub const DEFAULT_PRIORITY: u32 = 100;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_-]{3,}$").unwrap());

/// Declarative matching block: which contexts an integration applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSpec {
    /// Context discriminator this integration applies to, or `"*"` for any.
    pub context_type: String,
    /// Dotted context path → rule. Declaration order is preserved because
    /// it drives auto-derived cache keys.
    #[serde(default)]
    pub context: IndexMap<String, Rule>,
}

/// Author-declared metadata for one integration, schema-validated on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationMetadata {
    /// Unique lowercase slug, `^[a-z][a-z0-9_-]{3,}$`.
    pub name: String,
    /// Context-matching block.
    #[serde(rename = "match")]
    pub match_spec: MatchSpec,
    /// TTL in seconds for successful results.
    #[serde(rename = "cache", default = "default_cache_ttl")]
    pub cache_ttl: u64,
    /// Secret names the module needs; all must resolve or the run fails.
    #[serde(default)]
    pub required_secrets: Vec<String>,
    /// Explicit context paths for cache key construction, overriding
    /// auto-derivation from `match.context`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<Vec<String>>,
    /// 1–1000, higher runs and sorts first.
    #[serde(default = "default_priority")]
    pub priority: u32,
}

const fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

const fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

impl IntegrationMetadata {
    /// Validate structural invariants the serde schema cannot express.
    pub fn validate(&self) -> Result<(), MetadataError> {
        if !NAME_PATTERN.is_match(&self.name) {
            return Err(MetadataError::InvalidName(self.name.clone()));
        }
        if self.match_spec.context_type.is_empty() {
            return Err(MetadataError::EmptyContextType(self.name.clone()));
        }
        if !(1..=1000).contains(&self.priority) {
            return Err(MetadataError::PriorityOutOfRange {
                name: self.name.clone(),
                priority: self.priority,
            });
        }
        for (path, rule) in &self.match_spec.context {
            if let Rule::Pattern(pattern) = rule {
                if let Err(err) = Regex::new(pattern) {
                    return Err(MetadataError::InvalidPattern {
                        name: self.name.clone(),
                        path: path.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Declared TTL clamped to the 30-day ceiling.
    pub fn effective_cache_ttl(&self) -> u64 {
        self.cache_ttl.min(MAX_CACHE_TTL_SECS)
    }

    /// Context paths to build this integration's result cache key from.
    ///
    /// Explicit `cacheKey` wins; otherwise the `match.context` paths in
    /// declaration order; `None` means the result is never cached.
    pub fn cache_key_paths(&self) -> Option<Vec<&str>> {
        if let Some(paths) = &self.cache_key {
            if !paths.is_empty() {
                return Some(paths.iter().map(String::as_str).collect());
            }
        }
        if self.match_spec.context.is_empty() {
            return None;
        }
        Some(self.match_spec.context.keys().map(String::as_str).collect())
    }
}

/// An auxiliary static data file shipped alongside an integration.
///
/// Loaded by the engine and passed to the module verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFile {
    /// File name relative to the integration's `data/` directory.
    pub name: String,
    /// Full file content.
    pub content: String,
}

/// Where an integration's source lives on disk.
///
/// Workers execute with `dir` as their working directory so sibling imports
/// (`require('./helper')`) resolve next to the module, not next to the
/// engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    /// The integration's own directory.
    pub dir: PathBuf,
    /// Entry script path inside `dir`.
    pub entry: PathBuf,
}

/// One loaded integration: identity, source text, and declared metadata.
///
/// Loaded wholesale by a loader, held for the registry snapshot's lifetime,
/// replaced wholesale on reload. Never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    /// Loader-assigned identifier (directory name for the fs loader).
    pub id: String,
    /// Entry script source text.
    pub code: String,
    /// Author-declared metadata.
    pub metadata: IntegrationMetadata,
    /// Auxiliary data files passed to the module verbatim.
    #[serde(default)]
    pub data_files: Vec<DataFile>,
    /// On-disk location, when the loader read the module from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLocation>,
}

impl Integration {
    /// The declared integration name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn minimal(name: &str) -> IntegrationMetadata {
        serde_json::from_value(json!({
            "name": name,
            "match": { "contextType": "github" },
        }))
        .unwrap()
    }

    #[test]
    fn defaults_applied() {
        let meta = minimal("pagerduty");
        assert_eq!(meta.cache_ttl, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(meta.priority, DEFAULT_PRIORITY);
        assert!(meta.required_secrets.is_empty());
        assert!(meta.cache_key.is_none());
        assert!(meta.match_spec.context.is_empty());
    }

    #[test]
    fn valid_names_accepted() {
        for name in ["pagerduty", "gh-deploys", "team_prs", "a123"] {
            assert!(minimal(name).validate().is_ok(), "{name} should validate");
        }
    }

    #[test]
    fn invalid_names_rejected() {
        for name in ["abc", "Pagerduty", "9lives", "has space", ""] {
            assert_matches!(
                minimal(name).validate(),
                Err(MetadataError::InvalidName(_)),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn priority_bounds_enforced() {
        let mut meta = minimal("pagerduty");
        meta.priority = 0;
        assert_matches!(
            meta.validate(),
            Err(MetadataError::PriorityOutOfRange { priority: 0, .. })
        );
        meta.priority = 1001;
        assert!(meta.validate().is_err());
        meta.priority = 1000;
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn invalid_pattern_rejected_at_validation() {
        let meta: IntegrationMetadata = serde_json::from_value(json!({
            "name": "pagerduty",
            "match": {
                "contextType": "github",
                "context": { "url": { "pattern": "(" } },
            },
        }))
        .unwrap();
        assert_matches!(meta.validate(), Err(MetadataError::InvalidPattern { .. }));
    }

    #[test]
    fn ttl_clamped_to_thirty_days() {
        let mut meta = minimal("pagerduty");
        meta.cache_ttl = MAX_CACHE_TTL_SECS + 1;
        assert_eq!(meta.effective_cache_ttl(), MAX_CACHE_TTL_SECS);
        meta.cache_ttl = 60;
        assert_eq!(meta.effective_cache_ttl(), 60);
    }

    #[test]
    fn cache_key_paths_prefers_explicit_list() {
        let meta: IntegrationMetadata = serde_json::from_value(json!({
            "name": "pagerduty",
            "match": {
                "contextType": "github",
                "context": { "service.name": { "exists": true } },
            },
            "cacheKey": ["url", "service.name"],
        }))
        .unwrap();
        assert_eq!(meta.cache_key_paths(), Some(vec!["url", "service.name"]));
    }

    #[test]
    fn cache_key_paths_falls_back_to_match_context_order() {
        let meta: IntegrationMetadata = serde_json::from_value(json!({
            "name": "pagerduty",
            "match": {
                "contextType": "github",
                "context": {
                    "service.name": { "exists": true },
                    "url": { "startsWith": "https://" },
                },
            },
        }))
        .unwrap();
        // IndexMap preserves declaration order across the serde round trip.
        assert_eq!(meta.cache_key_paths(), Some(vec!["service.name", "url"]));
    }

    #[test]
    fn cache_key_paths_none_without_rules() {
        assert!(minimal("pagerduty").cache_key_paths().is_none());
    }

    #[test]
    fn metadata_round_trips_with_wire_names() {
        let value = json!({
            "name": "pagerduty",
            "match": {
                "contextType": "github",
                "context": { "service.name": { "exists": true } },
            },
            "cache": 120,
            "requiredSecrets": ["PAGERDUTY_TOKEN"],
            "priority": 250,
        });
        let meta: IntegrationMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(meta.cache_ttl, 120);
        assert_eq!(meta.required_secrets, vec!["PAGERDUTY_TOKEN"]);
        assert_eq!(meta.priority, 250);

        let back = serde_json::to_value(&meta).unwrap();
        assert_eq!(back["match"]["contextType"], "github");
        assert_eq!(back["requiredSecrets"][0], "PAGERDUTY_TOKEN");
        assert_eq!(back["cache"], 120);
    }
}
