//! Secret resolution for integrations.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use glance_core::IntegrationMetadata;

use crate::errors::SandboxError;

/// Resolves the secrets an integration declared in `requiredSecrets`.
///
/// Implementations must fail if **any** declared key is unresolvable; a
/// partial secret set never reaches a module. The resolved map contains
/// exactly the declared keys — least privilege, never the full store.
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Resolve every declared secret or fail.
    async fn get_secrets_for(
        &self,
        metadata: &IntegrationMetadata,
    ) -> Result<HashMap<String, String>, SandboxError>;
}

/// Resolves secrets from the process environment.
///
/// Tries the declared name verbatim first, then the
/// `GLANCE_SECRET_<UPPER_SNAKE>` form (dashes become underscores).
pub struct EnvSecretsProvider {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl EnvSecretsProvider {
    /// Provider backed by `std::env::var`.
    pub fn new() -> Self {
        Self {
            lookup: Box::new(|name| std::env::var(name).ok()),
        }
    }

    /// Provider backed by an arbitrary lookup (hermetic tests).
    pub fn with_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }

    fn prefixed(name: &str) -> String {
        let upper: String = name
            .chars()
            .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() })
            .collect();
        format!("GLANCE_SECRET_{upper}")
    }
}

impl Default for EnvSecretsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretsProvider for EnvSecretsProvider {
    async fn get_secrets_for(
        &self,
        metadata: &IntegrationMetadata,
    ) -> Result<HashMap<String, String>, SandboxError> {
        let mut resolved = HashMap::with_capacity(metadata.required_secrets.len());
        for key in &metadata.required_secrets {
            let value = (self.lookup)(key).or_else(|| (self.lookup)(&Self::prefixed(key)));
            match value {
                Some(value) => {
                    let _ = resolved.insert(key.clone(), value);
                }
                None => {
                    return Err(SandboxError::MissingSecret {
                        name: metadata.name.clone(),
                        key: key.clone(),
                    });
                }
            }
        }
        debug!(
            integration = %metadata.name,
            count = resolved.len(),
            "resolved declared secrets"
        );
        Ok(resolved)
    }
}

/// Fixed-map provider for tests and embedded deployments.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretsProvider {
    values: HashMap<String, String>,
}

impl StaticSecretsProvider {
    /// Provider holding the given secret values.
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

#[async_trait]
impl SecretsProvider for StaticSecretsProvider {
    async fn get_secrets_for(
        &self,
        metadata: &IntegrationMetadata,
    ) -> Result<HashMap<String, String>, SandboxError> {
        let mut resolved = HashMap::with_capacity(metadata.required_secrets.len());
        for key in &metadata.required_secrets {
            match self.values.get(key) {
                Some(value) => {
                    let _ = resolved.insert(key.clone(), value.clone());
                }
                None => {
                    return Err(SandboxError::MissingSecret {
                        name: metadata.name.clone(),
                        key: key.clone(),
                    });
                }
            }
        }
        Ok(resolved)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(secrets: &[&str]) -> IntegrationMetadata {
        serde_json::from_value(json!({
            "name": "pagerduty",
            "match": { "contextType": "*" },
            "requiredSecrets": secrets,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn env_provider_resolves_exact_name() {
        let provider = EnvSecretsProvider::with_lookup(|name| {
            (name == "PAGERDUTY_TOKEN").then(|| "tok-1".to_string())
        });
        let resolved = provider
            .get_secrets_for(&metadata(&["PAGERDUTY_TOKEN"]))
            .await
            .unwrap();
        assert_eq!(resolved["PAGERDUTY_TOKEN"], "tok-1");
    }

    #[tokio::test]
    async fn env_provider_falls_back_to_prefixed_name() {
        let provider = EnvSecretsProvider::with_lookup(|name| {
            (name == "GLANCE_SECRET_API_KEY").then(|| "tok-2".to_string())
        });
        let resolved = provider
            .get_secrets_for(&metadata(&["api-key"]))
            .await
            .unwrap();
        // Resolved under the declared name, not the env var name.
        assert_eq!(resolved["api-key"], "tok-2");
    }

    #[tokio::test]
    async fn env_provider_errors_on_any_missing_key() {
        let provider = EnvSecretsProvider::with_lookup(|name| {
            (name == "PRESENT").then(|| "v".to_string())
        });
        let err = provider
            .get_secrets_for(&metadata(&["PRESENT", "ABSENT"]))
            .await
            .unwrap_err();
        match err {
            SandboxError::MissingSecret { name, key } => {
                assert_eq!(name, "pagerduty");
                assert_eq!(key, "ABSENT");
            }
            other => panic!("expected MissingSecret, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn static_provider_returns_only_declared_keys() {
        let provider = StaticSecretsProvider::new(HashMap::from([
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), "2".to_string()),
        ]));
        let resolved = provider.get_secrets_for(&metadata(&["A"])).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert!(!resolved.contains_key("B"), "undeclared secret must not leak");
    }

    #[tokio::test]
    async fn no_declared_secrets_resolves_empty() {
        let provider = StaticSecretsProvider::default();
        let resolved = provider.get_secrets_for(&metadata(&[])).await.unwrap();
        assert!(resolved.is_empty());
    }
}
