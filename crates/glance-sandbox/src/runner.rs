//! The sandbox runner: `should_run` / `run` over a pluggable module runtime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use glance_cache::{Cache, NamespacedCache};
use glance_core::{Context, DataFile, Integration};

use crate::capabilities::CapabilitySet;
use crate::errors::SandboxError;
use crate::protocol::ModuleFunction;
use crate::secrets::SecretsProvider;

/// One function invocation's injected payload.
#[derive(Debug, Clone)]
pub struct ModuleInvocation {
    /// Target function.
    pub function: ModuleFunction,
    /// Structurally-equal copy of the context.
    pub context: Value,
    /// Only the declared secrets.
    pub secrets: HashMap<String, String>,
    /// Auxiliary data files, verbatim.
    pub data_files: Vec<DataFile>,
}

/// Executes one module invocation inside an isolated environment.
///
/// The production implementation is
/// [`ProcessModuleRuntime`](crate::process::ProcessModuleRuntime), which
/// spawns a worker process. Test code implements this trait to inject
/// canned results without spawning anything.
#[async_trait]
pub trait ModuleRuntime: Send + Sync {
    /// Run the invocation to its terminal frame, racing `timeout` and
    /// `cancel`. Returns the module's raw return value, unvalidated.
    async fn invoke(
        &self,
        integration: &Integration,
        invocation: ModuleInvocation,
        capabilities: &CapabilitySet,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Value, SandboxError>;
}

/// Runner timeouts.
#[derive(Debug, Clone, Copy)]
pub struct SandboxConfig {
    /// Short fixed deadline for `shouldRun` predicates, independent of the
    /// main execution timeout.
    pub should_run_timeout: Duration,
    /// Default `run` deadline when the caller does not supply one.
    pub run_timeout: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            should_run_timeout: Duration::from_millis(3_000),
            run_timeout: Duration::from_millis(10_000),
        }
    }
}

/// Public sandbox surface used by the orchestrator.
///
/// Owns the lifetime of each invocation's isolated environment: the
/// capability set is built per call and discarded at completion.
pub struct SandboxRunner {
    runtime: Arc<dyn ModuleRuntime>,
    secrets: Arc<dyn SecretsProvider>,
    cache: Arc<dyn Cache>,
    http: reqwest::Client,
    config: SandboxConfig,
}

impl SandboxRunner {
    /// Assemble a runner from its collaborators.
    pub fn new(
        runtime: Arc<dyn ModuleRuntime>,
        secrets: Arc<dyn SecretsProvider>,
        cache: Arc<dyn Cache>,
        config: SandboxConfig,
    ) -> Self {
        Self {
            runtime,
            secrets,
            cache,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Resolve the integration's declared secrets.
    ///
    /// A failure here aborts the integration before `run` is invoked; the
    /// orchestrator treats it as a run error.
    pub async fn resolve_secrets(
        &self,
        integration: &Integration,
    ) -> Result<HashMap<String, String>, SandboxError> {
        self.secrets.get_secrets_for(&integration.metadata).await
    }

    /// Evaluate the module's optional applicability predicate. Fail-closed:
    /// any error, malformed value, or timeout skips the module.
    ///
    /// A `null` return means the module declares no predicate — always run.
    pub async fn should_run(
        &self,
        integration: &Integration,
        context: &Context,
        secrets: &HashMap<String, String>,
    ) -> bool {
        let invocation = ModuleInvocation {
            function: ModuleFunction::ShouldRun,
            context: context.to_value(),
            secrets: secrets.clone(),
            data_files: integration.data_files.clone(),
        };
        let capabilities = self.capabilities_for(integration);
        let result = self
            .runtime
            .invoke(
                integration,
                invocation,
                &capabilities,
                self.config.should_run_timeout,
                &CancellationToken::new(),
            )
            .await;

        match result {
            Ok(Value::Null) => true,
            Ok(Value::Bool(applies)) => applies,
            Ok(other) => {
                warn!(
                    integration = integration.name(),
                    value = %other,
                    "shouldRun returned a non-boolean, skipping module"
                );
                false
            }
            Err(err) => {
                warn!(
                    integration = integration.name(),
                    error = %err,
                    "shouldRun failed, skipping module"
                );
                false
            }
        }
    }

    /// Execute the module's `run` under the caller's timeout (engine default
    /// when `None`). Returns the raw value the module produced — result
    /// shape validation happens one layer up.
    pub async fn run(
        &self,
        integration: &Integration,
        context: &Context,
        secrets: &HashMap<String, String>,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Value, SandboxError> {
        let invocation = ModuleInvocation {
            function: ModuleFunction::Run,
            context: context.to_value(),
            secrets: secrets.clone(),
            data_files: integration.data_files.clone(),
        };
        let capabilities = self.capabilities_for(integration);
        self.runtime
            .invoke(
                integration,
                invocation,
                &capabilities,
                timeout.unwrap_or(self.config.run_timeout),
                cancel,
            )
            .await
    }

    fn capabilities_for(&self, integration: &Integration) -> CapabilitySet {
        CapabilitySet::new(
            integration.name(),
            NamespacedCache::new(Arc::clone(&self.cache), integration.name()),
            self.http.clone(),
            integration.metadata.effective_cache_ttl(),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::json;

    use glance_cache::MemoryCache;
    use crate::secrets::StaticSecretsProvider;

    /// Canned-result runtime recording every invocation it receives.
    #[derive(Default)]
    struct FakeRuntime {
        should_run_value: Option<Value>,
        run_value: Option<Value>,
        fail_with: Option<String>,
        invocations: Mutex<Vec<ModuleInvocation>>,
    }

    #[async_trait]
    impl ModuleRuntime for FakeRuntime {
        async fn invoke(
            &self,
            integration: &Integration,
            invocation: ModuleInvocation,
            _capabilities: &CapabilitySet,
            _timeout: Duration,
            _cancel: &CancellationToken,
        ) -> Result<Value, SandboxError> {
            let function = invocation.function;
            self.invocations.lock().unwrap().push(invocation);
            if let Some(message) = &self.fail_with {
                return Err(SandboxError::Module {
                    name: integration.name().to_string(),
                    message: message.clone(),
                });
            }
            Ok(match function {
                ModuleFunction::ShouldRun => {
                    self.should_run_value.clone().unwrap_or(Value::Null)
                }
                ModuleFunction::Run => self.run_value.clone().unwrap_or(Value::Null),
            })
        }
    }

    fn integration() -> Integration {
        serde_json::from_value(json!({
            "id": "gh-deploys",
            "code": "module.exports = {}",
            "metadata": {
                "name": "gh-deploys",
                "match": { "contextType": "github" },
                "requiredSecrets": ["GH_TOKEN"],
            },
        }))
        .unwrap()
    }

    fn context() -> Context {
        Context::from_value(json!({
            "type": "github",
            "url": "https://github.com/acme/widgets",
        }))
        .unwrap()
    }

    fn runner_with(runtime: Arc<FakeRuntime>) -> SandboxRunner {
        SandboxRunner::new(
            runtime,
            Arc::new(StaticSecretsProvider::new(
                [("GH_TOKEN".to_string(), "tok".to_string())].into(),
            )),
            Arc::new(MemoryCache::new()),
            SandboxConfig::default(),
        )
    }

    #[tokio::test]
    async fn should_run_null_means_always_run() {
        let runtime = Arc::new(FakeRuntime::default());
        let runner = runner_with(Arc::clone(&runtime));
        assert!(
            runner
                .should_run(&integration(), &context(), &HashMap::new())
                .await
        );
    }

    #[tokio::test]
    async fn should_run_passes_booleans_through() {
        let runtime = Arc::new(FakeRuntime {
            should_run_value: Some(json!(false)),
            ..FakeRuntime::default()
        });
        let runner = runner_with(Arc::clone(&runtime));
        assert!(
            !runner
                .should_run(&integration(), &context(), &HashMap::new())
                .await
        );
    }

    #[tokio::test]
    async fn should_run_non_boolean_is_fail_closed() {
        let runtime = Arc::new(FakeRuntime {
            should_run_value: Some(json!("yes")),
            ..FakeRuntime::default()
        });
        let runner = runner_with(Arc::clone(&runtime));
        assert!(
            !runner
                .should_run(&integration(), &context(), &HashMap::new())
                .await
        );
    }

    #[tokio::test]
    async fn should_run_error_is_fail_closed() {
        let runtime = Arc::new(FakeRuntime {
            fail_with: Some("predicate exploded".into()),
            ..FakeRuntime::default()
        });
        let runner = runner_with(Arc::clone(&runtime));
        assert!(
            !runner
                .should_run(&integration(), &context(), &HashMap::new())
                .await
        );
    }

    #[tokio::test]
    async fn run_passes_raw_value_through() {
        let runtime = Arc::new(FakeRuntime {
            run_value: Some(json!([{"type": "text", "content": "hi"}, {"bogus": true}])),
            ..FakeRuntime::default()
        });
        let runner = runner_with(Arc::clone(&runtime));
        let value = runner
            .run(
                &integration(),
                &context(),
                &HashMap::new(),
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        // Unvalidated pass-through, bogus element included.
        assert_eq!(value[1], json!({"bogus": true}));
    }

    #[tokio::test]
    async fn run_propagates_module_errors() {
        let runtime = Arc::new(FakeRuntime {
            fail_with: Some("boom".into()),
            ..FakeRuntime::default()
        });
        let runner = runner_with(Arc::clone(&runtime));
        let err = runner
            .run(
                &integration(),
                &context(),
                &HashMap::new(),
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn invocation_carries_context_copy_and_given_secrets() {
        let runtime = Arc::new(FakeRuntime::default());
        let runner = runner_with(Arc::clone(&runtime));
        let secrets = HashMap::from([("GH_TOKEN".to_string(), "tok".to_string())]);
        let _ = runner
            .run(
                &integration(),
                &context(),
                &secrets,
                None,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let invocations = runtime.invocations.lock().unwrap();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].context, context().to_value());
        assert_eq!(invocations[0].secrets, secrets);
    }

    #[tokio::test]
    async fn resolve_secrets_uses_provider_and_fails_hard() {
        let runner = SandboxRunner::new(
            Arc::new(FakeRuntime::default()),
            Arc::new(StaticSecretsProvider::default()),
            Arc::new(MemoryCache::new()),
            SandboxConfig::default(),
        );
        let err = runner.resolve_secrets(&integration()).await.unwrap_err();
        assert!(matches!(err, SandboxError::MissingSecret { .. }));
    }
}
