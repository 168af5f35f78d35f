//! The orchestrator: one context submission → one aggregate response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, histogram};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use glance_cache::Cache;
use glance_core::{Context, Integration, Widget};
use glance_registry::{IntegrationLoader, IntegrationRegistry, LoadReport};
use glance_rules::cache_key_from;
use glance_sandbox::SandboxRunner;

use crate::errors::EngineError;
use crate::types::{EngineResponse, ExecutionOutcome, ExecutionStatus};
use crate::validate::validate_module_output;

/// The request-level pipeline over registry, cache, and sandbox.
///
/// Depends only on the capability interfaces: any cache backend, secrets
/// backend, or module runtime can be substituted without touching this
/// type.
pub struct Engine {
    registry: Arc<IntegrationRegistry>,
    cache: Arc<dyn Cache>,
    runner: SandboxRunner,
    run_timeout: Duration,
}

impl Engine {
    /// Assemble an engine from its collaborators.
    ///
    /// `run_timeout` bounds each integration's `run`; `shouldRun` carries
    /// its own short fixed deadline inside the runner.
    pub fn new(
        registry: Arc<IntegrationRegistry>,
        cache: Arc<dyn Cache>,
        runner: SandboxRunner,
        run_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            cache,
            runner,
            run_timeout,
        }
    }

    /// The shared registry (reloads go through it).
    pub fn registry(&self) -> &Arc<IntegrationRegistry> {
        &self.registry
    }

    /// Reload the integration set from a loader. Clears the result cache
    /// via the registry swap.
    pub async fn reload(
        &self,
        loader: &dyn IntegrationLoader,
    ) -> Result<LoadReport, EngineError> {
        let integrations = loader.load().await.map_err(EngineError::internal)?;
        Ok(self.registry.load(integrations).await)
    }

    /// Execute one cycle for the submitted context document.
    ///
    /// Integrations run one at a time in resolution order. One module's
    /// failure never suppresses another's output: errors become visible
    /// synthetic widgets and the cycle continues.
    #[instrument(skip_all)]
    pub async fn handle(&self, context_value: Value) -> Result<EngineResponse, EngineError> {
        let context = Context::from_value(context_value)?;
        let candidates = self.registry.resolve(&context);
        let integration_names: Vec<String> =
            candidates.iter().map(|i| i.name().to_string()).collect();

        debug!(
            context_type = context.context_type(),
            candidates = candidates.len(),
            "cycle started"
        );

        let mut data = Vec::new();
        let mut cache_hits = 0;
        let mut failed_count = 0;

        for integration in &candidates {
            let started = Instant::now();
            let outcome = self.execute_one(integration, &context).await;
            let elapsed_ms = started.elapsed().as_millis() as f64;

            histogram!("integration_run_duration_ms").record(elapsed_ms);
            counter!(
                "integration_runs_total",
                "status" => status_label(outcome.status)
            )
            .increment(1);

            if outcome.from_cache {
                cache_hits += 1;
            }
            if outcome.is_failure() {
                failed_count += 1;
            }
            data.extend(outcome.widgets);
        }

        counter!("engine_cache_hits_total").increment(cache_hits as u64);

        info!(
            candidates = integration_names.len(),
            widgets = data.len(),
            cache_hits,
            failed_count,
            "cycle finished"
        );

        Ok(EngineResponse {
            count: data.len(),
            data,
            cache_hits,
            failed_count,
            timestamp: Utc::now(),
            integration_names,
        })
    }

    /// Run one integration through cache → secrets → shouldRun → run →
    /// validate → write-back, converting every failure into an outcome.
    async fn execute_one(&self, integration: &Integration, context: &Context) -> ExecutionOutcome {
        let name = integration.name().to_string();

        // Cache key: explicit cacheKey paths, else match.context paths,
        // else no caching at all.
        let cache_key = integration.metadata.cache_key_paths().map(|paths| {
            format!("{name}:{}", cache_key_from(context, &paths))
        });

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key).await {
                // Cached values were validated before the write; they are
                // used verbatim without re-validation.
                match serde_json::from_value::<Vec<Widget>>(cached) {
                    Ok(widgets) => {
                        debug!(integration = %name, key = %key, "served from cache");
                        return ExecutionOutcome {
                            integration_name: name,
                            status: ExecutionStatus::Success,
                            widgets,
                            error: None,
                            from_cache: true,
                        };
                    }
                    Err(err) => {
                        warn!(integration = %name, error = %err, "unreadable cache entry, re-executing");
                    }
                }
            }
        }

        let secrets = match self.runner.resolve_secrets(integration).await {
            Ok(secrets) => secrets,
            Err(err) => {
                warn!(integration = %name, error = %err, "secret resolution failed");
                return failure_outcome(name, ExecutionStatus::Failed, &err.to_string());
            }
        };

        if !self.runner.should_run(integration, context, &secrets).await {
            debug!(integration = %name, "skipped by shouldRun");
            return ExecutionOutcome {
                integration_name: name,
                status: ExecutionStatus::Skipped,
                widgets: Vec::new(),
                error: None,
                from_cache: false,
            };
        }

        let raw = match self
            .runner
            .run(
                integration,
                context,
                &secrets,
                Some(self.run_timeout),
                &CancellationToken::new(),
            )
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                let status = if err.is_timeout() {
                    ExecutionStatus::TimedOut
                } else {
                    ExecutionStatus::Failed
                };
                warn!(integration = %name, error = %err, "run failed");
                return failure_outcome(name, status, &err.to_string());
            }
        };

        match validate_module_output(&name, &raw) {
            Ok(widgets) => {
                if let Some(key) = &cache_key {
                    match serde_json::to_value(&widgets) {
                        Ok(value) => {
                            self.cache
                                .set(key, value, integration.metadata.effective_cache_ttl())
                                .await;
                        }
                        Err(err) => {
                            warn!(integration = %name, error = %err, "skipping cache write");
                        }
                    }
                }
                ExecutionOutcome {
                    integration_name: name,
                    status: ExecutionStatus::Success,
                    widgets,
                    error: None,
                    from_cache: false,
                }
            }
            Err(diagnostics) => ExecutionOutcome {
                widgets: vec![Widget::validation_notice(&name)],
                integration_name: name,
                status: ExecutionStatus::Failed,
                error: Some(diagnostics),
                from_cache: false,
            },
        }
    }
}

/// Failure outcome with the user-visible synthetic widget.
fn failure_outcome(name: String, status: ExecutionStatus, message: &str) -> ExecutionOutcome {
    ExecutionOutcome {
        widgets: vec![Widget::failure_notice(&name, message)],
        integration_name: name,
        status,
        error: Some(message.to_string()),
        from_cache: false,
    }
}

const fn status_label(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Success => "success",
        ExecutionStatus::Skipped => "skipped",
        ExecutionStatus::TimedOut => "timed_out",
        ExecutionStatus::Failed => "failed",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
