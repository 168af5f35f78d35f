//! Command-line harness for the Glance engine.
//!
//! Loads integrations from a directory, reads one context document (file or
//! stdin), runs an execution cycle, and prints the engine response as JSON.
//! The HTTP transport lives elsewhere; this binary exercises the same
//! pipeline end to end.

#![deny(unsafe_code)]

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use clap::Parser;

use glance_cache::{Cache, MemoryCache};
use glance_registry::{DirectoryLoader, IntegrationRegistry};
use glance_runtime::{Engine, EngineError};
use glance_sandbox::{EnvSecretsProvider, ProcessModuleRuntime, SandboxConfig, SandboxRunner};
use glance_settings::get_settings;

#[derive(Debug, Parser)]
#[command(name = "glance", about = "Run one integration execution cycle")]
struct Args {
    /// Integrations directory (defaults to settings `integrations.directory`).
    #[arg(long)]
    integrations_dir: Option<PathBuf>,

    /// Context JSON file; `-` or omitted reads stdin.
    #[arg(long)]
    context: Option<PathBuf>,

    /// Override the per-integration run timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Emit the response on one line instead of pretty-printing.
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    glance_core::logging::init("info");
    let args = Args::parse();
    let settings = get_settings();

    let integrations_dir = args
        .integrations_dir
        .or_else(|| settings.integrations.directory.clone().map(PathBuf::from));
    let Some(integrations_dir) = integrations_dir else {
        bail!("no integrations directory: pass --integrations-dir or set integrations.directory");
    };

    let context_text = match args.context.as_deref() {
        Some(path) if path != std::path::Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read context file {}", path.display()))?,
        _ => {
            let mut buffer = String::new();
            let _ = std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read context from stdin")?;
            buffer
        }
    };
    let context_value: serde_json::Value =
        serde_json::from_str(&context_text).context("context is not valid JSON")?;

    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let registry = Arc::new(IntegrationRegistry::new(Arc::clone(&cache)));

    let runner = SandboxRunner::new(
        Arc::new(ProcessModuleRuntime::new(
            settings.integrations.interpreter.clone(),
            settings.integrations.interpreter_args.clone(),
        )),
        Arc::new(EnvSecretsProvider::new()),
        Arc::clone(&cache),
        SandboxConfig {
            should_run_timeout: Duration::from_millis(settings.engine.should_run_timeout_ms),
            run_timeout: Duration::from_millis(settings.engine.run_timeout_ms),
        },
    );

    let run_timeout =
        Duration::from_millis(args.timeout_ms.unwrap_or(settings.engine.run_timeout_ms));
    let engine = Engine::new(registry, cache, runner, run_timeout);

    let report = engine
        .reload(&DirectoryLoader::new(integrations_dir))
        .await
        .map_err(|e| anyhow::anyhow!("failed to load integrations: {e}"))?;
    if !report.skipped.is_empty() {
        for (id, reason) in &report.skipped {
            tracing::warn!(integration = %id, reason = %reason, "integration excluded");
        }
    }

    match engine.handle(context_value).await {
        Ok(response) => {
            let encoded = if args.compact {
                serde_json::to_string(&response)?
            } else {
                serde_json::to_string_pretty(&response)?
            };
            println!("{encoded}");
            Ok(())
        }
        Err(err @ EngineError::Context(_)) => bail!("context rejected: {err}"),
        Err(err) => {
            // 5xx-equivalent shape for consumers parsing stdout.
            println!("{}", serde_json::json!({ "error": err.to_string() }));
            std::process::exit(1);
        }
    }
}
