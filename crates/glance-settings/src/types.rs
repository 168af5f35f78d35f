//! Settings type tree with compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings document. All fields carry compiled defaults; the file and
/// environment layers only override what they mention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlanceSettings {
    /// Settings schema version.
    pub version: String,
    /// Deployment name.
    pub name: String,
    /// Execution engine knobs.
    pub engine: EngineSettings,
    /// Result cache knobs.
    pub cache: CacheSettings,
    /// Integration loading and worker execution.
    pub integrations: IntegrationSettings,
}

impl Default for GlanceSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".into(),
            name: "glance".into(),
            engine: EngineSettings::default(),
            cache: CacheSettings::default(),
            integrations: IntegrationSettings::default(),
        }
    }
}

/// Orchestrator and sandbox timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Timeout for one integration's `run`, milliseconds. Request-scoped
    /// callers may override per call; no hard engine maximum is enforced.
    pub run_timeout_ms: u64,
    /// Short fixed timeout for `shouldRun` predicates, milliseconds.
    pub should_run_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            run_timeout_ms: 10_000,
            should_run_timeout_ms: 3_000,
        }
    }
}

/// Result cache behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Interval for the background expiry sweep, seconds. Zero disables
    /// the sweep (eviction on read still applies).
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
        }
    }
}

/// Where integrations come from and how their workers start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationSettings {
    /// Root directory scanned by the filesystem loader.
    pub directory: Option<String>,
    /// Interpreter command for worker processes.
    pub interpreter: String,
    /// Extra arguments passed before the entry script.
    pub interpreter_args: Vec<String>,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            directory: None,
            interpreter: "node".into(),
            interpreter_args: Vec::new(),
        }
    }
}
