//! Wire protocol between the engine and worker processes.
//!
//! Single-line JSONL frames over stdio. The host writes one `invoke` frame
//! to the worker's stdin; the worker answers with zero or more `call`/`log`
//! frames and exactly one terminal `result` or `error` frame on stdout.
//! Capability calls are answered by host `reply` frames on stdin, matched
//! by `id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use glance_core::DataFile;

/// Which module function an invocation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleFunction {
    /// The optional applicability predicate.
    ShouldRun,
    /// The main execution function.
    Run,
}

/// Frames written by the host to the worker's stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum HostFrame {
    /// Start one function invocation with the injected surface.
    #[serde(rename_all = "camelCase")]
    Invoke {
        /// Target function.
        function: ModuleFunction,
        /// Structurally-equal copy of the context document.
        context: Value,
        /// Only the secrets the integration declared.
        secrets: Value,
        /// Auxiliary static data, verbatim.
        data_files: Vec<DataFile>,
    },
    /// Answer to a worker capability call.
    #[serde(rename_all = "camelCase")]
    Reply {
        /// The `id` of the call being answered.
        id: u64,
        /// Whether the capability succeeded.
        ok: bool,
        /// Capability result when `ok`.
        #[serde(default, skip_serializing_if = "Value::is_null")]
        value: Value,
        /// Error message when not `ok`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Capability methods a worker may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityMethod {
    /// Namespaced cache read.
    #[serde(rename = "cache.get")]
    CacheGet,
    /// Namespaced cache write.
    #[serde(rename = "cache.set")]
    CacheSet,
    /// Outbound HTTP request, executed host-side.
    #[serde(rename = "fetch")]
    Fetch,
}

/// Worker log severities, mapped onto tracing levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose diagnostics.
    Debug,
    /// Default level.
    #[default]
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures worth operator attention.
    Error,
}

/// Frames read from the worker's stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum WorkerFrame {
    /// Capability invocation; host must answer with a `reply`.
    Call {
        /// Correlation id, unique per invocation.
        id: u64,
        /// Capability selector.
        method: CapabilityMethod,
        /// Method-specific parameters.
        #[serde(default)]
        params: Value,
    },
    /// Log line, forwarded to tracing under the integration's name.
    Log {
        /// Severity.
        #[serde(default)]
        level: LogLevel,
        /// Message text.
        message: String,
    },
    /// Terminal success frame carrying the module's return value.
    Result {
        /// The raw return value; the runner passes it through unvalidated.
        #[serde(default)]
        value: Value,
    },
    /// Terminal failure frame.
    Error {
        /// The module's error message.
        message: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
