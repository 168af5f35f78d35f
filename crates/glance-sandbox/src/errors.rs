//! Sandbox execution errors.

use thiserror::Error;

/// Failures while executing one integration in a worker.
///
/// Every variant carries the integration name: errors surface to users as
/// `<name>: <message>` widgets, and to logs with the same attribution.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The worker process could not be spawned.
    #[error("failed to spawn worker: {message}")]
    Spawn {
        /// Integration name.
        name: String,
        /// Spawn failure detail.
        message: String,
    },

    /// Stdio plumbing to the worker failed.
    #[error("worker I/O error: {source}")]
    Io {
        /// Integration name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The worker violated the JSONL protocol (malformed frame, exit
    /// without a terminal frame).
    #[error("worker protocol violation: {message}")]
    Protocol {
        /// Integration name.
        name: String,
        /// Violation detail.
        message: String,
    },

    /// The module reported a failure (terminal `error` frame).
    #[error("{message}")]
    Module {
        /// Integration name.
        name: String,
        /// The module's own error message.
        message: String,
    },

    /// The run exceeded its deadline; the worker was killed.
    #[error("timed out after {timeout_ms}ms")]
    Timeout {
        /// Integration name.
        name: String,
        /// The deadline that was exceeded.
        timeout_ms: u64,
    },

    /// The enclosing cycle was cancelled; the worker was killed.
    #[error("execution cancelled")]
    Cancelled {
        /// Integration name.
        name: String,
    },

    /// A declared secret could not be resolved. Aborts the integration
    /// before its `run` is ever invoked.
    #[error("missing required secret {key:?}")]
    MissingSecret {
        /// Integration name.
        name: String,
        /// The unresolvable secret key.
        key: String,
    },
}

impl SandboxError {
    /// The integration the error is attributed to.
    pub fn integration_name(&self) -> &str {
        match self {
            Self::Spawn { name, .. }
            | Self::Io { name, .. }
            | Self::Protocol { name, .. }
            | Self::Module { name, .. }
            | Self::Timeout { name, .. }
            | Self::Cancelled { name }
            | Self::MissingSecret { name, .. } => name,
        }
    }

    /// Whether this error is a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
