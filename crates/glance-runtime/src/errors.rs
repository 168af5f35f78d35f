//! Engine-level errors.

use thiserror::Error;

use glance_core::ContextError;

/// Failures that abort a whole execution cycle.
///
/// Per-integration failures never appear here — they are isolated into
/// visible synthetic widgets and the cycle continues. Only a malformed
/// context or a genuine engine-internal fault reaches the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The submitted context was rejected before resolution.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// An engine-internal fault — the 5xx-equivalent. The public message is
    /// deliberately generic; the detail goes to logs only.
    #[error("Internal server error")]
    Internal {
        /// Internal detail, never shown to clients.
        detail: String,
    },
}

impl EngineError {
    /// Build an internal error from any displayable detail.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::Internal {
            detail: detail.to_string(),
        }
    }
}
