//! Response and per-integration outcome types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use glance_core::Widget;

/// The aggregate response for one execution cycle.
///
/// `data` is the concatenation of per-integration widgets in resolution
/// order. The remaining fields are diagnostic but must be exact counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResponse {
    /// All validated widgets, resolution order preserved.
    pub data: Vec<Widget>,
    /// Total widget count (`data.len()`).
    pub count: usize,
    /// Integrations served from the result cache.
    pub cache_hits: usize,
    /// Integrations that failed or timed out.
    pub failed_count: usize,
    /// Response assembly time.
    pub timestamp: DateTime<Utc>,
    /// Every candidate integration, whether or not it produced output.
    pub integration_names: Vec<String>,
}

/// Terminal state of one integration within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionStatus {
    /// Produced validated widgets (possibly from cache).
    Success,
    /// `shouldRun` declined (or failed — fail-closed).
    Skipped,
    /// The run exceeded its deadline.
    TimedOut,
    /// The run threw, secrets were unresolvable, or the output failed
    /// validation.
    Failed,
}

/// Per-integration execution record. Never persisted — consumed only while
/// assembling the aggregate response.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    /// Integration name.
    pub integration_name: String,
    /// Terminal state.
    pub status: ExecutionStatus,
    /// Widgets contributed to the response (synthetic ones included).
    pub widgets: Vec<Widget>,
    /// Error text for failed/timed-out runs.
    pub error: Option<String>,
    /// Whether the widgets came from the result cache.
    pub from_cache: bool,
}

impl ExecutionOutcome {
    /// Whether this outcome counts toward `failedCount`.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ExecutionStatus::Failed | ExecutionStatus::TimedOut)
    }
}
