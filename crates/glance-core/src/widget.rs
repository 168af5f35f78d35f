//! The result union integrations produce.
//!
//! A module's output is a JSON array of widgets. The engine validates each
//! element against this schema before anything reaches the client; malformed
//! output never leaves the orchestrator.

use serde::{Deserialize, Serialize};

/// Visual emphasis for a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetStatus {
    /// Neutral information.
    Info,
    /// Healthy / passing.
    Success,
    /// Degraded / needs attention soon.
    Warning,
    /// Urgent, rendered prominently. Also used for engine-synthesized
    /// failure notices.
    Important,
}

/// One entry inside a dropdown widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropdownItem {
    /// Display label.
    pub label: String,
    /// Optional link target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Optional icon identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A single rendered result produced by an integration.
///
/// Discriminated on the `type` field. The engine's response `data` is the
/// concatenation of all matched integrations' validated widgets in
/// resolution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Widget {
    /// Plain text.
    #[serde(rename_all = "camelCase")]
    Text {
        /// Display text.
        content: String,
        /// Visual emphasis.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<WidgetStatus>,
        /// Optional icon identifier.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        /// Optional hover text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tooltip: Option<String>,
    },
    /// A hyperlink.
    #[serde(rename_all = "camelCase")]
    Link {
        /// Display text.
        content: String,
        /// Link target.
        href: String,
        /// Visual emphasis.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<WidgetStatus>,
        /// Optional icon identifier.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        /// Optional hover text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tooltip: Option<String>,
    },
    /// An expandable list. Invariant: `items` must be non-empty.
    #[serde(rename_all = "camelCase")]
    Dropdown {
        /// Display text for the collapsed state.
        content: String,
        /// Entries shown when expanded.
        items: Vec<DropdownItem>,
        /// Optional icon identifier.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
        /// Optional hover text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tooltip: Option<String>,
    },
}

impl Widget {
    /// Plain text widget with no adornments.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            status: None,
            icon: None,
            tooltip: None,
        }
    }

    /// The synthetic widget surfaced when an integration throws or times out.
    ///
    /// Rendered as `<name>: <message>` so the failure is user-visible
    /// without exposing a stack trace.
    pub fn failure_notice(integration_name: &str, message: &str) -> Self {
        Self::Text {
            content: format!("{integration_name}: {message}"),
            status: Some(WidgetStatus::Important),
            icon: None,
            tooltip: None,
        }
    }

    /// The replacement widget used when an integration returned output that
    /// failed schema validation.
    pub fn validation_notice(integration_name: &str) -> Self {
        Self::failure_notice(integration_name, "integration failed, check logs")
    }

    /// Check structural invariants that the serde schema cannot express.
    ///
    /// Currently: a dropdown must carry at least one item.
    pub fn check_invariants(&self) -> Result<(), String> {
        match self {
            Self::Dropdown { items, .. } if items.is_empty() => {
                Err("dropdown widget requires non-empty items".to_string())
            }
            _ => Ok(()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
