//! Declarative context-matching rules.
//!
//! A [`Rule`] is one predicate tested against the value at one dotted
//! context path. Evaluation lives in `glance-rules`; this crate only
//! defines the wire shape so metadata can be deserialized anywhere.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One declarative predicate against one context path.
///
/// Serialized externally tagged, so each rule reads as a single-key object:
/// `{"equals": "github"}`, `{"exists": true}`, `{"startsWith": "https://"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    /// Value presence must equal the flag.
    Exists(bool),
    /// Structural equality with the given JSON value.
    Equals(Value),
    /// Membership in the given list (structural equality).
    In(Vec<Value>),
    /// Regex match against a string value.
    Pattern(String),
    /// String prefix match.
    StartsWith(String),
    /// String suffix match.
    EndsWith(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
