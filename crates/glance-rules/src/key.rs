//! Cache key derivation from ordered context paths.

use serde_json::Value;

use glance_core::Context;

/// Join the resolved value of each path with `|`, in declared path order.
///
/// A missing path contributes the literal string `"undefined"` rather than
/// failing, which keeps keys stable and guessable. Caveat carried over from
/// the original design: an absent path and a path holding a JSON `null`
/// both render as `"undefined"`/`"null"`-style placeholders, so two
/// different "missing" reasons can collapse into the same key segment.
pub fn cache_key_from(context: &Context, paths: &[&str]) -> String {
    paths
        .iter()
        .map(|path| match context.lookup(path) {
            None => "undefined".to_string(),
            Some(value) => segment(value),
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Render one resolved value as a key segment.
///
/// Strings render bare (no quotes); everything else renders as compact JSON.
fn segment(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
