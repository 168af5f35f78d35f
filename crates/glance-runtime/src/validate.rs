//! Module output validation.

use serde_json::Value;
use tracing::error;

use glance_core::Widget;

/// Validate a module's raw return value as a widget array.
///
/// Returns the parsed widgets, or a diagnostics string describing every
/// offending element. The caller replaces invalid output wholesale with a
/// generic "check logs" widget — malformed data never reaches clients.
pub fn validate_module_output(integration_name: &str, raw: &Value) -> Result<Vec<Widget>, String> {
    let Value::Array(elements) = raw else {
        let diagnostics = format!(
            "expected an array of widgets, got {}",
            type_name(raw)
        );
        error!(integration = integration_name, %raw, diagnostics = %diagnostics, "module output rejected");
        return Err(diagnostics);
    };

    let mut widgets = Vec::with_capacity(elements.len());
    let mut problems = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        match serde_json::from_value::<Widget>(element.clone()) {
            Ok(widget) => match widget.check_invariants() {
                Ok(()) => widgets.push(widget),
                Err(violation) => problems.push(format!("widget[{index}]: {violation}")),
            },
            Err(parse) => problems.push(format!("widget[{index}]: {parse}")),
        }
    }

    if problems.is_empty() {
        Ok(widgets)
    } else {
        let diagnostics = problems.join("; ");
        error!(integration = integration_name, %raw, diagnostics = %diagnostics, "module output rejected");
        Err(diagnostics)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_array_parses() {
        let widgets = validate_module_output(
            "gh-deploys",
            &json!([
                {"type": "text", "content": "hi"},
                {"type": "link", "content": "docs", "href": "https://d.example.com"},
            ]),
        )
        .unwrap();
        assert_eq!(widgets.len(), 2);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(validate_module_output("gh-deploys", &json!([])).unwrap().is_empty());
    }

    #[test]
    fn non_array_rejected() {
        let err = validate_module_output("gh-deploys", &json!({"type": "text"})).unwrap_err();
        assert!(err.contains("expected an array"));

        let err = validate_module_output("gh-deploys", &Value::Null).unwrap_err();
        assert!(err.contains("null"));
    }

    #[test]
    fn bad_element_rejects_whole_output() {
        let err = validate_module_output(
            "gh-deploys",
            &json!([
                {"type": "text", "content": "fine"},
                {"type": "spinner"},
            ]),
        )
        .unwrap_err();
        assert!(err.contains("widget[1]"));
    }

    #[test]
    fn empty_dropdown_rejected_with_index() {
        let err = validate_module_output(
            "gh-deploys",
            &json!([{"type": "dropdown", "content": "envs", "items": []}]),
        )
        .unwrap_err();
        assert!(err.contains("widget[0]"));
        assert!(err.contains("non-empty items"));
    }

    #[test]
    fn all_problems_reported_together() {
        let err = validate_module_output(
            "gh-deploys",
            &json!([{"type": "nope"}, {"type": "dropdown", "content": "x", "items": []}]),
        )
        .unwrap_err();
        assert!(err.contains("widget[0]"));
        assert!(err.contains("widget[1]"));
    }
}
