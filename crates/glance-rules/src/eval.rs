//! Rule evaluation against a context.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use glance_core::{Context, Rule};

/// Result of evaluating a rule map against a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    /// Whether every rule passed (logical AND; empty map is valid).
    pub is_valid: bool,
    /// Every path that was tested, in declaration order.
    ///
    /// Recorded even when the outcome is already false, so diagnostics can
    /// show the full set of paths a match considered.
    pub matched_paths: Vec<String>,
}

/// Evaluate all rules against the context.
///
/// Each rule reads the value at its dotted path (missing ⇒ absent) and
/// tests it. All rules must pass. The boolean short-circuits nothing
/// observable: every declared path lands in `matched_paths` regardless of
/// individual results.
pub fn evaluate(context: &Context, rules: &IndexMap<String, Rule>) -> RuleOutcome {
    let mut is_valid = true;
    let mut matched_paths = Vec::with_capacity(rules.len());

    for (path, rule) in rules {
        matched_paths.push(path.clone());
        if !rule_passes(rule, context.lookup(path)) {
            is_valid = false;
        }
    }

    RuleOutcome {
        is_valid,
        matched_paths,
    }
}

/// Test one rule against the (possibly absent) value at its path.
fn rule_passes(rule: &Rule, value: Option<&Value>) -> bool {
    match rule {
        Rule::Exists(expected) => value.is_some() == *expected,
        Rule::Equals(expected) => value == Some(expected),
        Rule::In(candidates) => value.is_some_and(|v| candidates.contains(v)),
        Rule::Pattern(pattern) => {
            let Some(s) = value.and_then(Value::as_str) else {
                return false;
            };
            match Regex::new(pattern) {
                Ok(re) => re.is_match(s),
                Err(err) => {
                    // Metadata validation rejects bad patterns up front, so
                    // this only fires for rules injected outside the loader.
                    warn!(pattern = %pattern, error = %err, "invalid rule pattern, rule fails");
                    false
                }
            }
        }
        Rule::StartsWith(prefix) => value
            .and_then(Value::as_str)
            .is_some_and(|s| s.starts_with(prefix)),
        Rule::EndsWith(suffix) => value
            .and_then(Value::as_str)
            .is_some_and(|s| s.ends_with(suffix)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Context {
        Context::from_value(json!({
            "type": "github",
            "url": "https://github.com/acme/widgets",
            "service": { "name": "widgets", "tier": 1 },
            "branch": "main",
        }))
        .unwrap()
    }

    fn rules(pairs: Vec<(&str, Rule)>) -> IndexMap<String, Rule> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn empty_rule_map_is_valid() {
        let outcome = evaluate(&ctx(), &IndexMap::new());
        assert!(outcome.is_valid);
        assert!(outcome.matched_paths.is_empty());
    }

    #[test]
    fn all_rules_must_pass() {
        let outcome = evaluate(
            &ctx(),
            &rules(vec![
                ("service.name", Rule::Equals(json!("widgets"))),
                ("branch", Rule::Equals(json!("develop"))),
            ]),
        );
        assert!(!outcome.is_valid);
        assert_eq!(outcome.matched_paths, vec!["service.name", "branch"]);
    }

    #[test]
    fn paths_recorded_even_after_failure() {
        let outcome = evaluate(
            &ctx(),
            &rules(vec![
                ("missing", Rule::Exists(true)),
                ("branch", Rule::Equals(json!("main"))),
            ]),
        );
        assert!(!outcome.is_valid);
        assert_eq!(outcome.matched_paths, vec!["missing", "branch"]);
    }

    #[test]
    fn exists_true_and_false() {
        assert!(evaluate(&ctx(), &rules(vec![("branch", Rule::Exists(true))])).is_valid);
        assert!(evaluate(&ctx(), &rules(vec![("missing", Rule::Exists(false))])).is_valid);
        assert!(!evaluate(&ctx(), &rules(vec![("missing", Rule::Exists(true))])).is_valid);
        assert!(!evaluate(&ctx(), &rules(vec![("branch", Rule::Exists(false))])).is_valid);
    }

    #[test]
    fn equals_compares_structurally() {
        assert!(evaluate(&ctx(), &rules(vec![("service.tier", Rule::Equals(json!(1)))])).is_valid);
        assert!(
            !evaluate(&ctx(), &rules(vec![("service.tier", Rule::Equals(json!("1")))])).is_valid
        );
    }

    #[test]
    fn equals_missing_path_fails() {
        assert!(!evaluate(&ctx(), &rules(vec![("nope", Rule::Equals(json!(null)))])).is_valid);
    }

    #[test]
    fn in_membership() {
        let rule = Rule::In(vec![json!("main"), json!("develop")]);
        assert!(evaluate(&ctx(), &rules(vec![("branch", rule)])).is_valid);

        let rule = Rule::In(vec![json!("release")]);
        assert!(!evaluate(&ctx(), &rules(vec![("branch", rule)])).is_valid);
    }

    #[test]
    fn pattern_matches_strings_only() {
        let rule = Rule::Pattern(r"^https://github\.com/".into());
        assert!(evaluate(&ctx(), &rules(vec![("url", rule)])).is_valid);

        let rule = Rule::Pattern("1".into());
        assert!(!evaluate(&ctx(), &rules(vec![("service.tier", rule)])).is_valid);
    }

    #[test]
    fn invalid_pattern_fails_rule_without_panicking() {
        let rule = Rule::Pattern("(".into());
        assert!(!evaluate(&ctx(), &rules(vec![("url", rule)])).is_valid);
    }

    #[test]
    fn starts_with_and_ends_with() {
        assert!(
            evaluate(
                &ctx(),
                &rules(vec![("url", Rule::StartsWith("https://".into()))])
            )
            .is_valid
        );
        assert!(
            evaluate(&ctx(), &rules(vec![("url", Rule::EndsWith("widgets".into()))])).is_valid
        );
        assert!(
            !evaluate(
                &ctx(),
                &rules(vec![("service.tier", Rule::StartsWith("1".into()))])
            )
            .is_valid
        );
    }
}
