//! The context document submitted for one execution cycle.
//!
//! A context is an open, arbitrarily-nested JSON object carrying facts about
//! what the client is currently looking at. Two fields are required: `type`
//! (names the adapter that produced the context) and `url` (a valid URL).
//! Everything else is adapter-specific.

use serde_json::{Map, Value};

use crate::errors::ContextError;

/// Immutable, validated context for a single execution cycle.
///
/// Constructed via [`Context::from_value`], which enforces the required
/// `type` and `url` fields. There is no cross-request identity: a context
/// lives exactly as long as the cycle it was submitted for.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    fields: Map<String, Value>,
}

impl Context {
    /// Validate a raw JSON value into a context.
    ///
    /// Requires an object with string `type` and `url` fields, where `url`
    /// parses as a URL. All other fields pass through untouched.
    pub fn from_value(value: Value) -> Result<Self, ContextError> {
        let Value::Object(fields) = value else {
            return Err(ContextError::NotAnObject);
        };

        for required in ["type", "url"] {
            match fields.get(required) {
                Some(Value::String(s)) if !s.is_empty() => {}
                Some(Value::String(_)) | None => {
                    return Err(ContextError::MissingField(required));
                }
                Some(_) => return Err(ContextError::InvalidFieldType(required)),
            }
        }

        let url = fields
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if url::Url::parse(url).is_err() {
            return Err(ContextError::InvalidUrl(url.to_string()));
        }

        Ok(Self { fields })
    }

    /// The adapter discriminator (`type` field).
    pub fn context_type(&self) -> &str {
        self.fields
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// The `url` field.
    pub fn url(&self) -> &str {
        self.fields
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Resolve a dotted path (e.g. `service.name`) into the context.
    ///
    /// Returns `None` when any segment is missing or traverses a non-object.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// The raw field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Clone the context into a plain JSON value.
    ///
    /// This is the copy handed to sandboxed modules: structurally equal to
    /// the original, never a live reference into engine state.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
