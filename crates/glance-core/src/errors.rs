//! Error types shared across the engine.

use thiserror::Error;

/// Rejection reasons for an inbound context document.
///
/// Context errors are reported to the caller before integration resolution
/// ever starts; they never reach the per-integration pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The submitted value was not a JSON object.
    #[error("context must be a JSON object")]
    NotAnObject,

    /// A required field (`type` or `url`) is absent.
    #[error("context is missing required field `{0}`")]
    MissingField(&'static str),

    /// A required field is present but not a string.
    #[error("context field `{0}` must be a string")]
    InvalidFieldType(&'static str),

    /// The `url` field does not parse as a URL.
    #[error("context `url` is not a valid URL: {0}")]
    InvalidUrl(String),
}

/// Structural problems in author-declared integration metadata.
///
/// Metadata errors exclude the offending integration from the registry;
/// they never abort a load or a resolution cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The name does not match the required slug grammar.
    #[error("integration name {0:?} must match ^[a-z][a-z0-9_-]{{3,}}$")]
    InvalidName(String),

    /// Priority is outside the accepted 1..=1000 range.
    #[error("integration {name}: priority {priority} is out of range 1-1000")]
    PriorityOutOfRange {
        /// Integration name.
        name: String,
        /// The rejected priority value.
        priority: u32,
    },

    /// A `pattern` rule in `match.context` failed to compile.
    #[error("integration {name}: rule for path {path:?} has an invalid pattern: {message}")]
    InvalidPattern {
        /// Integration name.
        name: String,
        /// The context path the rule applies to.
        path: String,
        /// Regex compile error text.
        message: String,
    },

    /// `match.contextType` is empty.
    #[error("integration {0}: match.contextType must not be empty")]
    EmptyContextType(String),
}
