//! # glance-rules
//!
//! Rule evaluation and cache key derivation for the Glance engine.
//!
//! Pure functions, no state: [`evaluate`] tests a context against a map of
//! declarative rules, [`cache_key_from`] derives a stable cache key from
//! ordered context paths. The [`Rule`](glance_core::Rule) wire type itself
//! lives in `glance-core` so metadata can deserialize everywhere.
//!
//! ## Crate Position
//!
//! Standalone logic crate over glance-core. Depended on by:
//! glance-registry, glance-runtime.

#![deny(unsafe_code)]

pub mod eval;
pub mod key;

pub use eval::{RuleOutcome, evaluate};
pub use key::cache_key_from;
