//! # glance-registry
//!
//! Holds the loaded integration set and answers "which integrations match
//! this context, in what order".
//!
//! The loaded set is an immutable snapshot behind an atomically-swappable
//! `Arc`: reloads build the new snapshot fully off to the side and publish
//! it with a single swap, so concurrent resolvers always observe either the
//! old or the new set, never a mix. Every reload clears the shared result
//! cache — no stale result from a removed or changed module can be served.
//!
//! ## Crate Position
//!
//! Depends on: glance-core, glance-rules, glance-cache.
//! Depended on by: glance-runtime.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod registry;

pub use errors::LoaderError;
pub use loader::{DirectoryLoader, IntegrationLoader};
pub use registry::{IntegrationRegistry, LoadReport};
