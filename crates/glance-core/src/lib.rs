//! # glance-core
//!
//! Foundation types and utilities for the Glance integration engine.
//!
//! This crate provides the shared vocabulary that all other Glance crates
//! depend on:
//!
//! - **Context**: [`context::Context`] — validated, immutable input document
//!   for one execution cycle, with dotted-path lookup
//! - **Widgets**: [`widget::Widget`] — the discriminated result union that
//!   integrations produce (`text` / `link` / `dropdown`)
//! - **Metadata**: [`metadata::IntegrationMetadata`] — author-declared match
//!   rules, cache policy, secrets, and priority
//! - **Rules**: [`rule::Rule`] — one declarative predicate against one
//!   context path (evaluated by `glance-rules`)
//! - **Errors**: [`errors`] hierarchy via `thiserror`
//!
//! All wire-facing types use `camelCase` serde renaming for compatibility
//! with the TypeScript server and the browser extension client.
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other glance crates.

#![deny(unsafe_code)]

pub mod context;
pub mod errors;
pub mod logging;
pub mod metadata;
pub mod rule;
pub mod widget;

pub use context::Context;
pub use errors::{ContextError, MetadataError};
pub use metadata::{DataFile, Integration, IntegrationMetadata, MatchSpec, SourceLocation};
pub use rule::Rule;
pub use widget::{DropdownItem, Widget, WidgetStatus};
