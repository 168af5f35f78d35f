//! # glance-runtime
//!
//! The request-level execution pipeline.
//!
//! [`Engine::handle`] takes one context submission through the full cycle:
//! resolve candidates from the registry, then for each candidate — check the
//! result cache, else resolve secrets, evaluate `shouldRun`, execute `run`
//! in the sandbox, validate the output shape, isolate failures into visible
//! synthetic widgets, write successes back to the cache — and finally
//! assemble the aggregate response with exact diagnostic counters.
//!
//! Integrations are processed one at a time in resolution order: output
//! order is an externally observable contract, and sequential execution
//! keeps it deterministic with bounded resource usage.
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: glance-core, glance-rules, glance-cache,
//! glance-registry, glance-sandbox.
//! Depended on by: glance-cli.

#![deny(unsafe_code)]

pub mod engine;
pub mod errors;
pub mod types;
pub mod validate;

pub use engine::Engine;
pub use errors::EngineError;
pub use types::{EngineResponse, ExecutionOutcome, ExecutionStatus};
pub use validate::validate_module_output;
