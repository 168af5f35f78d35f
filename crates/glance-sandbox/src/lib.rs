//! # glance-sandbox
//!
//! Isolated, resource-bounded execution of integration modules.
//!
//! Each invocation runs the integration's entry script in a short-lived
//! worker process under a configured interpreter, speaking a single-line
//! JSONL protocol over stdio. The worker sees exactly the injected surface
//! and nothing else:
//!
//! - a structurally-equal **copy** of the context (never a live reference),
//! - the **declared** secrets only (least privilege),
//! - the integration's auxiliary **data files**, verbatim,
//! - a **namespaced cache** facade (`i:<name>:` prefix),
//! - an outbound **fetch** capability executed host-side,
//! - a **log** channel scoped to the integration's name.
//!
//! Sibling imports (`require('./helper')`) resolve next to the module
//! because the worker's working directory is the integration's own
//! directory. Isolation is logical — restricted capability surface plus
//! timeout and kill — not an OS-level security boundary.
//!
//! ## Crate Position
//!
//! Depends on: glance-core, glance-cache.
//! Depended on by: glance-runtime.

#![deny(unsafe_code)]

pub mod capabilities;
pub mod errors;
pub mod process;
pub mod protocol;
pub mod runner;
pub mod secrets;

pub use capabilities::CapabilitySet;
pub use errors::SandboxError;
pub use process::ProcessModuleRuntime;
pub use protocol::{HostFrame, LogLevel, ModuleFunction, WorkerFrame};
pub use runner::{ModuleInvocation, ModuleRuntime, SandboxConfig, SandboxRunner};
pub use secrets::{EnvSecretsProvider, SecretsProvider, StaticSecretsProvider};
