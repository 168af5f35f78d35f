//! Worker process execution backed by `tokio::process::Command`.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use glance_core::Integration;

use crate::capabilities::CapabilitySet;
use crate::errors::SandboxError;
use crate::protocol::{HostFrame, LogLevel, WorkerFrame};
use crate::runner::{ModuleInvocation, ModuleRuntime};

/// Tracing target for worker-originated output.
const WORKER_TARGET: &str = "glance_sandbox::worker";

/// Entry file name used when an integration has no on-disk source and its
/// code must be materialized into a scratch directory.
const SCRATCH_ENTRY: &str = "index.js";

/// Environment variables forwarded into workers. Everything else is
/// stripped so undeclared secrets in the engine's environment never leak.
const FORWARDED_ENV: &[&str] = &["PATH", "HOME", "LANG", "TMPDIR"];

/// Spawns one short-lived worker process per invocation.
///
/// The worker runs `<interpreter> [args...] <entry>` with the integration's
/// own directory as working directory, so sibling imports resolve next to
/// the module. Third-party package resolution is the interpreter's own —
/// the engine only fixes the resolution origin.
pub struct ProcessModuleRuntime {
    interpreter: String,
    interpreter_args: Vec<String>,
}

impl ProcessModuleRuntime {
    /// Runtime launching workers with the given interpreter command.
    pub fn new(interpreter: impl Into<String>, interpreter_args: Vec<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            interpreter_args,
        }
    }
}

#[async_trait]
impl ModuleRuntime for ProcessModuleRuntime {
    async fn invoke(
        &self,
        integration: &Integration,
        invocation: ModuleInvocation,
        capabilities: &CapabilitySet,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Value, SandboxError> {
        let name = integration.name().to_string();

        // Scratch dir must outlive the child; dropped after the kill below.
        let mut scratch: Option<tempfile::TempDir> = None;
        let (dir, entry): (PathBuf, PathBuf) = match &integration.source {
            Some(source) => (source.dir.clone(), source.entry.clone()),
            None => {
                let tmp = tempfile::tempdir().map_err(|e| SandboxError::Spawn {
                    name: name.clone(),
                    message: format!("failed to create scratch dir: {e}"),
                })?;
                let entry = tmp.path().join(SCRATCH_ENTRY);
                tokio::fs::write(&entry, &integration.code)
                    .await
                    .map_err(|source| SandboxError::Io {
                        name: name.clone(),
                        source,
                    })?;
                let dir = tmp.path().to_path_buf();
                scratch = Some(tmp);
                (dir, entry)
            }
        };

        let mut command = tokio::process::Command::new(&self.interpreter);
        let _ = command
            .args(&self.interpreter_args)
            .arg(&entry)
            .current_dir(&dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_clear()
            .kill_on_drop(true);
        for key in FORWARDED_ENV {
            if let Ok(value) = std::env::var(key) {
                let _ = command.env(key, value);
            }
        }

        debug!(
            integration = %name,
            interpreter = %self.interpreter,
            entry = %entry.display(),
            "spawning worker"
        );

        let mut child = command.spawn().map_err(|e| SandboxError::Spawn {
            name: name.clone(),
            message: e.to_string(),
        })?;

        let stdin = child.stdin.take().ok_or_else(|| SandboxError::Spawn {
            name: name.clone(),
            message: "failed to capture worker stdin".into(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| SandboxError::Spawn {
            name: name.clone(),
            message: "failed to capture worker stdout".into(),
        })?;

        // Drain stderr concurrently so a chatty worker can't block on a full
        // pipe; every line lands in the log under the integration's name.
        if let Some(stderr) = child.stderr.take() {
            let worker = name.clone();
            let _ = tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: WORKER_TARGET, integration = %worker, line = %line, "worker stderr");
                }
            });
        }

        let exchange = drive_exchange(&name, stdin, stdout, &invocation, capabilities);
        tokio::pin!(exchange);

        let result = tokio::select! {
            result = &mut exchange => result,
            () = tokio::time::sleep(timeout) => {
                warn!(
                    integration = %name,
                    timeout_ms = timeout.as_millis() as u64,
                    "worker timed out, killing process"
                );
                Err(SandboxError::Timeout {
                    name: name.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
            () = cancel.cancelled() => {
                debug!(integration = %name, "worker cancelled, killing process");
                Err(SandboxError::Cancelled { name: name.clone() })
            }
        };

        // Success means the terminal frame is already in hand; failure means
        // the worker missed its window. Either way it is done now.
        let _ = child.kill().await;
        let _ = child.wait().await;
        drop(scratch);

        result
    }
}

/// Write the invoke frame, then pump worker frames until a terminal one.
async fn drive_exchange(
    name: &str,
    mut stdin: ChildStdin,
    stdout: ChildStdout,
    invocation: &ModuleInvocation,
    capabilities: &CapabilitySet,
) -> Result<Value, SandboxError> {
    let invoke = HostFrame::Invoke {
        function: invocation.function,
        context: invocation.context.clone(),
        secrets: serde_json::to_value(&invocation.secrets).unwrap_or(Value::Null),
        data_files: invocation.data_files.clone(),
    };
    write_frame(name, &mut stdin, &invoke).await?;

    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|source| SandboxError::Io {
                name: name.to_string(),
                source,
            })?;
        let Some(line) = line else {
            return Err(SandboxError::Protocol {
                name: name.to_string(),
                message: "worker exited without a terminal frame".into(),
            });
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let frame: WorkerFrame =
            serde_json::from_str(trimmed).map_err(|e| SandboxError::Protocol {
                name: name.to_string(),
                message: format!("malformed worker frame: {e}"),
            })?;

        match frame {
            WorkerFrame::Call { id, method, params } => {
                let reply = match capabilities.dispatch(method, params).await {
                    Ok(value) => HostFrame::Reply {
                        id,
                        ok: true,
                        value,
                        error: None,
                    },
                    Err(error) => HostFrame::Reply {
                        id,
                        ok: false,
                        value: Value::Null,
                        error: Some(error),
                    },
                };
                write_frame(name, &mut stdin, &reply).await?;
            }
            WorkerFrame::Log { level, message } => match level {
                LogLevel::Debug => {
                    debug!(target: WORKER_TARGET, integration = %name, "{message}");
                }
                LogLevel::Info => {
                    tracing::info!(target: WORKER_TARGET, integration = %name, "{message}");
                }
                LogLevel::Warn => {
                    warn!(target: WORKER_TARGET, integration = %name, "{message}");
                }
                LogLevel::Error => {
                    tracing::error!(target: WORKER_TARGET, integration = %name, "{message}");
                }
            },
            WorkerFrame::Result { value } => return Ok(value),
            WorkerFrame::Error { message } => {
                return Err(SandboxError::Module {
                    name: name.to_string(),
                    message,
                });
            }
        }
    }
}

async fn write_frame(
    name: &str,
    stdin: &mut ChildStdin,
    frame: &HostFrame,
) -> Result<(), SandboxError> {
    let mut line = serde_json::to_string(frame).map_err(|e| SandboxError::Protocol {
        name: name.to_string(),
        message: format!("failed to encode host frame: {e}"),
    })?;
    line.push('\n');
    stdin
        .write_all(line.as_bytes())
        .await
        .map_err(|source| SandboxError::Io {
            name: name.to_string(),
            source,
        })?;
    stdin.flush().await.map_err(|source| SandboxError::Io {
        name: name.to_string(),
        source,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
