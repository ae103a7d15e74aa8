//! Process-per-call worker bridge.
//!
//! Every heavyweight operation (chat inference, scraping, reindexing,
//! file processing, speech synthesis) runs in an external script launched
//! once per request. The contract is a single JSON object written to the
//! worker's stdin, which is then closed; the worker replies with JSON (or
//! raw bytes, for speech) on stdout, diagnostics on stderr, and signals
//! success solely via exit code 0. Nothing is streamed before exit.
//!
//! [`WorkerPool`] is the seam: callers hold a `dyn WorkerPool`, so the
//! process-spawn strategy can later be swapped for a persistent RPC
//! connection without touching the handlers. [`ProcessWorkerPool`] is the
//! spawning implementation.
//!
//! Invocation never returns `Err`: process-level failures (nonzero exit,
//! timeout, broken pipes) are folded into [`WorkerOutcome`]. The only
//! hard error is a missing script, caught once at construction.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::{Config, WorkerConfig, WorkersConfig};

/// Maximum bytes of unparseable stdout kept for diagnostics.
const DEGRADED_STDOUT_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerOp {
    Chat,
    Scrape,
    Reindex,
    FileProcess,
    Tts,
}

impl WorkerOp {
    pub const ALL: [WorkerOp; 5] = [
        WorkerOp::Chat,
        WorkerOp::Scrape,
        WorkerOp::Reindex,
        WorkerOp::FileProcess,
        WorkerOp::Tts,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WorkerOp::Chat => "chat",
            WorkerOp::Scrape => "scrape",
            WorkerOp::Reindex => "reindex",
            WorkerOp::FileProcess => "file-process",
            WorkerOp::Tts => "tts",
        }
    }

    /// Speech synthesis emits an audio byte buffer, not JSON.
    pub fn expects_binary(&self) -> bool {
        matches!(self, WorkerOp::Tts)
    }
}

/// The resolution of one worker invocation.
#[derive(Debug, Clone)]
pub enum WorkerOutcome {
    /// Exit 0 with parseable JSON on stdout.
    Json(Value),
    /// Exit 0; raw stdout bytes (binary operations only).
    Binary(Vec<u8>),
    /// Exit 0 but stdout was not valid JSON. Callers substitute a
    /// documented per-operation default rather than failing hard.
    Degraded { stdout: String },
    Failed(WorkerFailure),
}

#[derive(Debug, Clone)]
pub enum WorkerFailure {
    NonZeroExit { code: Option<i32>, stderr: String },
    Timeout { secs: u64 },
    Io(String),
}

impl std::fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerFailure::NonZeroExit { code, stderr } => {
                let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                if stderr.is_empty() {
                    write!(f, "worker exited with status {}", code)
                } else {
                    write!(f, "worker exited with status {}: {}", code, stderr)
                }
            }
            WorkerFailure::Timeout { secs } => {
                write!(f, "worker timed out after {} seconds", secs)
            }
            WorkerFailure::Io(message) => write!(f, "worker I/O error: {}", message),
        }
    }
}

/// A pool of named workers, one `invoke` per operation.
#[async_trait]
pub trait WorkerPool: Send + Sync {
    async fn invoke(&self, op: WorkerOp, payload: Value) -> WorkerOutcome;
}

/// Spawns one OS process per invocation, per the stdio contract above.
pub struct ProcessWorkerPool {
    command: String,
    workers: WorkersConfig,
}

impl ProcessWorkerPool {
    /// Build the pool, verifying every configured script exists. A missing
    /// worker executable is a configuration error surfaced at startup, not
    /// a per-call failure.
    pub fn new(config: &Config) -> Result<Self> {
        for op in WorkerOp::ALL {
            let script = &entry(&config.workers, op).script;
            anyhow::ensure!(
                script.exists(),
                "worker script for '{}' not found: {}",
                op.name(),
                script.display()
            );
        }
        Ok(Self {
            command: config.workers.command.clone(),
            workers: config.workers.clone(),
        })
    }

    async fn run(&self, op: WorkerOp, payload: &Value) -> Result<WorkerOutcome, WorkerFailure> {
        let worker = entry(&self.workers, op);

        let mut child = Command::new(&self.command)
            .arg(&worker.script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                WorkerFailure::Io(format!(
                    "failed to spawn {} {}: {}",
                    self.command,
                    worker.script.display(),
                    e
                ))
            })?;

        // Single hand-off: write the request, then close stdin. A worker
        // that exits without reading its input surfaces as a broken pipe,
        // which is not an error under this contract.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| WorkerFailure::Io("worker stdin unavailable".to_string()))?;
        let body = serde_json::to_vec(payload)
            .map_err(|e| WorkerFailure::Io(format!("failed to encode request: {}", e)))?;
        if let Err(e) = stdin.write_all(&body).await {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(WorkerFailure::Io(format!(
                    "failed to write worker request: {}",
                    e
                )));
            }
        }
        drop(stdin);

        // kill_on_drop reaps the process when the timeout drops the future
        let timeout = Duration::from_secs(worker.timeout_secs);
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(WorkerFailure::Io(format!(
                    "failed to collect worker output: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(WorkerFailure::Timeout {
                    secs: worker.timeout_secs,
                })
            }
        };

        if !output.status.success() {
            return Err(WorkerFailure::NonZeroExit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if op.expects_binary() {
            return Ok(WorkerOutcome::Binary(output.stdout));
        }

        match serde_json::from_slice::<Value>(&output.stdout) {
            Ok(value) => Ok(WorkerOutcome::Json(value)),
            Err(_) => {
                let mut stdout = String::from_utf8_lossy(&output.stdout).to_string();
                stdout.truncate(
                    stdout
                        .char_indices()
                        .nth(DEGRADED_STDOUT_LIMIT)
                        .map_or(stdout.len(), |(i, _)| i),
                );
                tracing::warn!(
                    worker = op.name(),
                    "worker exited 0 with unparseable output"
                );
                Ok(WorkerOutcome::Degraded { stdout })
            }
        }
    }
}

#[async_trait]
impl WorkerPool for ProcessWorkerPool {
    async fn invoke(&self, op: WorkerOp, payload: Value) -> WorkerOutcome {
        match self.run(op, &payload).await {
            Ok(outcome) => outcome,
            Err(failure) => {
                tracing::warn!(worker = op.name(), error = %failure, "worker invocation failed");
                WorkerOutcome::Failed(failure)
            }
        }
    }
}

fn entry(workers: &WorkersConfig, op: WorkerOp) -> &WorkerConfig {
    match op {
        WorkerOp::Chat => &workers.chat,
        WorkerOp::Scrape => &workers.scrape,
        WorkerOp::Reindex => &workers.reindex,
        WorkerOp::FileProcess => &workers.file_process,
        WorkerOp::Tts => &workers.tts,
    }
}

/// Print the configured workers and whether their scripts resolve.
pub fn list_workers(config: &Config) -> Result<()> {
    println!("{:<14} {:<44} STATUS", "WORKER", "SCRIPT");
    for op in WorkerOp::ALL {
        let worker = entry(&config.workers, op);
        let status = if worker.script.exists() {
            "OK"
        } else {
            "MISSING"
        };
        println!(
            "{:<14} {:<44} {}",
            op.name(),
            worker.script.display(),
            status
        );
    }
    Ok(())
}
