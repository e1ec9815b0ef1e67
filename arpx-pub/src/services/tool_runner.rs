//! External tool supervision
//!
//! **[APX-RUN-010]** Single point through which every external tool is
//! invoked. Arguments are passed as a structured argv (never a shell
//! string), so user-controlled filenames cannot inject commands. A
//! non-zero exit is not an error here: the captured exit code and
//! streams are returned and the calling stage maps them to an outcome.
//!
//! **[APX-RUN-020]** Each invocation is bounded by a wall-clock
//! timeout; on expiry the child process is terminated. A process-wide
//! semaphore bounds how many tools run concurrently across all
//! sessions.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::debug;

/// Tool invocation errors (supervision faults, not tool failures)
#[derive(Debug, Error)]
pub enum ToolError {
    /// Binary missing or not executable
    #[error("failed to launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Wall-clock budget exceeded; the child was killed
    #[error("{tool} did not finish within {limit_secs}s")]
    Timeout { tool: String, limit_secs: u64 },

    /// Child spawned but its output could not be collected
    #[error("failed to collect output from {tool}: {source}")]
    Wait {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// Concurrency gate unavailable (runner shutting down)
    #[error("tool supervisor unavailable")]
    Supervisor,
}

/// Captured result of one tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code; `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Diagnostic text for stage errors: stderr tail, falling back to
    /// stdout when the tool wrote nothing to stderr
    pub fn diagnostic(&self) -> String {
        const DIAG_LIMIT: usize = 1000;
        let text = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };
        let start = text
            .char_indices()
            .rev()
            .nth(DIAG_LIMIT - 1)
            .map(|(i, _)| i)
            .unwrap_or(0);
        text[start..].to_string()
    }
}

/// Shared subprocess runner
///
/// Stateless apart from the concurrency gate; a single instance is
/// shared by all stages across all concurrent sessions.
pub struct ToolRunner {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            timeout,
        }
    }

    /// Run an external tool to completion
    ///
    /// Returns `Ok` for any exit status; `Err` only for supervision
    /// faults (launch failure, timeout, output collection).
    pub async fn run<I, S>(
        &self,
        tool: &str,
        args: I,
        workdir: &Path,
    ) -> Result<ToolOutput, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ToolError::Supervisor)?;

        debug!(tool = tool, workdir = %workdir.display(), "Running external tool");

        let mut cmd = Command::new(tool);
        cmd.args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout drops the Child,
            // which kills the process because of this flag.
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| ToolError::Launch {
            tool: tool.to_string(),
            source,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ToolError::Wait {
                    tool: tool.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(ToolError::Timeout {
                    tool: tool.to_string(),
                    limit_secs: self.timeout.as_secs(),
                })
            }
        };

        let result = ToolOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!(
            tool = tool,
            exit_code = ?result.exit_code,
            "External tool finished"
        );

        Ok(result)
    }
}
