//! Process manager - run commands to completion

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::{
    config::ProcessConfig,
    error::{ProcessError, Result},
};

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured stdout (empty when stdio was inherited)
    pub stdout: String,
    /// Captured stderr (empty when stdio was inherited)
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout without surrounding whitespace
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Runs external commands
#[derive(Debug, Clone, Default)]
pub struct ProcessManager;

impl ProcessManager {
    /// Create new process manager
    pub fn new() -> Self {
        Self
    }

    /// Run a command to completion and capture its output
    ///
    /// A non-zero exit status becomes [`ProcessError::Failed`] carrying the
    /// captured stderr, so callers can match on backend error codes.
    pub async fn output(&self, config: &ProcessConfig) -> Result<CommandOutput> {
        Self::ensure_installed(&config.command)?;

        debug!(
            command = %config.command,
            args = ?config.args,
            "Running process"
        );

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        cmd.stdin(if config.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        if config.inherit_stdio {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn()?;
        if let (Some(data), Some(mut stdin)) = (config.stdin.as_ref(), child.stdin.take()) {
            stdin.write_all(data.as_bytes()).await?;
            // Closing stdin signals end of input
            drop(stdin);
        }
        let output = match config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| ProcessError::Timeout {
                    command: config.command.clone(),
                    seconds: timeout.as_secs(),
                })??,
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8(output.stdout).map_err(|_| ProcessError::InvalidOutput {
            command: config.command.clone(),
        })?;
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ProcessError::Failed {
                command: config.to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        debug!(command = %config.command, "Process finished");
        Ok(CommandOutput { stdout, stderr })
    }

    fn ensure_installed(command: &str) -> Result<()> {
        // Explicit paths are checked at spawn time
        if Path::new(command).components().count() > 1 {
            return Ok(());
        }
        which::which(command).map(|_| ()).map_err(|_| ProcessError::NotInstalled {
            command: command.to_string(),
        })
    }
}
