//! Error types for external command execution

use std::io;
use thiserror::Error;

/// Process execution errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Executable could not be found on PATH
    #[error("{command} is not installed or not on PATH")]
    NotInstalled { command: String },

    /// Failed to spawn process
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(#[from] io::Error),

    /// Process timed out
    #[error("{command} timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    /// Process ran but exited unsuccessfully
    #[error("{command} failed with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Output was not valid UTF-8
    #[error("{command} produced non UTF-8 output")]
    InvalidOutput { command: String },
}

impl ProcessError {
    /// Captured stderr of a failed command, empty for other variants
    pub fn stderr(&self) -> &str {
        match self {
            ProcessError::Failed { stderr, .. } => stderr,
            _ => "",
        }
    }
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;
