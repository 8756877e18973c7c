//! Command runner seam
//!
//! Components that shell out depend on [`CommandRunner`] rather than on
//! [`ProcessManager`] directly so they can be exercised with scripted output.

use async_trait::async_trait;

use crate::{
    config::ProcessConfig,
    error::Result,
    manager::{CommandOutput, ProcessManager},
};

/// Runs a command to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command and return its captured output
    async fn run(&self, config: ProcessConfig) -> Result<CommandOutput>;
}

#[async_trait]
impl CommandRunner for ProcessManager {
    async fn run(&self, config: ProcessConfig) -> Result<CommandOutput> {
        self.output(&config).await
    }
}
