// Command handlers for the panther-deploy CLI

pub mod deploy;

pub use deploy::DeployCommand;

use crate::error::CliResult;

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}
