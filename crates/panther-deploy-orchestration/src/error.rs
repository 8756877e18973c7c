//! Error types for deployment orchestration

use thiserror::Error;

use crate::provisioning::ProvisioningError;

/// Errors that can occur while deploying
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("panther is not supported in {0} region")]
    UnsupportedRegion(String),

    #[error("{check} check failed: {message}")]
    Precondition { check: String, message: String },

    #[error("output {key} from {stack} already exists in the accumulated outputs")]
    OutputCollision { key: String, stack: String },

    #[error("{stack} failed: {source}")]
    Provisioning {
        stack: String,
        #[source]
        source: ProvisioningError,
    },

    #[error("{stack} skipped: dependency {dependency} did not deploy")]
    DependencyFailed { stack: String, dependency: String },

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Artifact build failed: {0}")]
    Artifact(String),

    #[error("unknown stack '{0}'")]
    UnknownStack(String),

    #[error("{label} failed: {count} error(s): {}", .failed.join(", "))]
    StacksFailed {
        label: String,
        count: usize,
        failed: Vec<String>,
    },

    #[error("Invalid deployment graph: {0}")]
    InvalidGraph(String),

    #[error("{task} panicked: {message}")]
    TaskPanicked { task: String, message: String },

    #[error("Settings error: {0}")]
    Settings(#[from] panther_deploy_config::ConfigError),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeployError {
    /// Shorthand for a failed environment precondition
    pub fn precondition(check: impl Into<String>, message: impl Into<String>) -> Self {
        DeployError::Precondition {
            check: check.into(),
            message: message.into(),
        }
    }
}

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, DeployError>;
