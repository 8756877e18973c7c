//! Seams to the provisioning backend and account services
//!
//! The orchestrator never talks to the cloud directly. Everything it needs
//! from the outside world comes through these traits so the full graph can be
//! exercised against in-memory fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{OutputSet, StackSpec};

/// Errors surfaced by the provisioning backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    /// The requested resource does not exist
    #[error("{0} does not exist")]
    NotFound(String),

    /// The backend refused the template or its parameters
    #[error("stack {stack} was rejected: {message}")]
    Rejected { stack: String, message: String },

    /// Any other backend failure
    #[error("{0}")]
    Backend(String),
}

impl ProvisioningError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvisioningError::NotFound(_))
    }
}

/// Creates, updates, deletes and inspects stacks
#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    /// Create or update the stack and return its outputs
    async fn deploy_template(&self, stack: &StackSpec) -> Result<OutputSet, ProvisioningError>;

    /// Delete the stack; a stack that does not exist counts as deleted
    async fn delete_stack(&self, stack_name: &str) -> Result<(), ProvisioningError>;

    /// Outputs of an already-deployed stack
    async fn stack_outputs(&self, stack_name: &str) -> Result<OutputSet, ProvisioningError>;
}

/// A user already present in the deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingUser {
    pub email: String,
}

/// Lists users of an existing deployment
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `NotFound` means the user service itself has not been deployed yet
    async fn list_users(&self) -> Result<Vec<ExistingUser>, ProvisioningError>;
}

/// Reads the table definitions currently deployed in the data catalog
#[async_trait]
pub trait TableCatalog: Send + Sync {
    /// Content signature over every deployed table definition
    async fn deployed_tables_signature(&self) -> Result<String, ProvisioningError>;
}

/// Resolves the account credentials point at
#[async_trait]
pub trait AccountIdentity: Send + Sync {
    async fn account_id(&self) -> Result<String, ProvisioningError>;
}
