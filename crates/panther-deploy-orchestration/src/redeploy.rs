//! Redeploy a single stack of an existing deployment
//!
//! Assumes the bootstrap stacks already exist: upstream values are read from
//! the deployed stacks instead of being produced by this run.

use tracing::{info, instrument};

use crate::{
    deployer::StackDeployer,
    error::{DeployError, Result},
    models::{OutputSet, StackId},
};

pub struct SingleStackRedeploy {
    deployer: StackDeployer,
}

impl SingleStackRedeploy {
    pub fn new(deployer: StackDeployer) -> Self {
        Self { deployer }
    }

    /// Outputs of the stacks `id` reads, merged in catalogue order
    pub async fn upstream_outputs(&self, id: StackId) -> Result<OutputSet> {
        let mut outputs = OutputSet::new();
        for upstream in id.upstream_lookups() {
            let name = upstream.stack_name();
            let stack_outputs = self
                .deployer
                .provisioner()
                .stack_outputs(name)
                .await
                .map_err(|e| DeployError::Lookup(format!("outputs of {}: {}", name, e)))?;
            outputs.merge(stack_outputs, name)?;
        }
        Ok(outputs)
    }

    /// Run only the builds and lookups `id` needs, then deploy it
    #[instrument(skip(self), fields(stack = %id))]
    pub async fn redeploy(&self, id: StackId) -> Result<OutputSet> {
        let upstream = self.upstream_outputs(id).await?;
        info!(lookups = id.upstream_lookups().len(), "redeploying single stack");
        self.deployer.deploy(id, &upstream).await
    }
}
