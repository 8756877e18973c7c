//! Deploys one stack: prerequisite builds, parameters, backend call

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    artifacts::{ArtifactBuilder, MemoizedBuilder},
    context::DeploymentContext,
    error::{DeployError, Result},
    layer_cache::LayerCache,
    models::{OutputSet, StackId, StackSpec},
    params::ParameterAssembler,
    provisioning::{ProvisioningClient, ProvisioningError, TableCatalog},
};

/// Output key of the bucket packaged artifacts are uploaded to
pub const SOURCE_BUCKET_OUTPUT: &str = "SourceBucket";

/// Output key of the container registry the web image is pushed to
pub const IMAGE_REGISTRY_OUTPUT: &str = "ImageRegistryUri";

/// Collaborators shared by every stack deployment in a run.
///
/// Cheap to clone: parallel tasks each get their own handle.
#[derive(Clone)]
pub struct StackDeployer {
    ctx: Arc<DeploymentContext>,
    provisioner: Arc<dyn ProvisioningClient>,
    builder: Arc<MemoizedBuilder>,
    layers: Arc<LayerCache>,
    tables: Arc<dyn TableCatalog>,
}

impl StackDeployer {
    pub fn new(
        ctx: Arc<DeploymentContext>,
        provisioner: Arc<dyn ProvisioningClient>,
        builder: Arc<MemoizedBuilder>,
        layers: Arc<LayerCache>,
        tables: Arc<dyn TableCatalog>,
    ) -> Self {
        Self {
            ctx,
            provisioner,
            builder,
            layers,
            tables,
        }
    }

    pub fn context(&self) -> &DeploymentContext {
        &self.ctx
    }

    pub fn builder(&self) -> &MemoizedBuilder {
        &self.builder
    }

    pub fn provisioner(&self) -> &Arc<dyn ProvisioningClient> {
        &self.provisioner
    }

    /// Deploy `id` reading upstream values from `outputs`
    pub async fn deploy(&self, id: StackId, outputs: &OutputSet) -> Result<OutputSet> {
        for step in id.build_steps() {
            self.builder.build(*step).await?;
        }

        let assembler = ParameterAssembler::new(&self.ctx);
        let bucket = outputs.get(SOURCE_BUCKET_OUTPUT);

        let spec = match id {
            StackId::Bootstrap => StackSpec::new(id, assembler.bootstrap()),
            StackId::Gateway => {
                self.ensure_python_layer().await?;
                StackSpec::new(id, assembler.gateway(outputs)).with_artifact_bucket(bucket)
            }
            StackId::Appsync => {
                StackSpec::new(id, assembler.appsync(outputs)).with_artifact_bucket(bucket)
            }
            StackId::CloudSecurity => {
                StackSpec::new(id, assembler.cloud_security(outputs)).with_artifact_bucket(bucket)
            }
            StackId::Core => StackSpec::new(id, assembler.core(outputs)).with_artifact_bucket(bucket),
            StackId::Dashboards => {
                StackSpec::new(id, assembler.dashboards()).with_artifact_bucket(bucket)
            }
            StackId::LogAnalysis => {
                let signature = self
                    .tables
                    .deployed_tables_signature()
                    .await
                    .map_err(|e| DeployError::Lookup(format!("table signature: {}", e)))?;
                StackSpec::new(id, assembler.log_analysis(outputs, &signature))
                    .with_artifact_bucket(bucket)
            }
            StackId::Frontend => {
                let image = self
                    .builder
                    .publish_frontend_image(
                        outputs.get(IMAGE_REGISTRY_OUTPUT),
                        self.ctx.version.as_str(),
                    )
                    .await?;
                StackSpec::new(id, assembler.frontend(outputs, &image)).with_artifact_bucket(bucket)
            }
            StackId::Onboard => {
                if !self.ctx.settings().setup.onboard_self {
                    return self.delete(id).await;
                }
                StackSpec::new(id, assembler.onboard(outputs)).with_artifact_bucket(bucket)
            }
        };

        info!(stack = %id, template = %spec.template, "deploying");
        self.provisioner
            .deploy_template(&spec)
            .await
            .map_err(|source| provisioning(id, source))
    }

    /// Onboarding was switched off: remove the stack instead of deploying it
    async fn delete(&self, id: StackId) -> Result<OutputSet> {
        info!(stack = %id, "onboard_self is disabled, deleting stack");
        self.provisioner
            .delete_stack(id.stack_name())
            .await
            .map_err(|source| provisioning(id, source))?;
        Ok(OutputSet::new())
    }

    async fn ensure_python_layer(&self) -> Result<()> {
        let infra = &self.ctx.settings().infra;
        if !infra.python_layer_version_arn.is_empty() {
            debug!("using configured python layer, skipping layer build");
            return Ok(());
        }
        self.layers.ensure(&infra.pip_layer).await?;
        Ok(())
    }
}

fn provisioning(id: StackId, source: ProvisioningError) -> DeployError {
    DeployError::Provisioning {
        stack: id.stack_name().to_string(),
        source,
    }
}
