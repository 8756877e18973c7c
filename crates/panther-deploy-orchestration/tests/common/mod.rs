//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use panther_deploy_config::DeploySettings;
use panther_deploy_orchestration::{
    ArtifactBuilder, BuildStep, DeployError, DeploymentContext, GitVersion, LayerCache,
    LayerPackager, MemoizedBuilder, OutputSet, ProvisioningClient, ProvisioningError, Result,
    StackDeployer, StackId, StackSpec, TableCatalog,
};
use tempfile::TempDir;

/// Records every call and replies from per-stack tables
#[derive(Default)]
pub struct FakeProvisioner {
    outputs: HashMap<StackId, OutputSet>,
    failures: HashMap<StackId, ProvisioningError>,
    delays: HashMap<StackId, Duration>,
    existing: HashMap<String, OutputSet>,
    deployed: Mutex<Vec<StackSpec>>,
    deleted: Mutex<Vec<String>>,
    lookups: Mutex<Vec<String>>,
}

impl FakeProvisioner {
    /// Every stack succeeds; bootstrap stacks produce the outputs others read
    pub fn healthy() -> Self {
        Self::default()
            .with_outputs(
                StackId::Bootstrap,
                &[
                    ("SourceBucket", "panther-source"),
                    ("AlarmTopicArn", "arn:aws:sns:us-east-1:1:alarms"),
                    ("ImageRegistryUri", "1.dkr.ecr/panther-web"),
                    ("LoadBalancerUrl", "web-123.elb.amazonaws.com"),
                    ("UserPoolId", "us-east-1_pool"),
                ],
            )
            .with_outputs(
                StackId::Gateway,
                &[
                    ("AnalysisApiEndpoint", "analysis.execute-api"),
                    ("GraphQLApiId", "gql-1"),
                    ("PythonLayerVersionArn", "arn:aws:lambda:layer:1"),
                ],
            )
            .with_outputs(StackId::Core, &[("CoreQueueUrl", "https://sqs/core")])
    }

    pub fn with_outputs(mut self, id: StackId, pairs: &[(&str, &str)]) -> Self {
        self.outputs
            .insert(id, pairs.iter().map(|(k, v)| (*k, *v)).collect());
        self
    }

    pub fn failing(mut self, id: StackId, message: &str) -> Self {
        self.failures.insert(
            id,
            ProvisioningError::Rejected {
                stack: id.stack_name().to_string(),
                message: message.to_string(),
            },
        );
        self
    }

    pub fn delayed(mut self, id: StackId, millis: u64) -> Self {
        self.delays.insert(id, Duration::from_millis(millis));
        self
    }

    pub fn existing(mut self, id: StackId, pairs: &[(&str, &str)]) -> Self {
        self.existing.insert(
            id.stack_name().to_string(),
            pairs.iter().map(|(k, v)| (*k, *v)).collect(),
        );
        self
    }

    pub fn deployed_ids(&self) -> Vec<StackId> {
        self.deployed.lock().unwrap().iter().map(|s| s.id).collect()
    }

    pub fn spec(&self, id: StackId) -> Option<StackSpec> {
        self.deployed
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProvisioningClient for FakeProvisioner {
    async fn deploy_template(
        &self,
        stack: &StackSpec,
    ) -> std::result::Result<OutputSet, ProvisioningError> {
        if let Some(delay) = self.delays.get(&stack.id) {
            tokio::time::sleep(*delay).await;
        }
        self.deployed.lock().unwrap().push(stack.clone());
        if let Some(err) = self.failures.get(&stack.id) {
            return Err(err.clone());
        }
        Ok(self.outputs.get(&stack.id).cloned().unwrap_or_default())
    }

    async fn delete_stack(&self, stack_name: &str) -> std::result::Result<(), ProvisioningError> {
        self.deleted.lock().unwrap().push(stack_name.to_string());
        Ok(())
    }

    async fn stack_outputs(
        &self,
        stack_name: &str,
    ) -> std::result::Result<OutputSet, ProvisioningError> {
        self.lookups.lock().unwrap().push(stack_name.to_string());
        self.existing
            .get(stack_name)
            .cloned()
            .ok_or_else(|| ProvisioningError::NotFound(stack_name.to_string()))
    }
}

#[derive(Default)]
pub struct FakeBuilder {
    steps: Mutex<Vec<BuildStep>>,
    images: Mutex<Vec<String>>,
    fail_step: Option<BuildStep>,
}

impl FakeBuilder {
    pub fn failing(step: BuildStep) -> Self {
        Self {
            fail_step: Some(step),
            ..Default::default()
        }
    }

    pub fn steps(&self) -> Vec<BuildStep> {
        self.steps.lock().unwrap().clone()
    }

    pub fn images(&self) -> Vec<String> {
        self.images.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactBuilder for FakeBuilder {
    async fn build(&self, step: BuildStep) -> Result<()> {
        self.steps.lock().unwrap().push(step);
        if self.fail_step == Some(step) {
            return Err(DeployError::Artifact(format!("{} build failed", step)));
        }
        Ok(())
    }

    async fn publish_frontend_image(&self, registry_uri: &str, tag: &str) -> Result<String> {
        let image = format!("{}:{}", registry_uri, tag);
        self.images.lock().unwrap().push(image.clone());
        Ok(image)
    }
}

#[derive(Default)]
pub struct FakePackager {
    pub calls: Mutex<usize>,
}

#[async_trait]
impl LayerPackager for FakePackager {
    async fn package(&self, libs: &[String], archive: &Path) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        tokio::fs::write(archive, libs.join("\n")).await?;
        Ok(())
    }
}

pub struct FakeTables(pub std::result::Result<String, ProvisioningError>);

#[async_trait]
impl TableCatalog for FakeTables {
    async fn deployed_tables_signature(&self) -> std::result::Result<String, ProvisioningError> {
        self.0.clone()
    }
}

/// Everything a test needs to drive a [`StackDeployer`]
pub struct Harness {
    pub provisioner: Arc<FakeProvisioner>,
    pub builder: Arc<FakeBuilder>,
    pub packager: Arc<FakePackager>,
    pub dir: TempDir,
}

impl Harness {
    pub fn new(provisioner: FakeProvisioner) -> Self {
        Self::with_builder(provisioner, FakeBuilder::default())
    }

    pub fn with_builder(provisioner: FakeProvisioner, builder: FakeBuilder) -> Self {
        Self {
            provisioner: Arc::new(provisioner),
            builder: Arc::new(builder),
            packager: Arc::new(FakePackager::default()),
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn context(&self, settings: DeploySettings) -> Arc<DeploymentContext> {
        Arc::new(DeploymentContext::new(
            "us-east-1",
            "111122223333",
            GitVersion::new("v1.2.3-4-gabcdef0"),
            settings,
        ))
    }

    pub fn deployer(&self, settings: DeploySettings) -> StackDeployer {
        let layers = LayerCache::new(
            self.dir.path().join("layers"),
            self.dir.path().join("layer.zip"),
            self.packager.clone(),
        );
        StackDeployer::new(
            self.context(settings),
            self.provisioner.clone(),
            Arc::new(MemoizedBuilder::new(self.builder.clone())),
            Arc::new(layers),
            Arc::new(FakeTables(Ok("tables-sig".to_string()))),
        )
    }
}
