//! Top-level deploy driver
//!
//! Wires preflight, settings, first-user resolution and the deployment
//! context together, then hands off to the full orchestrator or to a
//! single-stack redeploy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use panther_deploy_config::SettingsProvider;
use panther_deploy_process::CommandRunner;
use tracing::info;

use crate::{
    artifacts::{ArtifactBuilder, MemoizedBuilder},
    context::{ArtifactPaths, DeploymentContext, GitVersion},
    deployer::StackDeployer,
    error::{DeployError, Result},
    first_user::{resolve_first_user, Prompter},
    graph::DeploymentGraph,
    layer_cache::{LayerCache, LayerPackager},
    models::{OutputSet, StackId},
    orchestrator::{DeployOrchestrator, DeploymentReport},
    preflight::{PreflightChecker, PreflightRequirements, PreflightScope},
    provisioning::{AccountIdentity, ProvisioningClient, TableCatalog, UserDirectory},
    redeploy::SingleStackRedeploy,
};

/// Output key holding the web application's host name
pub const APP_URL_OUTPUT: &str = "LoadBalancerUrl";

/// External collaborators of a deployment
#[derive(Clone)]
pub struct DeployServices {
    pub runner: Arc<dyn CommandRunner>,
    pub settings: Arc<dyn SettingsProvider>,
    pub provisioner: Arc<dyn ProvisioningClient>,
    pub users: Arc<dyn UserDirectory>,
    pub tables: Arc<dyn TableCatalog>,
    pub identity: Arc<dyn AccountIdentity>,
    pub builder: Arc<dyn ArtifactBuilder>,
    pub packager: Arc<dyn LayerPackager>,
    pub prompter: Arc<dyn Prompter>,
}

/// What to deploy and where
#[derive(Debug, Clone, Default)]
pub struct DeployRequest {
    pub region: String,
    /// Stack name for single-stack mode; `None` deploys everything
    pub stack: Option<String>,
    /// Forces the custom resource version when set
    pub custom_resource_override: Option<String>,
}

impl DeployRequest {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }

    /// Blank names are treated as "no stack"
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_custom_resource_override(mut self, value: Option<String>) -> Self {
        self.custom_resource_override = value.filter(|v| !v.is_empty());
        self
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub enum DeployOutcome {
    Full(DeploymentReport),
    Single {
        stack: StackId,
        outputs: OutputSet,
        elapsed: Duration,
    },
}

impl DeployOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            DeployOutcome::Full(report) => report.elapsed,
            DeployOutcome::Single { elapsed, .. } => *elapsed,
        }
    }

    /// Web application host; only known after a full deploy
    pub fn app_url(&self) -> Option<&str> {
        match self {
            DeployOutcome::Full(report) => {
                Some(report.outputs.get(APP_URL_OUTPUT)).filter(|url| !url.is_empty())
            }
            DeployOutcome::Single { .. } => None,
        }
    }
}

pub struct Deployment {
    services: DeployServices,
    paths: ArtifactPaths,
    requirements: PreflightRequirements,
    graph: DeploymentGraph,
}

impl Deployment {
    pub fn new(services: DeployServices) -> Self {
        Self {
            services,
            paths: ArtifactPaths::default(),
            requirements: PreflightRequirements::default(),
            graph: DeploymentGraph::standard(),
        }
    }

    pub fn with_paths(mut self, paths: ArtifactPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_requirements(mut self, requirements: PreflightRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_graph(mut self, graph: DeploymentGraph) -> Self {
        self.graph = graph;
        self
    }

    pub async fn run(&self, request: DeployRequest) -> Result<DeployOutcome> {
        let start = Instant::now();

        // Resolve the stack name before touching anything
        let single = request.stack.as_deref().map(StackId::parse).transpose()?;

        let checker =
            PreflightChecker::with_requirements(self.services.runner.clone(), self.requirements.clone());

        match single {
            Some(id) => {
                let version = checker.run(&request.region, PreflightScope::Redeploy).await?;
                let mut settings = self.services.settings.load_settings()?;
                if id.needs_first_user() {
                    resolve_first_user(
                        &mut settings,
                        self.services.users.as_ref(),
                        self.services.prompter.as_ref(),
                    )
                    .await?;
                }
                let account_id = self.account_id().await?;

                let ctx = self.context(&request, account_id, version, settings);
                let outputs = SingleStackRedeploy::new(self.deployer(ctx)).redeploy(id).await?;
                Ok(DeployOutcome::Single {
                    stack: id,
                    outputs,
                    elapsed: start.elapsed(),
                })
            }
            None => {
                let version = checker.run(&request.region, PreflightScope::Full).await?;
                let mut settings = self.services.settings.load_settings()?;
                let account_id = self.account_id().await?;
                info!(
                    "deploying Panther {} to account {} ({})",
                    version, account_id, request.region
                );

                resolve_first_user(
                    &mut settings,
                    self.services.users.as_ref(),
                    self.services.prompter.as_ref(),
                )
                .await?;

                let ctx = self.context(&request, account_id, version, settings);
                let report = DeployOrchestrator::new(self.deployer(ctx), self.graph.clone())
                    .deploy_all()
                    .await?;
                Ok(DeployOutcome::Full(report))
            }
        }
    }

    async fn account_id(&self) -> Result<String> {
        self.services
            .identity
            .account_id()
            .await
            .map_err(|e| DeployError::Lookup(format!("failed to get caller identity: {}", e)))
    }

    fn context(
        &self,
        request: &DeployRequest,
        account_id: String,
        version: GitVersion,
        settings: panther_deploy_config::DeploySettings,
    ) -> Arc<DeploymentContext> {
        Arc::new(
            DeploymentContext::new(&request.region, account_id, version, settings)
                .with_custom_resource_override(request.custom_resource_override.clone())
                .with_paths(self.paths.clone()),
        )
    }

    fn deployer(&self, ctx: Arc<DeploymentContext>) -> StackDeployer {
        let layers = LayerCache::new(
            ctx.paths.layer_cache_dir(),
            ctx.paths.layer_archive(),
            self.services.packager.clone(),
        );
        StackDeployer::new(
            ctx,
            self.services.provisioner.clone(),
            Arc::new(MemoizedBuilder::new(self.services.builder.clone())),
            Arc::new(layers),
            self.services.tables.clone(),
        )
    }
}
