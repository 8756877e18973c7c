// Deploy Panther to the configured AWS account

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use panther_deploy_config::{SettingsLoader, SettingsProvider};
use panther_deploy_orchestration::{
    custom_resource_override_from_env, ArtifactPaths, DeployOutcome, DeployRequest,
    DeployServices, Deployment,
};
use panther_deploy_process::{CommandRunner, ProcessManager};
use tracing::info;

use super::Command;
use crate::artifacts::{CommandArtifactBuilder, PipLayerPackager};
use crate::aws::{resolve_region, AwsCli};
use crate::error::CliResult;
use crate::prompt::StdinPrompter;

/// Environment variable selecting single-stack mode
pub const STACK_ENV: &str = "STACK";

/// Render an elapsed time the way operators read it: `42.3s` or `12m05s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h{:02}m{:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Summary lines logged after a successful run
pub fn completion_lines(outcome: &DeployOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "deploy: finished successfully in {}",
        format_elapsed(outcome.elapsed())
    )];
    if let Some(url) = outcome.app_url() {
        lines.push(format!("***** Panther URL = https://{}", url));
    }
    lines
}

/// Deploy every stack, or a single one when a stack name is given
pub struct DeployCommand {
    stack: Option<String>,
    region: Option<String>,
    config: Option<PathBuf>,
    out_dir: Option<PathBuf>,
}

impl DeployCommand {
    pub fn new() -> Self {
        Self {
            stack: None,
            region: None,
            config: None,
            out_dir: None,
        }
    }

    /// An explicit stack; falls back to `$STACK` when unset
    pub fn with_stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn with_config(mut self, config: Option<PathBuf>) -> Self {
        self.config = config;
        self
    }

    pub fn with_out_dir(mut self, out_dir: Option<PathBuf>) -> Self {
        self.out_dir = out_dir;
        self
    }

    fn requested_stack(&self) -> Option<String> {
        self.stack
            .clone()
            .or_else(|| std::env::var(STACK_ENV).ok())
    }

    fn settings(&self) -> Arc<dyn SettingsProvider> {
        match &self.config {
            Some(path) => Arc::new(SettingsLoader::with_path(path)),
            None => Arc::new(SettingsLoader::new()),
        }
    }

    fn services(&self, runner: Arc<dyn CommandRunner>, region: &str) -> DeployServices {
        let aws = Arc::new(AwsCli::new(runner.clone(), region));
        DeployServices {
            runner: runner.clone(),
            settings: self.settings(),
            provisioner: aws.clone(),
            users: aws.clone(),
            tables: aws.clone(),
            identity: aws,
            builder: Arc::new(CommandArtifactBuilder::new(runner.clone(), region)),
            packager: Arc::new(PipLayerPackager::new(runner)),
            prompter: Arc::new(StdinPrompter::stdio()),
        }
    }
}

impl Default for DeployCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Command for DeployCommand {
    async fn execute(&self) -> CliResult<()> {
        let runner: Arc<dyn CommandRunner> = Arc::new(ProcessManager::new());
        let region = resolve_region(self.region.clone(), runner.as_ref()).await?;

        let request = DeployRequest::new(region.clone())
            .with_stack(self.requested_stack())
            .with_custom_resource_override(custom_resource_override_from_env());

        let mut deployment = Deployment::new(self.services(runner, &region));
        if let Some(out_dir) = &self.out_dir {
            deployment = deployment.with_paths(ArtifactPaths::new(out_dir));
        }

        let outcome = deployment.run(request).await?;
        for line in completion_lines(&outcome) {
            info!("{}", line);
        }
        Ok(())
    }
}
