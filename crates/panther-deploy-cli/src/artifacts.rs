// Artifact builds driven by external tools

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use panther_deploy_orchestration::{
    ArtifactBuilder, BuildStep, DeployError, LayerPackager, Result,
};
use panther_deploy_process::{CommandRunner, ProcessConfig, ProcessError};
use tracing::{debug, info};

/// Dockerfile for the web application image
pub const WEB_DOCKERFILE: &str = "deployments/web/Dockerfile";

fn artifact_error(err: ProcessError) -> DeployError {
    DeployError::Artifact(err.to_string())
}

/// Default command for each build step
pub fn default_step_command(step: BuildStep) -> ProcessConfig {
    let target = match step {
        BuildStep::Api => "build:api",
        BuildStep::Lambda => "build:lambda",
        BuildStep::ApiSpec => "build:cfn",
        BuildStep::Dashboards => "build:dashboards",
    };
    ProcessConfig::new("mage").arg(target)
}

/// Registry host of an image repository URI (`<host>/<repo>`)
pub fn registry_host(registry_uri: &str) -> &str {
    registry_uri.split('/').next().unwrap_or(registry_uri)
}

/// Builds artifacts by shelling out to the build tooling and docker
pub struct CommandArtifactBuilder {
    runner: Arc<dyn CommandRunner>,
    region: String,
    steps: Vec<(BuildStep, ProcessConfig)>,
    dockerfile: PathBuf,
}

impl CommandArtifactBuilder {
    pub fn new(runner: Arc<dyn CommandRunner>, region: impl Into<String>) -> Self {
        Self {
            runner,
            region: region.into(),
            steps: BuildStep::ALL
                .iter()
                .map(|&step| (step, default_step_command(step)))
                .collect(),
            dockerfile: PathBuf::from(WEB_DOCKERFILE),
        }
    }

    /// Replace the command run for `step`
    pub fn with_step_command(mut self, step: BuildStep, command: ProcessConfig) -> Self {
        match self.steps.iter_mut().find(|(s, _)| *s == step) {
            Some(entry) => entry.1 = command,
            None => self.steps.push((step, command)),
        }
        self
    }

    pub fn with_dockerfile(mut self, dockerfile: impl Into<PathBuf>) -> Self {
        self.dockerfile = dockerfile.into();
        self
    }

    pub fn step_command(&self, step: BuildStep) -> Option<&ProcessConfig> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, c)| c)
    }

    async fn run(&self, config: ProcessConfig) -> Result<String> {
        self.runner
            .run(config)
            .await
            .map(|output| output.stdout_trimmed().to_string())
            .map_err(artifact_error)
    }

    async fn docker_login(&self, registry_uri: &str) -> Result<()> {
        let password = self
            .run(ProcessConfig::new("aws").args([
                "ecr",
                "get-login-password",
                "--region",
                self.region.as_str(),
            ]))
            .await?;

        self.run(
            ProcessConfig::new("docker")
                .args(["login", "--username", "AWS", "--password-stdin"])
                .arg(registry_host(registry_uri))
                .stdin(password),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactBuilder for CommandArtifactBuilder {
    async fn build(&self, step: BuildStep) -> Result<()> {
        let command = self
            .step_command(step)
            .cloned()
            .ok_or_else(|| DeployError::Artifact(format!("no command configured for {}", step)))?;
        debug!(step = %step, command = %command, "running build step");
        self.run(command.inherit_stdio(true)).await?;
        Ok(())
    }

    async fn publish_frontend_image(&self, registry_uri: &str, tag: &str) -> Result<String> {
        let image = format!("{}:{}", registry_uri, tag);
        self.docker_login(registry_uri).await?;

        info!(image = %image, "building web image");
        self.run(
            ProcessConfig::new("docker")
                .arg("build")
                .arg("--file")
                .arg(self.dockerfile.display().to_string())
                .extend_args(["--tag", image.as_str(), "--quiet", "."]),
        )
        .await?;

        info!(image = %image, "pushing web image");
        self.run(ProcessConfig::new("docker").args(["push", image.as_str()]))
            .await?;
        Ok(image)
    }
}

/// Packages python libraries with `pip3` and `zip`.
///
/// Lambda expects the libraries under a top level `python/` directory inside
/// the archive.
pub struct PipLayerPackager {
    runner: Arc<dyn CommandRunner>,
}

impl PipLayerPackager {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    fn staging_dir(archive: &Path) -> PathBuf {
        let mut name = archive.file_name().unwrap_or_default().to_os_string();
        name.push(".staging");
        archive.with_file_name(name)
    }
}

#[async_trait]
impl LayerPackager for PipLayerPackager {
    async fn package(&self, libs: &[String], archive: &Path) -> Result<()> {
        let archive = if archive.is_absolute() {
            archive.to_path_buf()
        } else {
            std::env::current_dir()?.join(archive)
        };
        let staging = Self::staging_dir(&archive);
        let target = staging.join("python");

        if tokio::fs::metadata(&staging).await.is_ok() {
            tokio::fs::remove_dir_all(&staging).await?;
        }
        tokio::fs::create_dir_all(&target).await?;

        info!("downloading python libraries {}", libs.join(","));
        let pip = ProcessConfig::new("pip3")
            .args(["install", "--quiet", "-t"])
            .arg(target.display().to_string())
            .extend_args(libs.iter().cloned());
        let zip = ProcessConfig::new("zip")
            .args(["-r", "-q", "-X"])
            .arg(archive.display().to_string())
            .arg("python")
            .working_dir(&staging);

        let mut outcome = self.runner.run(pip).await;
        if outcome.is_ok() {
            outcome = self.runner.run(zip).await;
        }

        tokio::fs::remove_dir_all(&staging).await?;
        outcome.map_err(artifact_error)?;
        Ok(())
    }
}
