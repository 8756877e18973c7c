//! Environment checks that run before any deployment action
//!
//! Each check is fatal on its own and the first failure stops the run.

use std::path::PathBuf;
use std::sync::Arc;

use panther_deploy_process::{CommandRunner, ProcessConfig};
use tracing::{debug, info, warn};

use crate::{
    context::GitVersion,
    error::{DeployError, Result},
};

/// Regions where every managed service the stacks rely on is available.
///
/// Regions missing AppSync, Cognito, Athena or Glue are rejected outright.
pub const SUPPORTED_REGIONS: &[&str] = &[
    "ap-northeast-1", // tokyo
    "ap-northeast-2", // seoul
    "ap-south-1",     // mumbai
    "ap-southeast-1", // singapore
    "ap-southeast-2", // sydney
    "ca-central-1",   // canada
    "eu-central-1",   // frankfurt
    "eu-west-1",      // ireland
    "eu-west-2",      // london
    "us-east-1",      // n. virginia
    "us-east-2",      // ohio
    "us-west-2",      // oregon
];

/// How much of the preflight to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreflightScope {
    /// Every check; used before a full deployment
    Full,
    /// Region, toolchain, runtime and version only; used for single-stack redeploys
    Redeploy,
}

/// Versions and paths the environment must satisfy
#[derive(Debug, Clone)]
pub struct PreflightRequirements {
    pub supported_regions: Vec<String>,
    /// Oldest supported Go toolchain as (major, minor)
    pub min_go: (u32, u32),
    /// Newest supported Go major version
    pub max_go_major: u32,
    /// Required prefix of `node --version`
    pub node_prefix: String,
    /// Location of the swagger binary installed by the setup step
    pub swagger_path: PathBuf,
}

impl Default for PreflightRequirements {
    fn default() -> Self {
        Self {
            supported_regions: SUPPORTED_REGIONS.iter().map(|r| r.to_string()).collect(),
            min_go: (1, 13),
            max_go_major: 1,
            node_prefix: "v12".to_string(),
            swagger_path: PathBuf::from(".setup").join("swagger"),
        }
    }
}

/// Fails the deploy early when the environment has a known issue
pub struct PreflightChecker {
    runner: Arc<dyn CommandRunner>,
    requirements: PreflightRequirements,
}

impl PreflightChecker {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self::with_requirements(runner, PreflightRequirements::default())
    }

    pub fn with_requirements(
        runner: Arc<dyn CommandRunner>,
        requirements: PreflightRequirements,
    ) -> Self {
        Self {
            runner,
            requirements,
        }
    }

    /// Run the checks for `scope` and return the version being deployed
    pub async fn run(&self, region: &str, scope: PreflightScope) -> Result<GitVersion> {
        self.check_region(region)?;
        self.check_go().await?;
        self.check_node().await?;

        if scope == PreflightScope::Full {
            self.check_docker().await?;
            self.check_swagger().await?;
        }

        let version = self.describe_version().await?;
        info!(version = %version, region = %region, "Preflight checks passed");
        Ok(version)
    }

    /// Reject regions outside the allow-list
    pub fn check_region(&self, region: &str) -> Result<()> {
        if self.requirements.supported_regions.iter().any(|r| r == region) {
            Ok(())
        } else {
            Err(DeployError::UnsupportedRegion(region.to_string()))
        }
    }

    async fn check_go(&self) -> Result<()> {
        let output = self
            .runner
            .run(ProcessConfig::new("go").arg("version"))
            .await
            .map_err(|e| DeployError::precondition("go", e.to_string()))?;

        let (major, minor) = parse_go_version(output.stdout_trimmed()).ok_or_else(|| {
            DeployError::precondition(
                "go",
                format!("unrecognized version output: {}", output.stdout_trimmed()),
            )
        })?;

        let (min_major, min_minor) = self.requirements.min_go;
        if (major, minor) < (min_major, min_minor) || major > self.requirements.max_go_major {
            return Err(DeployError::precondition(
                "go",
                format!(
                    "go{}.{} not supported, use go{}.{}+ (major version {})",
                    major, minor, min_major, min_minor, self.requirements.max_go_major
                ),
            ));
        }

        debug!(major, minor, "go toolchain ok");
        Ok(())
    }

    async fn check_node(&self) -> Result<()> {
        let output = self
            .runner
            .run(ProcessConfig::new("node").arg("--version"))
            .await
            .map_err(|e| {
                DeployError::precondition("node", format!("failed to check node version: {}", e))
            })?;

        let version = output.stdout_trimmed();
        if !version.starts_with(&self.requirements.node_prefix) {
            return Err(DeployError::precondition(
                "node",
                format!(
                    "node version must be {}.x.x, found {}",
                    self.requirements.node_prefix, version
                ),
            ));
        }
        Ok(())
    }

    async fn check_docker(&self) -> Result<()> {
        self.runner
            .run(ProcessConfig::new("docker").arg("info"))
            .await
            .map(|_| ())
            .map_err(|e| DeployError::precondition("docker", format!("docker is not available: {}", e)))
    }

    async fn check_swagger(&self) -> Result<()> {
        let swagger = self.requirements.swagger_path.display().to_string();
        self.runner
            .run(ProcessConfig::new(swagger).arg("version"))
            .await
            .map(|_| ())
            .map_err(|e| {
                DeployError::precondition(
                    "swagger",
                    format!("swagger is not available ({}): try the setup step", e),
                )
            })
    }

    async fn describe_version(&self) -> Result<GitVersion> {
        let output = self
            .runner
            .run(ProcessConfig::new("git").args(["describe", "--tags"]))
            .await
            .map_err(|e| DeployError::precondition("git", format!("git describe failed: {}", e)))?;

        let version = GitVersion::new(output.stdout_trimmed());
        if !version.is_tagged_release() {
            warn!("{} is not a tagged release, proceed at your own risk", version);
        }
        Ok(version)
    }
}

/// Parse `go version go1.15.2 linux/amd64` into (1, 15)
pub fn parse_go_version(output: &str) -> Option<(u32, u32)> {
    let token = output
        .split_whitespace()
        .find(|t| t.starts_with("go") && t[2..].starts_with(|c: char| c.is_ascii_digit()))?;
    let mut parts = token[2..].split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts
        .next()
        .map(|m| m.chars().take_while(char::is_ascii_digit).collect::<String>())
        .and_then(|m| m.parse().ok())
        .unwrap_or(0);
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use panther_deploy_process::{CommandOutput, ProcessError};
    use proptest::prelude::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Replies to commands by program name
    #[derive(Default)]
    struct ScriptedRunner {
        replies: HashMap<String, std::result::Result<String, String>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn healthy() -> Self {
            let mut runner = Self::default();
            runner.reply("go", Ok("go version go1.15.2 linux/amd64"));
            runner.reply("node", Ok("v12.16.3\n"));
            runner.reply("docker", Ok("Server Version: 19.03"));
            runner.reply(".setup/swagger", Ok("version: v0.23.0"));
            runner.reply("git", Ok("v1.2.3\n"));
            runner
        }

        fn reply(&mut self, program: &str, reply: std::result::Result<&str, &str>) {
            self.replies.insert(
                program.to_string(),
                reply.map(str::to_string).map_err(str::to_string),
            );
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, config: ProcessConfig) -> panther_deploy_process::Result<CommandOutput> {
            self.calls.lock().unwrap().push(config.command.clone());
            match self.replies.get(&config.command) {
                Some(Ok(stdout)) => Ok(CommandOutput {
                    stdout: stdout.clone(),
                    stderr: String::new(),
                }),
                Some(Err(stderr)) => Err(ProcessError::Failed {
                    command: config.to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: stderr.clone(),
                }),
                None => Err(ProcessError::NotInstalled {
                    command: config.command.clone(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_full_preflight_passes() {
        let checker = PreflightChecker::new(Arc::new(ScriptedRunner::healthy()));
        let version = checker.run("us-west-2", PreflightScope::Full).await.unwrap();
        assert_eq!(version.as_str(), "v1.2.3");
    }

    #[tokio::test]
    async fn test_untagged_version_still_passes() {
        let mut runner = ScriptedRunner::healthy();
        runner.reply("git", Ok("v1.2.3-45-gabc"));
        let checker = PreflightChecker::new(Arc::new(runner));

        let version = checker.run("us-east-1", PreflightScope::Full).await.unwrap();
        assert!(!version.is_tagged_release());
    }

    #[tokio::test]
    async fn test_unsupported_region_runs_nothing() {
        let runner = Arc::new(ScriptedRunner::healthy());
        let checker = PreflightChecker::new(runner.clone());

        let err = checker.run("us-west-1", PreflightScope::Full).await.unwrap_err();
        assert!(matches!(err, DeployError::UnsupportedRegion(ref r) if r == "us-west-1"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_old_go_rejected() {
        let mut runner = ScriptedRunner::healthy();
        runner.reply("go", Ok("go version go1.12.9 darwin/amd64"));
        let checker = PreflightChecker::new(Arc::new(runner));

        let err = checker.run("us-east-1", PreflightScope::Full).await.unwrap_err();
        assert!(matches!(err, DeployError::Precondition { ref check, .. } if check == "go"));
    }

    #[tokio::test]
    async fn test_wrong_node_major_rejected() {
        let mut runner = ScriptedRunner::healthy();
        runner.reply("node", Ok("v14.4.0"));
        let checker = PreflightChecker::new(Arc::new(runner));

        let err = checker.run("us-east-1", PreflightScope::Full).await.unwrap_err();
        assert!(err.to_string().contains("node version must be v12.x.x"));
    }

    #[tokio::test]
    async fn test_docker_down_fails_fast() {
        let mut runner = ScriptedRunner::healthy();
        runner.reply("docker", Err("Cannot connect to the Docker daemon"));
        let runner = Arc::new(runner);
        let checker = PreflightChecker::new(runner.clone());

        let err = checker.run("us-east-1", PreflightScope::Full).await.unwrap_err();
        assert!(matches!(err, DeployError::Precondition { ref check, .. } if check == "docker"));
        // Later checks never ran
        assert!(!runner.calls().contains(&"git".to_string()));
    }

    #[tokio::test]
    async fn test_redeploy_scope_skips_docker_and_swagger() {
        let mut runner = ScriptedRunner::healthy();
        runner.reply("docker", Err("down"));
        runner.replies.remove(".setup/swagger");
        let runner = Arc::new(runner);
        let checker = PreflightChecker::new(runner.clone());

        checker.run("eu-west-1", PreflightScope::Redeploy).await.unwrap();
        assert_eq!(runner.calls(), vec!["go", "node", "git"]);
    }

    #[tokio::test]
    async fn test_git_describe_failure_is_fatal() {
        let mut runner = ScriptedRunner::healthy();
        runner.reply("git", Err("fatal: No names found"));
        let checker = PreflightChecker::new(Arc::new(runner));

        let err = checker.run("us-east-1", PreflightScope::Redeploy).await.unwrap_err();
        assert!(matches!(err, DeployError::Precondition { ref check, .. } if check == "git"));
    }

    #[test]
    fn test_parse_go_version() {
        assert_eq!(parse_go_version("go version go1.15.2 linux/amd64"), Some((1, 15)));
        assert_eq!(parse_go_version("go version go1.14 darwin/amd64"), Some((1, 14)));
        assert_eq!(parse_go_version("go version go1.16rc1 linux/amd64"), Some((1, 16)));
        assert_eq!(parse_go_version("go version devel"), None);
    }

    proptest! {
        #[test]
        fn prop_supported_regions_pass(idx in 0usize..SUPPORTED_REGIONS.len()) {
            let checker = PreflightChecker::new(Arc::new(ScriptedRunner::default()));
            prop_assert!(checker.check_region(SUPPORTED_REGIONS[idx]).is_ok());
        }

        #[test]
        fn prop_other_regions_fail(region in "[a-z]{2}-[a-z]{4,9}-[0-9]") {
            prop_assume!(!SUPPORTED_REGIONS.contains(&region.as_str()));
            let checker = PreflightChecker::new(Arc::new(ScriptedRunner::default()));
            let is_unsupported = matches!(
                checker.check_region(&region),
                Err(DeployError::UnsupportedRegion(_))
            );
            prop_assert!(is_unsupported);
        }
    }
}
