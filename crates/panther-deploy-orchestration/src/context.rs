//! Deployment context shared by every component of a single run

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use panther_deploy_config::DeploySettings;

/// Environment variable forcing the custom resource version
pub const CUSTOM_RESOURCE_VERSION_ENV: &str = "CUSTOM_RESOURCE_VERSION";

/// Output of `git describe --tags`.
///
/// `v1.2.3` on a tagged release, `v1.2.3-45-gabc1234` for commits past the tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitVersion(String);

impl GitVersion {
    pub fn new(describe: impl Into<String>) -> Self {
        Self(describe.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when no commits were made past the last tag
    pub fn is_tagged_release(&self) -> bool {
        !self.0.contains('-')
    }

    /// Release portion: everything before the first hyphen
    pub fn release(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token that forces custom resources to update when it changes.
///
/// An explicit override is returned verbatim. Otherwise only the release
/// portion of the version is used, so development deploys past a tag do not
/// re-trigger every custom resource.
pub fn custom_resource_version(override_value: Option<&str>, version: &GitVersion) -> String {
    match override_value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => version.release().to_string(),
    }
}

/// Read the custom resource version override from the environment
pub fn custom_resource_override_from_env() -> Option<String> {
    std::env::var(CUSTOM_RESOURCE_VERSION_ENV)
        .ok()
        .filter(|v| !v.is_empty())
}

/// Filesystem locations of build artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Root of generated build output
    pub out_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Content-addressed python layer archives live here
    pub fn layer_cache_dir(&self) -> PathBuf {
        self.out_dir.join("layers")
    }

    /// Stable archive path referenced by the gateway template
    pub fn layer_archive(&self) -> PathBuf {
        self.out_dir.join("layer.zip")
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new("out")
    }
}

/// Everything a deployment run knows about its target, populated once
#[derive(Debug, Clone)]
pub struct DeploymentContext {
    pub region: String,
    pub account_id: String,
    pub version: GitVersion,
    pub settings: Arc<DeploySettings>,
    pub custom_resource_override: Option<String>,
    pub paths: ArtifactPaths,
}

impl DeploymentContext {
    pub fn new(
        region: impl Into<String>,
        account_id: impl Into<String>,
        version: GitVersion,
        settings: DeploySettings,
    ) -> Self {
        Self {
            region: region.into(),
            account_id: account_id.into(),
            version,
            settings: Arc::new(settings),
            custom_resource_override: None,
            paths: ArtifactPaths::default(),
        }
    }

    pub fn with_custom_resource_override(mut self, value: Option<String>) -> Self {
        self.custom_resource_override = value;
        self
    }

    pub fn with_paths(mut self, paths: ArtifactPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn settings(&self) -> &DeploySettings {
        &self.settings
    }

    pub fn custom_resource_version(&self) -> String {
        custom_resource_version(self.custom_resource_override.as_deref(), &self.version)
    }
}
