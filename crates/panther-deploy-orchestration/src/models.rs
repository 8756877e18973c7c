//! Stack catalogue, stack requests and output sets

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DeployError, Result};

/// Prefix shared by every stack name
pub const STACK_PREFIX: &str = "panther-";

/// String-typed parameter map handed to the provisioning backend
pub type Parameters = BTreeMap<String, String>;

/// Every stack this tool knows how to deploy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StackId {
    Bootstrap,
    Gateway,
    Appsync,
    CloudSecurity,
    Core,
    Dashboards,
    Frontend,
    LogAnalysis,
    Onboard,
}

/// Build steps a stack needs before its template can be deployed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStep {
    /// Generate API clients and models
    Api,
    /// Compile and package Lambda functions
    Lambda,
    /// Embed API specs into the gateway template
    ApiSpec,
    /// Render CloudWatch dashboards
    Dashboards,
}

impl BuildStep {
    pub const ALL: [BuildStep; 4] = [
        BuildStep::Api,
        BuildStep::Lambda,
        BuildStep::ApiSpec,
        BuildStep::Dashboards,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStep::Api => "api",
            BuildStep::Lambda => "lambda",
            BuildStep::ApiSpec => "api-spec",
            BuildStep::Dashboards => "dashboards",
        };
        f.write_str(name)
    }
}

impl StackId {
    pub const ALL: [StackId; 9] = [
        StackId::Bootstrap,
        StackId::Gateway,
        StackId::Appsync,
        StackId::CloudSecurity,
        StackId::Core,
        StackId::Dashboards,
        StackId::Frontend,
        StackId::LogAnalysis,
        StackId::Onboard,
    ];

    /// Backend stack name
    pub fn stack_name(self) -> &'static str {
        match self {
            StackId::Bootstrap => "panther-bootstrap",
            StackId::Gateway => "panther-bootstrap-gateway",
            StackId::Appsync => "panther-appsync",
            StackId::CloudSecurity => "panther-cloud-security",
            StackId::Core => "panther-core",
            StackId::Dashboards => "panther-cw-dashboards",
            StackId::Frontend => "panther-web",
            StackId::LogAnalysis => "panther-log-analysis",
            StackId::Onboard => "panther-onboard",
        }
    }

    /// Template path relative to the repository root
    pub fn template(self) -> &'static str {
        match self {
            StackId::Bootstrap => "deployments/bootstrap.yml",
            // Written by the api-spec build step
            StackId::Gateway => "out/deployments/embedded.bootstrap_gateway.yml",
            StackId::Appsync => "deployments/appsync.yml",
            StackId::CloudSecurity => "deployments/cloud_security.yml",
            StackId::Core => "deployments/core.yml",
            StackId::Dashboards => "deployments/dashboards.yml",
            StackId::Frontend => "deployments/web_server.yml",
            StackId::LogAnalysis => "deployments/log_analysis.yml",
            StackId::Onboard => "deployments/onboard.yml",
        }
    }

    /// Resolve a user-supplied stack name.
    ///
    /// Matching ignores case and surrounding whitespace, and the `panther-`
    /// prefix is optional: `core`, `Panther-Core` and `panther-core` all match.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        let full = if normalized.starts_with(STACK_PREFIX) {
            normalized
        } else {
            format!("{}{}", STACK_PREFIX, normalized)
        };
        Self::ALL.into_iter().find(|id| id.stack_name() == full)
    }

    /// Like [`StackId::from_name`] but with a descriptive error
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_name(name).ok_or_else(|| DeployError::UnknownStack(name.trim().to_string()))
    }

    /// Build steps that must complete before this stack deploys
    pub fn build_steps(self) -> &'static [BuildStep] {
        match self {
            StackId::Bootstrap | StackId::Appsync | StackId::Frontend | StackId::Onboard => &[],
            StackId::Gateway => &[BuildStep::Lambda, BuildStep::ApiSpec],
            StackId::CloudSecurity | StackId::Core | StackId::LogAnalysis => {
                &[BuildStep::Api, BuildStep::Lambda]
            }
            StackId::Dashboards => &[BuildStep::Dashboards],
        }
    }

    /// Stacks whose outputs this stack reads when redeployed on its own
    pub fn upstream_lookups(self) -> &'static [StackId] {
        match self {
            StackId::Bootstrap => &[],
            StackId::Gateway | StackId::Dashboards | StackId::Onboard => &[StackId::Bootstrap],
            StackId::Appsync
            | StackId::CloudSecurity
            | StackId::Core
            | StackId::Frontend
            | StackId::LogAnalysis => &[StackId::Bootstrap, StackId::Gateway],
        }
    }

    /// Whether deploying this stack needs the first admin user resolved
    pub fn needs_first_user(self) -> bool {
        matches!(self, StackId::Frontend)
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stack_name())
    }
}

/// A stack request: template, artifact location and parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSpec {
    pub id: StackId,
    pub template: String,
    /// Bucket for packaged artifacts; `None` when the template embeds nothing
    pub artifact_bucket: Option<String>,
    pub parameters: Parameters,
}

impl StackSpec {
    pub fn new(id: StackId, parameters: Parameters) -> Self {
        Self {
            id,
            template: id.template().to_string(),
            artifact_bucket: None,
            parameters,
        }
    }

    /// Set the artifact bucket; an empty name means no bucket
    pub fn with_artifact_bucket(mut self, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        self.artifact_bucket = if bucket.is_empty() { None } else { Some(bucket) };
        self
    }

    pub fn stack_name(&self) -> &'static str {
        self.id.stack_name()
    }
}

/// Key/value outputs produced by deployed stacks.
///
/// Outputs accumulate as stacks finish. A key may only be contributed once:
/// [`OutputSet::merge`] refuses to overwrite and leaves the set untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSet {
    values: BTreeMap<String, String>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, or an empty string when absent
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.values.iter()
    }

    /// Merge `other` into this set, failing on the first shared key.
    ///
    /// Collisions are checked before anything is inserted.
    pub fn merge(&mut self, other: OutputSet, source: &str) -> Result<()> {
        if let Some(key) = other.values.keys().find(|k| self.values.contains_key(*k)) {
            return Err(DeployError::OutputCollision {
                key: key.clone(),
                stack: source.to_string(),
            });
        }
        self.values.extend(other.values);
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OutputSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
