//! Stack dependency orchestration for Panther deployments
//!
//! Sequences a fixed graph of infrastructure stacks: bootstrap stacks run one
//! at a time, independent stacks run in parallel groups, and outputs flow
//! from each phase into the parameters of the next.
//!
//! The provisioning backend, artifact builders and operator prompts are
//! reached only through traits ([`ProvisioningClient`], [`ArtifactBuilder`],
//! [`Prompter`], ...), so a whole deployment can run against fakes.

pub mod artifacts;
pub mod context;
pub mod deploy;
pub mod deployer;
pub mod error;
pub mod first_user;
pub mod graph;
pub mod layer_cache;
pub mod models;
pub mod orchestrator;
pub mod params;
pub mod preflight;
pub mod progress;
pub mod provisioning;
pub mod redeploy;
pub mod task_group;

pub use artifacts::{ArtifactBuilder, MemoizedBuilder};
pub use context::{
    custom_resource_override_from_env, custom_resource_version, ArtifactPaths, DeploymentContext,
    GitVersion, CUSTOM_RESOURCE_VERSION_ENV,
};
pub use deploy::{DeployOutcome, DeployRequest, DeployServices, Deployment, APP_URL_OUTPUT};
pub use deployer::StackDeployer;
pub use error::{DeployError, Result};
pub use first_user::{resolve_first_user, FirstUserResolution, Prompter, Validator};
pub use graph::{DeploymentGraph, Phase, PhaseKind, StackNode};
pub use layer_cache::{LayerCache, LayerPackager, LayerStatus};
pub use models::{BuildStep, OutputSet, Parameters, StackId, StackSpec, STACK_PREFIX};
pub use orchestrator::{DeployOrchestrator, DeploymentReport};
pub use params::ParameterAssembler;
pub use preflight::{PreflightChecker, PreflightRequirements, PreflightScope, SUPPORTED_REGIONS};
pub use progress::ProgressReporter;
pub use provisioning::{
    AccountIdentity, ExistingUser, ProvisioningClient, ProvisioningError, TableCatalog,
    UserDirectory,
};
pub use redeploy::SingleStackRedeploy;
pub use task_group::{GroupResults, TaskGroup};
