//! Walks the deployment graph phase by phase

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::{
    artifacts::ArtifactBuilder,
    deployer::StackDeployer,
    error::{DeployError, Result},
    graph::{DeploymentGraph, Phase, PhaseKind, StackNode},
    models::{OutputSet, StackId},
    progress::ProgressReporter,
    task_group::TaskGroup,
};

/// Summary of a successful full deployment
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    /// Outputs of every deployed stack
    pub outputs: OutputSet,
    pub elapsed: Duration,
    /// Number of stacks deployed
    pub stacks: usize,
}

/// Deploys every stack in a [`DeploymentGraph`].
///
/// Serial phases run one stack at a time and stop on the first error. Parallel
/// phases launch every stack, wait for all of them and record failures; a
/// stack whose declared dependency failed is skipped without a backend call.
/// Outputs are merged only by this orchestrator, between phases.
pub struct DeployOrchestrator {
    deployer: StackDeployer,
    graph: DeploymentGraph,
}

impl DeployOrchestrator {
    pub fn new(deployer: StackDeployer, graph: DeploymentGraph) -> Self {
        Self { deployer, graph }
    }

    pub fn graph(&self) -> &DeploymentGraph {
        &self.graph
    }

    #[instrument(skip(self), fields(region = %self.deployer.context().region))]
    pub async fn deploy_all(&self) -> Result<DeploymentReport> {
        let start = Instant::now();
        let total = self.graph.total_stacks();
        let mut reporter = ProgressReporter::new("deploy", total);

        let outputs = self.deploy_with_progress(&mut reporter).await?;
        reporter.into_result()?;

        Ok(DeploymentReport {
            outputs,
            elapsed: start.elapsed(),
            stacks: total,
        })
    }

    /// Runs every phase, recording each stack in `reporter`.
    ///
    /// Returns the merged outputs even when parallel stacks failed; the caller
    /// turns the reporter into the aggregated error.
    pub async fn deploy_with_progress(&self, reporter: &mut ProgressReporter) -> Result<OutputSet> {
        // Nearly every stack, bootstrap-gateway included, needs compiled code
        let builder = self.deployer.builder();
        builder.build_api().await?;
        builder.build_lambda().await?;

        let mut outputs = OutputSet::new();
        let mut failed: HashSet<StackId> = HashSet::new();

        for phase in self.graph.phases() {
            match phase.kind {
                PhaseKind::Serial => {
                    self.run_serial(phase, &mut outputs, &failed, reporter)
                        .await?
                }
                PhaseKind::Parallel => {
                    self.run_parallel(phase, &mut outputs, &mut failed, reporter)
                        .await?
                }
            }
        }

        Ok(outputs)
    }

    async fn run_serial(
        &self,
        phase: &Phase,
        outputs: &mut OutputSet,
        failed: &HashSet<StackId>,
        reporter: &mut ProgressReporter,
    ) -> Result<()> {
        for node in &phase.nodes {
            let name = node.id.stack_name();
            let result = match failed_dependency(node, failed) {
                Some(err) => Err(err),
                None => self.deployer.deploy(node.id, outputs).await,
            };

            // A colliding output fails the stack that produced it
            let result = result.and_then(|stack_outputs| outputs.merge(stack_outputs, name));
            reporter.record(name, &result);
            result?;
        }
        Ok(())
    }

    async fn run_parallel(
        &self,
        phase: &Phase,
        outputs: &mut OutputSet,
        failed: &mut HashSet<StackId>,
        reporter: &mut ProgressReporter,
    ) -> Result<()> {
        info!(stacks = %phase.label(), "starting parallel phase");

        // Tasks read a frozen copy; the shared set is only written after the join
        let snapshot = Arc::new(outputs.clone());
        let mut group = TaskGroup::new();

        for node in &phase.nodes {
            let name = node.id.stack_name();
            if let Some(err) = failed_dependency(node, failed) {
                warn!(stack = %name, "skipping: {}", err);
                group.push(name, async move { Err(err) });
                continue;
            }

            let deployer = self.deployer.clone();
            let snapshot = Arc::clone(&snapshot);
            let id = node.id;
            group.push(name, async move { deployer.deploy(id, &snapshot).await });
        }

        let mut results: BTreeMap<String, Result<OutputSet>> =
            group.join(reporter).await.into_inner();

        for node in &phase.nodes {
            let name = node.id.stack_name();
            match results.remove(name) {
                Some(Ok(stack_outputs)) => outputs.merge(stack_outputs, name)?,
                Some(Err(_)) | None => {
                    failed.insert(node.id);
                }
            }
        }
        Ok(())
    }
}

fn failed_dependency(node: &StackNode, failed: &HashSet<StackId>) -> Option<DeployError> {
    node.depends_on
        .iter()
        .find(|dep| failed.contains(dep))
        .map(|dep| DeployError::DependencyFailed {
            stack: node.id.stack_name().to_string(),
            dependency: dep.stack_name().to_string(),
        })
}
