//! Declarative deployment graph

use std::collections::HashSet;

use crate::{
    error::{DeployError, Result},
    models::StackId,
};

/// How the stacks of a phase are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    /// One stack at a time; any failure aborts the deployment
    Serial,

    /// Every stack at once; the phase joins before the next one starts
    Parallel,
}

/// A stack and the stacks it must wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackNode {
    /// Stack to deploy
    pub id: StackId,

    /// Stacks that must have deployed successfully first
    pub depends_on: Vec<StackId>,
}

impl StackNode {
    /// Creates a new node
    pub fn new(id: StackId, depends_on: &[StackId]) -> Self {
        Self {
            id,
            depends_on: depends_on.to_vec(),
        }
    }
}

/// A group of stacks scheduled together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    /// Scheduling mode
    pub kind: PhaseKind,

    /// Stacks in this phase
    pub nodes: Vec<StackNode>,
}

impl Phase {
    /// Creates a serial phase
    pub fn serial(nodes: Vec<StackNode>) -> Self {
        Self {
            kind: PhaseKind::Serial,
            nodes,
        }
    }

    /// Creates a parallel phase
    pub fn parallel(nodes: Vec<StackNode>) -> Self {
        Self {
            kind: PhaseKind::Parallel,
            nodes,
        }
    }

    /// Short label used in progress and error messages
    pub fn label(&self) -> String {
        let names: Vec<_> = self.nodes.iter().map(|n| n.id.stack_name()).collect();
        names.join(", ")
    }
}

/// Ordered phases of stacks
///
/// Ordering and parallelism are data: the orchestrator walks the phases in
/// order and never special-cases a stack.
#[derive(Debug, Clone)]
pub struct DeploymentGraph {
    phases: Vec<Phase>,
}

impl DeploymentGraph {
    /// Creates a graph, rejecting duplicate stacks and forward or
    /// same-phase dependencies
    pub fn new(phases: Vec<Phase>) -> Result<Self> {
        let mut earlier: HashSet<StackId> = HashSet::new();

        for (index, phase) in phases.iter().enumerate() {
            if phase.nodes.is_empty() {
                return Err(DeployError::InvalidGraph(format!("phase {} is empty", index)));
            }

            for node in &phase.nodes {
                for dep in &node.depends_on {
                    if !earlier.contains(dep) {
                        return Err(DeployError::InvalidGraph(format!(
                            "{} depends on {} which is not deployed in an earlier phase",
                            node.id, dep
                        )));
                    }
                }
            }

            for node in &phase.nodes {
                if !earlier.insert(node.id) {
                    return Err(DeployError::InvalidGraph(format!(
                        "{} appears more than once",
                        node.id
                    )));
                }
            }
        }

        Ok(Self { phases })
    }

    /// The full deployment
    ///
    /// Frontend waits on Core because it serves the URL Core configures.
    pub fn standard() -> Self {
        use StackId::*;

        let bootstrap = &[Bootstrap, Gateway][..];
        let phases = vec![
            Phase::serial(vec![StackNode::new(Bootstrap, &[])]),
            Phase::serial(vec![StackNode::new(Gateway, &[Bootstrap])]),
            Phase::parallel(vec![
                StackNode::new(Appsync, bootstrap),
                StackNode::new(CloudSecurity, bootstrap),
                StackNode::new(Core, bootstrap),
                StackNode::new(Dashboards, bootstrap),
                StackNode::new(LogAnalysis, bootstrap),
            ]),
            Phase::parallel(vec![
                StackNode::new(Frontend, &[Bootstrap, Gateway, Core]),
                StackNode::new(Onboard, bootstrap),
            ]),
        ];

        Self { phases }
    }

    /// Phases in execution order
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Number of stacks across every phase
    pub fn total_stacks(&self) -> usize {
        self.phases.iter().map(|p| p.nodes.len()).sum()
    }

    /// Looks up the node for `id`
    pub fn node(&self, id: StackId) -> Option<&StackNode> {
        self.phases
            .iter()
            .flat_map(|p| p.nodes.iter())
            .find(|n| n.id == id)
    }
}

impl Default for DeploymentGraph {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_graph_is_valid() {
        let standard = DeploymentGraph::standard();
        let validated = DeploymentGraph::new(standard.phases().to_vec()).unwrap();
        assert_eq!(validated.total_stacks(), StackId::ALL.len());
    }

    #[test]
    fn test_standard_graph_shape() {
        let graph = DeploymentGraph::standard();
        let kinds: Vec<_> = graph.phases().iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PhaseKind::Serial,
                PhaseKind::Serial,
                PhaseKind::Parallel,
                PhaseKind::Parallel
            ]
        );
        assert_eq!(graph.phases()[2].nodes.len(), 5);
        assert!(graph
            .node(StackId::Frontend)
            .unwrap()
            .depends_on
            .contains(&StackId::Core));
        assert!(!graph
            .node(StackId::Onboard)
            .unwrap()
            .depends_on
            .contains(&StackId::Core));
    }

    #[test]
    fn test_same_phase_dependency_rejected() {
        let err = DeploymentGraph::new(vec![
            Phase::serial(vec![StackNode::new(StackId::Bootstrap, &[])]),
            Phase::parallel(vec![
                StackNode::new(StackId::Core, &[StackId::Bootstrap]),
                StackNode::new(StackId::Frontend, &[StackId::Core]),
            ]),
        ])
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidGraph(_)));
    }

    #[test]
    fn test_duplicate_stack_rejected() {
        let err = DeploymentGraph::new(vec![
            Phase::serial(vec![StackNode::new(StackId::Bootstrap, &[])]),
            Phase::serial(vec![StackNode::new(StackId::Bootstrap, &[])]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_empty_phase_rejected() {
        assert!(DeploymentGraph::new(vec![Phase::parallel(vec![])]).is_err());
    }
}
