use crate::registry::RegisteredComponent;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};
use weftcore::{NodeId, NodeSpec, WorkflowId, WorkflowSettings};

/// A node whose component type has been resolved against the registry
#[derive(Clone)]
pub struct PlannedNode {
    pub spec: NodeSpec,
    pub component: RegisteredComponent,
}

/// Validated, immutable graph ready for scheduling.
///
/// Node positions follow declaration order and double as `NodeIndex` values
/// in the dependency graph, whose edges point from a dependency to its
/// dependent.
pub struct ExecutionPlan {
    workflow_id: WorkflowId,
    name: String,
    settings: WorkflowSettings,
    nodes: Vec<PlannedNode>,
    graph: DiGraph<usize, ()>,
    positions: HashMap<NodeId, usize>,
}

impl ExecutionPlan {
    pub(crate) fn new(
        workflow_id: WorkflowId,
        name: String,
        settings: WorkflowSettings,
        nodes: Vec<PlannedNode>,
        edges: &[(usize, usize)],
    ) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        for position in 0..nodes.len() {
            graph.add_node(position);
        }
        for (from, to) in edges {
            graph.update_edge(NodeIndex::new(*from), NodeIndex::new(*to), ());
        }

        let positions = nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (node.spec.id.clone(), position))
            .collect();

        Self {
            workflow_id,
            name,
            settings,
            nodes,
            graph,
            positions,
        }
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.workflow_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[PlannedNode] {
        &self.nodes
    }

    pub fn node(&self, position: usize) -> &PlannedNode {
        &self.nodes[position]
    }

    pub fn node_id(&self, position: usize) -> &str {
        &self.nodes[position].spec.id
    }

    pub fn position(&self, node_id: &str) -> Option<usize> {
        self.positions.get(node_id).copied()
    }

    pub fn graph(&self) -> &DiGraph<usize, ()> {
        &self.graph
    }

    /// Direct dependencies of a node, in declaration order
    pub fn dependencies(&self, position: usize) -> Vec<usize> {
        self.neighbors(position, Direction::Incoming)
    }

    /// Direct dependents of a node, in declaration order
    pub fn dependents(&self, position: usize) -> Vec<usize> {
        self.neighbors(position, Direction::Outgoing)
    }

    /// Every node reachable downstream of `position`, breadth-first
    pub fn transitive_dependents(&self, position: usize) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue: VecDeque<usize> = self.dependents(position).into();
        while let Some(next) = queue.pop_front() {
            if seen.insert(next) {
                order.push(next);
                queue.extend(self.dependents(next));
            }
        }
        order
    }

    /// Nodes nothing depends on
    pub fn sinks(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|position| self.dependents(*position).is_empty())
            .collect()
    }

    fn neighbors(&self, position: usize, direction: Direction) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(position), direction)
            .map(|idx| idx.index())
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}
