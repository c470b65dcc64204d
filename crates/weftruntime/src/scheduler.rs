use crate::plan::ExecutionPlan;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use weftcore::{NodeId, NodeStatus};

/// Computes execution order over a validated plan.
///
/// The scheduler never runs anything itself; the executor re-queries
/// [`Scheduler::ready`] after every completion.
pub struct Scheduler<'a> {
    plan: &'a ExecutionPlan,
}

impl<'a> Scheduler<'a> {
    pub fn new(plan: &'a ExecutionPlan) -> Self {
        Self { plan }
    }

    /// Kahn's algorithm; ties among ready nodes go to the earliest declared.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut in_degree = self.in_degrees();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(position, _)| Reverse(position))
            .collect();

        let mut order = Vec::with_capacity(self.plan.len());
        while let Some(Reverse(position)) = ready.pop() {
            order.push(self.plan.node_id(position).to_string());
            for dependent in self.plan.dependents(position) {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }
        order
    }

    /// Kahn waves: each batch only depends on earlier batches.
    pub fn batches(&self) -> Vec<Vec<NodeId>> {
        self.position_batches()
            .into_iter()
            .map(|batch| {
                batch
                    .into_iter()
                    .map(|position| self.plan.node_id(position).to_string())
                    .collect()
            })
            .collect()
    }

    /// Nodes that share a batch with `node_id` and may run alongside it
    pub fn concurrent_with(&self, node_id: &str) -> Vec<NodeId> {
        let Some(target) = self.plan.position(node_id) else {
            return Vec::new();
        };
        self.position_batches()
            .into_iter()
            .find(|batch| batch.contains(&target))
            .map(|batch| {
                batch
                    .into_iter()
                    .filter(|position| *position != target)
                    .map(|position| self.plan.node_id(position).to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// PENDING nodes whose dependencies have all SUCCEEDED, in declaration order.
    ///
    /// `states` is indexed by plan position.
    pub fn ready(&self, states: &[NodeStatus]) -> Vec<usize> {
        (0..self.plan.len())
            .filter(|position| states[*position] == NodeStatus::Pending)
            .filter(|position| {
                self.plan
                    .dependencies(*position)
                    .iter()
                    .all(|dep| states[*dep] == NodeStatus::Succeeded)
            })
            .collect()
    }

    fn position_batches(&self) -> Vec<Vec<usize>> {
        let mut in_degree = self.in_degrees();
        let mut current: Vec<usize> = (0..self.plan.len())
            .filter(|position| in_degree[*position] == 0)
            .collect();

        let mut batches = Vec::new();
        while !current.is_empty() {
            let mut next = Vec::new();
            for &position in &current {
                for dependent in self.plan.dependents(position) {
                    in_degree[dependent] -= 1;
                    if in_degree[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }
            next.sort_unstable();
            batches.push(std::mem::replace(&mut current, next));
        }
        batches
    }

    fn in_degrees(&self) -> Vec<usize> {
        (0..self.plan.len())
            .map(|position| self.plan.dependencies(position).len())
            .collect()
    }
}
