use crate::plan::{ExecutionPlan, PlannedNode};
use crate::registry::{ComponentRegistry, RegisteredComponent};
use std::collections::{HashMap, HashSet};
use weftcore::{InputBinding, ValidationError, Violation, WorkflowDefinition};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

/// Checks workflow definitions against a component registry.
///
/// Validation is exhaustive: every violation is collected before returning,
/// and the report is a pure function of the definition and registry.
pub struct Validator<'a> {
    registry: &'a ComponentRegistry,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(&self, workflow: &WorkflowDefinition) -> Result<ExecutionPlan, ValidationError> {
        let mut violations = Vec::new();

        let positions = self.check_unique_ids(workflow, &mut violations);
        let resolved = self.check_component_types(workflow, &mut violations);
        self.check_bindings(workflow, &positions, &resolved, &mut violations);
        self.check_required_inputs(workflow, &resolved, &mut violations);

        let edges = Self::dependency_edges(workflow, &positions);
        Self::check_acyclic(workflow, &positions, &edges, &mut violations);

        if !violations.is_empty() {
            tracing::debug!(
                workflow_id = %workflow.id,
                violations = violations.len(),
                "workflow rejected"
            );
            return Err(ValidationError { violations });
        }

        let nodes = workflow
            .nodes
            .iter()
            .zip(resolved)
            .filter_map(|(spec, component)| {
                component.map(|component| PlannedNode {
                    spec: spec.clone(),
                    component,
                })
            })
            .collect();

        Ok(ExecutionPlan::new(
            workflow.id,
            workflow.name.clone(),
            workflow.settings.clone(),
            nodes,
            &edges,
        ))
    }

    /// First occurrence of every id; later duplicates are reported.
    fn check_unique_ids<'w>(
        &self,
        workflow: &'w WorkflowDefinition,
        violations: &mut Vec<Violation>,
    ) -> HashMap<&'w str, usize> {
        let mut positions = HashMap::new();
        let mut reported = HashSet::new();
        for (position, node) in workflow.nodes.iter().enumerate() {
            if positions.contains_key(node.id.as_str()) {
                if reported.insert(node.id.as_str()) {
                    violations.push(Violation::DuplicateNodeId {
                        node_id: node.id.clone(),
                    });
                }
            } else {
                positions.insert(node.id.as_str(), position);
            }
        }
        positions
    }

    fn check_component_types(
        &self,
        workflow: &WorkflowDefinition,
        violations: &mut Vec<Violation>,
    ) -> Vec<Option<RegisteredComponent>> {
        workflow
            .nodes
            .iter()
            .map(|node| match self.registry.resolve(&node.component_type) {
                Ok(component) => Some(component.clone()),
                Err(_) => {
                    violations.push(Violation::UnknownComponentType {
                        node_id: node.id.clone(),
                        component_type: node.component_type.clone(),
                    });
                    None
                }
            })
            .collect()
    }

    fn check_bindings(
        &self,
        workflow: &WorkflowDefinition,
        positions: &HashMap<&str, usize>,
        resolved: &[Option<RegisteredComponent>],
        violations: &mut Vec<Violation>,
    ) {
        for (position, node) in workflow.nodes.iter().enumerate() {
            let target = resolved[position].as_ref().map(|c| &c.descriptor);

            for (input, binding) in &node.inputs {
                let port = target.and_then(|d| d.inputs.get(input));
                if target.is_some() && port.is_none() {
                    violations.push(Violation::UnknownInput {
                        node_id: node.id.clone(),
                        input: input.clone(),
                    });
                }

                match binding {
                    InputBinding::Edge {
                        node: source,
                        output,
                    } => {
                        let Some(&source_position) = positions.get(source.as_str()) else {
                            violations.push(Violation::DanglingEdge {
                                node_id: node.id.clone(),
                                input: input.clone(),
                            });
                            continue;
                        };
                        // Unknown source types were already reported.
                        let Some(source_component) = &resolved[source_position] else {
                            continue;
                        };
                        match source_component.descriptor.outputs.get(output) {
                            None => violations.push(Violation::DanglingEdge {
                                node_id: node.id.clone(),
                                input: input.clone(),
                            }),
                            Some(produced) => {
                                if let Some(port) = port {
                                    if !port.value_type.is_compatible_with(produced.value_type) {
                                        violations.push(Violation::IncompatibleEdge {
                                            node_id: node.id.clone(),
                                            input: input.clone(),
                                            expected: port.value_type,
                                            actual: produced.value_type,
                                        });
                                    }
                                }
                            }
                        }
                    }
                    InputBinding::Literal { value } => {
                        if let Some(port) = port {
                            if !port.value_type.accepts(value) {
                                violations.push(Violation::LiteralTypeMismatch {
                                    node_id: node.id.clone(),
                                    input: input.clone(),
                                    expected: port.value_type,
                                    actual: value.value_type(),
                                });
                            }
                        }
                    }
                }
            }

            // Unbound inputs are fed from a config entry of the same name.
            let Some(descriptor) = target else {
                continue;
            };
            for (input, port) in &descriptor.inputs {
                if node.inputs.contains_key(input) {
                    continue;
                }
                if let Some(value) = node.config.get(input) {
                    if !port.value_type.accepts(value) {
                        violations.push(Violation::LiteralTypeMismatch {
                            node_id: node.id.clone(),
                            input: input.clone(),
                            expected: port.value_type,
                            actual: value.value_type(),
                        });
                    }
                }
            }
        }
    }

    fn check_required_inputs(
        &self,
        workflow: &WorkflowDefinition,
        resolved: &[Option<RegisteredComponent>],
        violations: &mut Vec<Violation>,
    ) {
        for (node, component) in workflow.nodes.iter().zip(resolved) {
            let Some(component) = component else {
                continue;
            };
            for input in component.descriptor.required_inputs() {
                if !node.inputs.contains_key(input) && !node.config.contains_key(input) {
                    violations.push(Violation::MissingRequiredInput {
                        node_id: node.id.clone(),
                        input: input.to_string(),
                    });
                }
            }
        }
    }

    /// `(dependency, dependent)` position pairs over first occurrences only
    fn dependency_edges(
        workflow: &WorkflowDefinition,
        positions: &HashMap<&str, usize>,
    ) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for (position, node) in workflow.nodes.iter().enumerate() {
            if positions.get(node.id.as_str()) != Some(&position) {
                continue;
            }
            for source in node.upstream_nodes() {
                if let Some(&from) = positions.get(source) {
                    edges.push((from, position));
                }
            }
        }
        edges
    }

    fn check_acyclic(
        workflow: &WorkflowDefinition,
        positions: &HashMap<&str, usize>,
        edges: &[(usize, usize)],
        violations: &mut Vec<Violation>,
    ) {
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); workflow.nodes.len()];
        for (from, to) in edges {
            adjacency[*from].push(*to);
        }
        for targets in &mut adjacency {
            targets.sort_unstable();
            targets.dedup();
        }

        let mut marks = vec![Mark::Unvisited; workflow.nodes.len()];
        let mut cycles = Vec::new();
        for position in 0..workflow.nodes.len() {
            let is_first = positions.get(workflow.nodes[position].id.as_str()) == Some(&position);
            if is_first && marks[position] == Mark::Unvisited {
                visit(position, &adjacency, &mut marks, &mut cycles);
            }
        }

        for cycle in cycles {
            violations.push(Violation::CyclicDependency {
                cycle: cycle
                    .into_iter()
                    .map(|position| workflow.nodes[position].id.clone())
                    .collect(),
            });
        }
    }
}

/// Iterative depth-first walk from `root`. Each frame is
/// `(position, index of the next neighbour to try)`.
fn visit(root: usize, adjacency: &[Vec<usize>], marks: &mut [Mark], cycles: &mut Vec<Vec<usize>>) {
    let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
    marks[root] = Mark::Visiting;

    while let Some(frame) = frames.last_mut() {
        let (position, cursor) = *frame;
        let Some(&next) = adjacency[position].get(cursor) else {
            marks[position] = Mark::Visited;
            frames.pop();
            continue;
        };
        frame.1 += 1;

        match marks[next] {
            Mark::Unvisited => {
                marks[next] = Mark::Visiting;
                frames.push((next, 0));
            }
            Mark::Visiting => {
                // `next` is on the path: the back edge closes a cycle.
                let start = frames.iter().position(|(p, _)| *p == next).unwrap_or(0);
                let mut cycle: Vec<usize> = frames[start..].iter().map(|(p, _)| *p).collect();
                cycle.push(next);
                cycles.push(cycle);
            }
            Mark::Visited => {}
        }
    }
}

/// Validate `workflow` against `registry`.
pub fn validate(
    registry: &ComponentRegistry,
    workflow: &WorkflowDefinition,
) -> Result<ExecutionPlan, ValidationError> {
    Validator::new(registry).validate(workflow)
}
