use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

pub type WorkflowId = Uuid;

/// User-authored node identifier, unique within one workflow
pub type NodeId = String;

/// Complete workflow definition
///
/// Edges are not stored; they are derived from each node's input bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: WorkflowId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub settings: WorkflowSettings,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            nodes: Vec::new(),
            settings: WorkflowSettings::default(),
        }
    }

    pub fn add_node(&mut self, node: NodeSpec) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    pub fn with_node(mut self, node: NodeSpec) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Materialize the `(source, target)` dependency pairs implied by edge bindings.
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.nodes
            .iter()
            .flat_map(|node| {
                node.upstream_nodes()
                    .map(move |source| (source.to_string(), node.id.clone()))
            })
            .collect()
    }
}

/// Node specification in a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub component_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: HashMap<String, Value>,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputBinding>,
    #[serde(default)]
    pub position: Option<Position>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            name: None,
            config: HashMap::new(),
            inputs: BTreeMap::new(),
            position: None,
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Bind an input to another node's output.
    pub fn with_input(
        mut self,
        input: impl Into<String>,
        node: impl Into<NodeId>,
        output: impl Into<String>,
    ) -> Self {
        self.inputs.insert(
            input.into(),
            InputBinding::Edge {
                node: node.into(),
                output: output.into(),
            },
        );
        self
    }

    /// Bind an input to a literal value.
    pub fn with_literal(mut self, input: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(
            input.into(),
            InputBinding::Literal {
                value: value.into(),
            },
        );
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position { x, y });
        self
    }

    /// Distinct upstream node ids, in input name order.
    pub fn upstream_nodes(&self) -> impl Iterator<Item = &str> {
        let mut seen: Vec<&str> = Vec::new();
        for binding in self.inputs.values() {
            if let InputBinding::Edge { node, .. } = binding {
                if !seen.contains(&node.as_str()) {
                    seen.push(node);
                }
            }
        }
        seen.into_iter()
    }
}

/// Where an input value comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputBinding {
    /// Output `output` of upstream node `node`
    Edge { node: NodeId, output: String },
    Literal { value: Value },
}

/// Node position in visual editor
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Per-workflow overrides of the runtime defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowSettings {
    #[serde(default)]
    pub max_parallel_nodes: Option<usize>,
    #[serde(default)]
    pub node_timeout_ms: Option<u64>,
}
