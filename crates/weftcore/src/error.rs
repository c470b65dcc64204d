use crate::{NodeId, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Execution context error: {0}")]
    Context(#[from] ContextError),

    #[error("Scheduling deadlock: no runnable node among {pending:?}")]
    SchedulingDeadlock { pending: Vec<NodeId> },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Component type already registered: {0}")]
    DuplicateComponentType(String),

    #[error("Unknown component type: {0}")]
    UnknownComponentType(String),
}

/// Error raised by a component implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Missing required input: {0}")]
    MissingInput(String),

    #[error("Invalid input type for '{field}': expected {expected}, got {actual}")]
    InvalidInputType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

/// Failure reported by an external capability (vector store, chat, embeddings)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("{service} unavailable: {message}")]
    Unavailable { service: String, message: String },

    #[error("Invalid request to {service}: {message}")]
    InvalidRequest { service: String, message: String },

    #[error("Unexpected response from {service}: {message}")]
    InvalidResponse { service: String, message: String },
}

impl ServiceError {
    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn invalid_request(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service: service.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Why a single node did not produce an output
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeFailure {
    #[error("{0}")]
    Component(#[from] ComponentError),

    #[error("Failed to instantiate component: {0}")]
    Instantiation(String),

    #[error("Output does not match schema: {0}")]
    SchemaMismatch(String),

    #[error("Component panicked: {0}")]
    Panicked(String),

    #[error("Node timed out after {millis}ms")]
    NodeTimeout { millis: u64 },

    #[error("Unresolved input: {0}")]
    UnresolvedInput(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl NodeFailure {
    /// Stable short name for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            NodeFailure::Component(_) => "component",
            NodeFailure::Instantiation(_) => "instantiation",
            NodeFailure::SchemaMismatch(_) => "schema_mismatch",
            NodeFailure::Panicked(_) => "panicked",
            NodeFailure::NodeTimeout { .. } => "timeout",
            NodeFailure::UnresolvedInput(_) => "unresolved_input",
            NodeFailure::Cancelled => "cancelled",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Node '{node_id}' failed: {cause}")]
pub struct NodeExecutionError {
    pub node_id: NodeId,
    pub cause: NodeFailure,
}

impl NodeExecutionError {
    pub fn new(node_id: impl Into<NodeId>, cause: impl Into<NodeFailure>) -> Self {
        Self {
            node_id: node_id.into(),
            cause: cause.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("Output for node '{0}' was already recorded")]
    DuplicateWrite(NodeId),

    #[error("Input '{input}' of node '{node_id}' is unresolved: no output '{output}' from '{source_node}'")]
    UnresolvedInput {
        node_id: NodeId,
        input: String,
        source_node: NodeId,
        output: String,
    },

    #[error("Node '{0}' is not part of this run")]
    UnknownNode(NodeId),

    #[error("Node '{node_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        node_id: NodeId,
        from: crate::NodeStatus,
        to: crate::NodeStatus,
    },
}

/// One problem found while validating a workflow definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    DuplicateNodeId {
        node_id: NodeId,
    },
    UnknownComponentType {
        node_id: NodeId,
        component_type: String,
    },
    DanglingEdge {
        node_id: NodeId,
        input: String,
    },
    UnknownInput {
        node_id: NodeId,
        input: String,
    },
    LiteralTypeMismatch {
        node_id: NodeId,
        input: String,
        expected: ValueType,
        actual: ValueType,
    },
    IncompatibleEdge {
        node_id: NodeId,
        input: String,
        expected: ValueType,
        actual: ValueType,
    },
    MissingRequiredInput {
        node_id: NodeId,
        input: String,
    },
    CyclicDependency {
        cycle: Vec<NodeId>,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::DuplicateNodeId { node_id } => {
                write!(f, "duplicate node id '{}'", node_id)
            }
            Violation::UnknownComponentType {
                node_id,
                component_type,
            } => write!(
                f,
                "node '{}' uses unknown component type '{}'",
                node_id, component_type
            ),
            Violation::DanglingEdge { node_id, input } => write!(
                f,
                "input '{}' of node '{}' references a missing node or output",
                input, node_id
            ),
            Violation::UnknownInput { node_id, input } => write!(
                f,
                "node '{}' declares input '{}' which its component does not accept",
                node_id, input
            ),
            Violation::LiteralTypeMismatch {
                node_id,
                input,
                expected,
                actual,
            } => write!(
                f,
                "literal for input '{}' of node '{}' is {}, expected {}",
                input, node_id, actual, expected
            ),
            Violation::IncompatibleEdge {
                node_id,
                input,
                expected,
                actual,
            } => write!(
                f,
                "input '{}' of node '{}' expects {} but is wired to a {} output",
                input, node_id, expected, actual
            ),
            Violation::MissingRequiredInput { node_id, input } => write!(
                f,
                "required input '{}' of node '{}' is not bound",
                input, node_id
            ),
            Violation::CyclicDependency { cycle } => {
                write!(f, "cyclic dependency: {}", cycle.join(" -> "))
            }
        }
    }
}

/// Exhaustive validation report; never empty
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn has_cycle(&self) -> bool {
        self.violations
            .iter()
            .any(|v| matches!(v, Violation::CyclicDependency { .. }))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "; {}", violation)?;
        }
        Ok(())
    }
}
