use crate::{events::EventEmitter, ComponentError, NodeId, RunId, Value};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Core trait that every component type implements
#[async_trait]
pub trait Component: Send + Sync {
    /// Registered type name (e.g., "text.chunk", "chat.complete")
    fn component_type(&self) -> &str;

    /// Execute the component with its bound inputs and literal config
    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError>;
}

/// Everything a component sees while executing one node
#[derive(Clone)]
pub struct ComponentContext {
    pub run_id: RunId,

    pub node_id: NodeId,

    /// Input values bound from upstream outputs, literals or config
    pub inputs: HashMap<String, Value>,

    /// Static configuration for this node
    pub config: HashMap<String, Value>,

    /// Event emitter for real-time updates
    pub events: EventEmitter,

    /// Set when the run is cancelled or the node times out
    pub cancellation: CancellationToken,
}

impl ComponentContext {
    pub fn new(run_id: RunId, node_id: impl Into<NodeId>, events: EventEmitter) -> Self {
        Self {
            run_id,
            node_id: node_id.into(),
            inputs: HashMap::new(),
            config: HashMap::new(),
            events,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }

    pub fn with_config(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(name.into(), value.into());
        self
    }

    /// Get required input or return error
    pub fn require_input(&self, name: &str) -> Result<&Value, ComponentError> {
        self.inputs
            .get(name)
            .ok_or_else(|| ComponentError::MissingInput(name.to_string()))
    }

    /// Get a required string input
    pub fn require_str(&self, name: &str) -> Result<&str, ComponentError> {
        let value = self.require_input(name)?;
        value.as_str().ok_or_else(|| ComponentError::InvalidInputType {
            field: name.to_string(),
            expected: "string".to_string(),
            actual: value.value_type().to_string(),
        })
    }

    /// Get an optional string input, treating `Null` as absent
    pub fn optional_str(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).and_then(|v| v.as_str())
    }

    /// Get config value or return error
    pub fn require_config(&self, name: &str) -> Result<&Value, ComponentError> {
        self.config
            .get(name)
            .ok_or_else(|| ComponentError::Configuration(format!("Missing config: {}", name)))
    }

    /// Get config with default
    pub fn get_config_or(&self, name: &str, default: Value) -> Value {
        self.config.get(name).cloned().unwrap_or(default)
    }

    /// Numeric config as an unsigned integer, with default
    pub fn config_usize(&self, name: &str, default: usize) -> Result<usize, ComponentError> {
        match self.config.get(name) {
            None => Ok(default),
            Some(Value::Number(n)) if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as usize),
            Some(other) => Err(ComponentError::Configuration(format!(
                "'{}' must be a non-negative integer, got {:?}",
                name, other
            ))),
        }
    }
}

/// Output from component execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentOutput {
    /// Output port values
    pub outputs: HashMap<String, Value>,
}

impl ComponentOutput {
    pub fn new() -> Self {
        Self {
            outputs: HashMap::new(),
        }
    }

    pub fn with_output(mut self, port: impl Into<String>, value: impl Into<Value>) -> Self {
        self.outputs.insert(port.into(), value.into());
        self
    }
}

impl Default for ComponentOutput {
    fn default() -> Self {
        Self::new()
    }
}
