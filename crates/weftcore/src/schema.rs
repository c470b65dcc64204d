use crate::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared input port of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPort {
    pub value_type: ValueType,
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl InputPort {
    pub fn required(value_type: ValueType) -> Self {
        Self {
            value_type,
            required: true,
            description: String::new(),
        }
    }

    pub fn optional(value_type: ValueType) -> Self {
        Self {
            value_type,
            required: false,
            description: String::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Declared output port of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPort {
    pub value_type: ValueType,
    #[serde(default)]
    pub description: String,
}

impl OutputPort {
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            description: String::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

pub type InputSchema = BTreeMap<String, InputPort>;
pub type OutputSchema = BTreeMap<String, OutputPort>;

/// Catalog entry for a component type.
///
/// Immutable once registered; the registry hands out shared references only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    pub type_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub inputs: InputSchema,
    pub outputs: OutputSchema,
}

fn default_category() -> String {
    "general".to_string()
}

impl ComponentDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            description: String::new(),
            category: default_category(),
            inputs: InputSchema::new(),
            outputs: OutputSchema::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_input(mut self, name: impl Into<String>, port: InputPort) -> Self {
        self.inputs.insert(name.into(), port);
        self
    }

    pub fn with_output(mut self, name: impl Into<String>, port: OutputPort) -> Self {
        self.outputs.insert(name.into(), port);
        self
    }

    pub fn required_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .filter(|(_, port)| port.required)
            .map(|(name, _)| name.as_str())
    }
}
