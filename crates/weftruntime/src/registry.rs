use weftcore::{
    Component, ComponentDescriptor, ComponentError, InputSchema, OutputSchema, RegistryError, Value,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating component instances
pub trait ComponentFactory: Send + Sync {
    /// Create a new instance of the component with the node's literal config
    fn create(&self, config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError>;

    /// Type name and port schemas this factory produces
    fn descriptor(&self) -> ComponentDescriptor;
}

/// A registered component type: its immutable descriptor plus the factory
#[derive(Clone)]
pub struct RegisteredComponent {
    pub descriptor: Arc<ComponentDescriptor>,
    pub factory: Arc<dyn ComponentFactory>,
}

/// Registry of available component types
///
/// Populated once at startup, then shared behind an `Arc` and only read.
pub struct ComponentRegistry {
    components: HashMap<String, RegisteredComponent>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            components: HashMap::new(),
        }
    }

    /// Register a factory under an explicit type name and schema
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        factory: Arc<dyn ComponentFactory>,
        input_schema: InputSchema,
        output_schema: OutputSchema,
    ) -> Result<(), RegistryError> {
        let type_name = type_name.into();
        if self.components.contains_key(&type_name) {
            return Err(RegistryError::DuplicateComponentType(type_name));
        }

        let mut descriptor = factory.descriptor();
        descriptor.type_name = type_name.clone();
        descriptor.inputs = input_schema;
        descriptor.outputs = output_schema;

        tracing::info!("Registering component type: {}", type_name);
        self.components.insert(
            type_name,
            RegisteredComponent {
                descriptor: Arc::new(descriptor),
                factory,
            },
        );
        Ok(())
    }

    /// Register a factory using the descriptor it reports
    pub fn register_factory(&mut self, factory: Arc<dyn ComponentFactory>) -> Result<(), RegistryError> {
        let descriptor = factory.descriptor();
        self.register(descriptor.type_name, factory, descriptor.inputs, descriptor.outputs)
    }

    pub fn resolve(&self, type_name: &str) -> Result<&RegisteredComponent, RegistryError> {
        self.components
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownComponentType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.components.contains_key(type_name)
    }

    /// Registered type names, sorted
    pub fn list_component_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.components.keys().cloned().collect();
        types.sort();
        types
    }

    /// Descriptors of every registered type, sorted by type name
    pub fn descriptors(&self) -> Vec<Arc<ComponentDescriptor>> {
        let mut descriptors: Vec<Arc<ComponentDescriptor>> = self
            .components
            .values()
            .map(|c| c.descriptor.clone())
            .collect();
        descriptors.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
