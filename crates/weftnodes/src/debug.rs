use async_trait::async_trait;
use std::collections::HashMap;
use weftcore::{
    Component, ComponentContext, ComponentDescriptor, ComponentError, ComponentOutput, InputPort,
    OutputPort, Value, ValueType,
};
use weftruntime::ComponentFactory;

/// Simple debug component that logs its inputs
pub struct DebugComponent;

#[async_trait]
impl Component for DebugComponent {
    fn component_type(&self) -> &str {
        "debug.log"
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        let message = match ctx.inputs.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_plain_json().to_string(),
            None => "(no message)".to_string(),
        };

        tracing::debug!(node_id = %ctx.node_id, "DEBUG: {}", message);
        ctx.events.info(format!("DEBUG: {}", message));

        Ok(ComponentOutput::new().with_output("message", message))
    }
}

pub struct DebugComponentFactory;

impl ComponentFactory for DebugComponentFactory {
    fn create(&self, _config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(DebugComponent))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::new("debug.log")
            .with_description("Logs input values for debugging")
            .with_category("debug")
            .with_input("message", InputPort::optional(ValueType::Any))
            .with_output("message", OutputPort::new(ValueType::String))
    }
}
