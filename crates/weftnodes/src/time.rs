use async_trait::async_trait;
use std::collections::HashMap;
use tokio::time::{sleep, Duration};
use weftcore::{
    Component, ComponentContext, ComponentDescriptor, ComponentError, ComponentOutput, InputPort,
    OutputPort, Value, ValueType,
};
use weftruntime::ComponentFactory;

/// Delay execution for a specified duration
pub struct DelayComponent;

#[async_trait]
impl Component for DelayComponent {
    fn component_type(&self) -> &str {
        "time.delay"
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        let delay_ms = ctx.config_usize("delay_ms", 1000)? as u64;

        ctx.events.info(format!("Delaying for {}ms", delay_ms));

        tokio::select! {
            _ = sleep(Duration::from_millis(delay_ms)) => {}
            _ = ctx.cancellation.cancelled() => {
                return Err(ComponentError::ExecutionFailed("delay interrupted".to_string()));
            }
        }

        // Pass the input through
        let value = ctx.inputs.get("value").cloned().unwrap_or(Value::Null);
        Ok(ComponentOutput::new().with_output("value", value))
    }
}

pub struct DelayComponentFactory;

impl ComponentFactory for DelayComponentFactory {
    fn create(&self, _config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(DelayComponent))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::new("time.delay")
            .with_description("Delay execution for specified milliseconds")
            .with_category("time")
            .with_input("value", InputPort::optional(ValueType::Any))
            .with_output("value", OutputPort::new(ValueType::Any))
    }
}
