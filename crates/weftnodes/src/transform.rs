use async_trait::async_trait;
use std::collections::HashMap;
use weftcore::{
    Component, ComponentContext, ComponentDescriptor, ComponentError, ComponentOutput, InputPort,
    OutputPort, Value, ValueType,
};
use weftruntime::ComponentFactory;

const TYPE_NAME: &str = "output.format";
const PLACEHOLDER: &str = "{{value}}";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Text,
    Json,
}

/// Render any value as text, optionally through a template
pub struct FormatComponent {
    format: Format,
    template: Option<String>,
}

impl FormatComponent {
    fn render(&self, value: &Value) -> Result<String, ComponentError> {
        let rendered = match (self.format, value) {
            (Format::Text, Value::String(s)) => s.clone(),
            (Format::Text, other) => other.to_plain_json().to_string(),
            (Format::Json, other) => serde_json::to_string_pretty(&other.to_plain_json())
                .map_err(|e| ComponentError::ExecutionFailed(format!("JSON stringify error: {}", e)))?,
        };

        Ok(match &self.template {
            Some(template) => template.replace(PLACEHOLDER, &rendered),
            None => rendered,
        })
    }
}

#[async_trait]
impl Component for FormatComponent {
    fn component_type(&self) -> &str {
        TYPE_NAME
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        let value = ctx.require_input("value")?;
        let text = self.render(value)?;

        Ok(ComponentOutput::new().with_output("text", text))
    }
}

pub struct FormatComponentFactory;

impl ComponentFactory for FormatComponentFactory {
    fn create(&self, config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        let format = match config.get("format").and_then(Value::as_str) {
            None | Some("text") => Format::Text,
            Some("json") => Format::Json,
            Some(other) => {
                return Err(ComponentError::Configuration(format!("Unsupported format: {}", other)))
            }
        };
        let template = config.get("template").and_then(Value::as_str).map(str::to_string);

        Ok(Box::new(FormatComponent { format, template }))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::new(TYPE_NAME)
            .with_description("Format a value as text or JSON")
            .with_category("output")
            .with_input("value", InputPort::required(ValueType::Any))
            .with_output("text", OutputPort::new(ValueType::String))
    }
}
