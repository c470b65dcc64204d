use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use weftcore::{
    Component, ComponentContext, ComponentDescriptor, ComponentError, ComponentOutput, InputPort,
    OutputPort, RecordStore, Value, ValueType,
};
use weftruntime::ComponentFactory;

const TYPE_NAME: &str = "document.load";

/// Loads document text, either inline or from the record store
pub struct DocumentLoaderComponent {
    records: Arc<dyn RecordStore>,
}

#[async_trait]
impl Component for DocumentLoaderComponent {
    fn component_type(&self) -> &str {
        TYPE_NAME
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        let document_id = ctx.optional_str("document_id").map(str::to_string);

        let (document_id, text) = match (ctx.optional_str("text"), document_id) {
            (Some(text), id) => {
                let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                (id, text.to_string())
            }
            (None, Some(id)) => {
                let record = self
                    .records
                    .load_document_metadata(&id)
                    .await
                    .map_err(|e| ComponentError::ExecutionFailed(e.to_string()))?;
                ctx.events.info(format!("Loaded '{}' ({} bytes)", record.title, record.content.len()));
                (record.id, record.content)
            }
            (None, None) => {
                return Err(ComponentError::Configuration(
                    "either 'text' or 'document_id' must be provided".to_string(),
                ))
            }
        };

        Ok(ComponentOutput::new()
            .with_output("document_id", document_id)
            .with_output("text", text))
    }
}

pub struct DocumentLoaderComponentFactory {
    records: Arc<dyn RecordStore>,
}

impl DocumentLoaderComponentFactory {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }
}

impl ComponentFactory for DocumentLoaderComponentFactory {
    fn create(&self, _config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(DocumentLoaderComponent {
            records: self.records.clone(),
        }))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::new(TYPE_NAME)
            .with_description("Load a document's text inline or from the record store")
            .with_category("document")
            .with_input("document_id", InputPort::optional(ValueType::String))
            .with_input("text", InputPort::optional(ValueType::String))
            .with_output("document_id", OutputPort::new(ValueType::String))
            .with_output("text", OutputPort::new(ValueType::String))
    }
}
