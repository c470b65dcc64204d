use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use weftcore::{
    Component, ComponentContext, ComponentDescriptor, ComponentError, ComponentOutput,
    EmbeddingService, InputPort, OutputPort, Value, ValueType, VectorStore,
};
use weftruntime::ComponentFactory;

const EMBED_TYPE: &str = "text.embed";
const STORE_TYPE: &str = "vector.store";

fn invalid(field: &str, expected: &str, actual: &Value) -> ComponentError {
    ComponentError::InvalidInputType {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: actual.value_type().to_string(),
    }
}

/// Read an array-of-strings input
pub(crate) fn string_items(ctx: &ComponentContext, name: &str) -> Result<Vec<String>, ComponentError> {
    let value = ctx.require_input(name)?;
    let items = value.as_array().ok_or_else(|| invalid(name, "array", value))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(name, "array of strings", item))
        })
        .collect()
}

/// Read an array-of-vectors input
pub(crate) fn vector_items(ctx: &ComponentContext, name: &str) -> Result<Vec<Vec<f32>>, ComponentError> {
    let value = ctx.require_input(name)?;
    let rows = value.as_array().ok_or_else(|| invalid(name, "array", value))?;
    rows.iter()
        .map(|row| {
            let numbers = row
                .as_array()
                .ok_or_else(|| invalid(name, "array of number arrays", row))?;
            numbers
                .iter()
                .map(|n| {
                    n.as_f64()
                        .map(|f| f as f32)
                        .ok_or_else(|| invalid(name, "number", n))
                })
                .collect()
        })
        .collect()
}

pub(crate) fn vector_value(vector: &[f32]) -> Value {
    Value::Array(vector.iter().map(|x| Value::Number(*x as f64)).collect())
}

/// Embed text chunks
pub struct EmbedComponent {
    embedder: Arc<dyn EmbeddingService>,
}

#[async_trait]
impl Component for EmbedComponent {
    fn component_type(&self) -> &str {
        EMBED_TYPE
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        let chunks = string_items(&ctx, "chunks")?;
        let embeddings = self.embedder.embed(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(ComponentError::ExecutionFailed(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        ctx.events.info(format!("Embedded {} chunks", chunks.len()));
        let embeddings: Vec<Value> = embeddings.iter().map(|v| vector_value(v)).collect();

        Ok(ComponentOutput::new()
            .with_output("chunks", chunks)
            .with_output("embeddings", embeddings))
    }
}

pub struct EmbedComponentFactory {
    embedder: Arc<dyn EmbeddingService>,
}

impl EmbedComponentFactory {
    pub fn new(embedder: Arc<dyn EmbeddingService>) -> Self {
        Self { embedder }
    }
}

impl ComponentFactory for EmbedComponentFactory {
    fn create(&self, _config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(EmbedComponent {
            embedder: self.embedder.clone(),
        }))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::new(EMBED_TYPE)
            .with_description("Compute an embedding for every chunk")
            .with_category("embedding")
            .with_input("chunks", InputPort::required(ValueType::Array))
            .with_output("chunks", OutputPort::new(ValueType::Array))
            .with_output("embeddings", OutputPort::new(ValueType::Array))
    }
}

/// Write chunk embeddings into the vector store
pub struct VectorStoreComponent {
    vectors: Arc<dyn VectorStore>,
}

#[async_trait]
impl Component for VectorStoreComponent {
    fn component_type(&self) -> &str {
        STORE_TYPE
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        let chunks = string_items(&ctx, "chunks")?;
        let embeddings = vector_items(&ctx, "embeddings")?;
        if chunks.len() != embeddings.len() {
            return Err(ComponentError::ExecutionFailed(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let document_id = ctx
            .optional_str("document_id")
            .map(str::to_string)
            .unwrap_or_else(|| format!("doc-{}", uuid::Uuid::new_v4()));

        let mut ids = Vec::with_capacity(chunks.len());
        for (index, (text, embedding)) in chunks.into_iter().zip(embeddings).enumerate() {
            let id = format!("{}:{}", document_id, index);
            let payload = Value::Object(HashMap::from([
                ("document_id".to_string(), Value::String(document_id.clone())),
                ("chunk_index".to_string(), Value::from(index)),
                ("text".to_string(), Value::String(text)),
            ]));
            self.vectors.upsert(&id, embedding, payload).await?;
            ids.push(id);
        }

        ctx.events.info(format!("Stored {} vectors for {}", ids.len(), document_id));
        let stored = ids.len();

        Ok(ComponentOutput::new()
            .with_output("ids", ids)
            .with_output("stored", stored))
    }
}

pub struct VectorStoreComponentFactory {
    vectors: Arc<dyn VectorStore>,
}

impl VectorStoreComponentFactory {
    pub fn new(vectors: Arc<dyn VectorStore>) -> Self {
        Self { vectors }
    }
}

impl ComponentFactory for VectorStoreComponentFactory {
    fn create(&self, _config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(VectorStoreComponent {
            vectors: self.vectors.clone(),
        }))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::new(STORE_TYPE)
            .with_description("Upsert chunk embeddings into the vector store")
            .with_category("vector")
            .with_input("chunks", InputPort::required(ValueType::Array))
            .with_input("embeddings", InputPort::required(ValueType::Array))
            .with_input("document_id", InputPort::optional(ValueType::String))
            .with_output("ids", OutputPort::new(ValueType::Array))
            .with_output("stored", OutputPort::new(ValueType::Number))
    }
}
