use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use weftcore::{
    Component, ComponentContext, ComponentDescriptor, ComponentError, ComponentOutput,
    EmbeddingService, InputPort, OutputPort, Value, ValueType, VectorStore,
};
use weftruntime::ComponentFactory;

const TYPE_NAME: &str = "vector.retrieve";
const DEFAULT_TOP_K: usize = 4;

/// Nearest-neighbour lookup for a text query
pub struct RetrieveComponent {
    embedder: Arc<dyn EmbeddingService>,
    vectors: Arc<dyn VectorStore>,
}

#[async_trait]
impl Component for RetrieveComponent {
    fn component_type(&self) -> &str {
        TYPE_NAME
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        let query = ctx.require_str("query")?;
        let top_k = ctx.config_usize("top_k", DEFAULT_TOP_K)?;

        let mut embedded = self.embedder.embed(&[query.to_string()]).await?;
        let embedding = embedded
            .pop()
            .ok_or_else(|| ComponentError::ExecutionFailed("embedder returned no vector".to_string()))?;

        let hits = self.vectors.query(&embedding, top_k).await?;
        ctx.events.info(format!("Retrieved {} matches", hits.len()));

        let mut texts = Vec::with_capacity(hits.len());
        let matches: Vec<Value> = hits
            .into_iter()
            .map(|hit| {
                let text = hit
                    .payload
                    .as_ref()
                    .and_then(Value::as_object)
                    .and_then(|payload| payload.get("text"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                texts.push(text.clone());
                Value::Object(HashMap::from([
                    ("document_id".to_string(), Value::String(hit.document_id)),
                    ("score".to_string(), Value::Number(hit.score as f64)),
                    ("text".to_string(), Value::String(text)),
                ]))
            })
            .collect();

        Ok(ComponentOutput::new()
            .with_output("matches", matches)
            .with_output("context", texts.join("\n\n")))
    }
}

pub struct RetrieveComponentFactory {
    embedder: Arc<dyn EmbeddingService>,
    vectors: Arc<dyn VectorStore>,
}

impl RetrieveComponentFactory {
    pub fn new(embedder: Arc<dyn EmbeddingService>, vectors: Arc<dyn VectorStore>) -> Self {
        Self { embedder, vectors }
    }
}

impl ComponentFactory for RetrieveComponentFactory {
    fn create(&self, _config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(RetrieveComponent {
            embedder: self.embedder.clone(),
            vectors: self.vectors.clone(),
        }))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::new(TYPE_NAME)
            .with_description("Find the chunks most similar to a query")
            .with_category("vector")
            .with_input("query", InputPort::required(ValueType::String))
            .with_output("matches", OutputPort::new(ValueType::Array))
            .with_output("context", OutputPort::new(ValueType::String))
    }
}
