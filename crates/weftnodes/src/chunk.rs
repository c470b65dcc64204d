use async_trait::async_trait;
use std::collections::HashMap;
use weftcore::{
    Component, ComponentContext, ComponentDescriptor, ComponentError, ComponentOutput, InputPort,
    OutputPort, Value, ValueType,
};
use weftruntime::ComponentFactory;

const TYPE_NAME: &str = "text.chunk";
const DEFAULT_CHUNK_SIZE: usize = 500;
const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Split `text` into windows of `size` characters, each sharing `overlap`
/// characters with the previous one. Blank windows are dropped.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    if size == 0 || overlap >= size {
        return chunks;
    }

    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        if end == chars.len() {
            break;
        }
        start = end - overlap;
    }
    chunks
}

/// Split text into overlapping chunks
pub struct TextChunkComponent;

#[async_trait]
impl Component for TextChunkComponent {
    fn component_type(&self) -> &str {
        TYPE_NAME
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        let text = ctx.require_str("text")?;
        let size = ctx.config_usize("chunk_size", DEFAULT_CHUNK_SIZE)?;
        let overlap = ctx.config_usize("chunk_overlap", DEFAULT_CHUNK_OVERLAP)?;
        if size == 0 || overlap >= size {
            return Err(ComponentError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than a non-zero chunk_size ({})",
                overlap, size
            )));
        }

        let chunks = chunk_text(text, size, overlap);
        ctx.events.info(format!("Split {} chars into {} chunks", text.len(), chunks.len()));

        Ok(ComponentOutput::new().with_output("chunks", chunks))
    }
}

pub struct TextChunkComponentFactory;

impl ComponentFactory for TextChunkComponentFactory {
    fn create(&self, _config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(TextChunkComponent))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::new(TYPE_NAME)
            .with_description("Split text into overlapping chunks")
            .with_category("document")
            .with_input("text", InputPort::required(ValueType::String))
            .with_output("chunks", OutputPort::new(ValueType::Array))
    }
}
