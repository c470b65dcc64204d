//! Standard component library
//!
//! Built-in intelligent components for document ingestion, retrieval and
//! chat, plus the collaborator backends they run against.

mod backends;
mod chat;
mod chunk;
mod debug;
mod document;
mod embed;
mod http;
mod retrieve;
mod time;
mod transform;

pub use backends::{EchoChatService, HashingEmbedder, InMemoryVectorStore};
pub use chat::{ChatComponent, ChatComponentFactory};
pub use chunk::{chunk_text, TextChunkComponent, TextChunkComponentFactory};
pub use debug::{DebugComponent, DebugComponentFactory};
pub use document::{DocumentLoaderComponent, DocumentLoaderComponentFactory};
pub use embed::{
    EmbedComponent, EmbedComponentFactory, VectorStoreComponent, VectorStoreComponentFactory,
};
pub use http::{HttpChatConfig, HttpChatService};
pub use retrieve::{RetrieveComponent, RetrieveComponentFactory};
pub use time::{DelayComponent, DelayComponentFactory};
pub use transform::{FormatComponent, FormatComponentFactory};

use std::sync::Arc;
use weftcore::{ChatService, EmbeddingService, RecordStore, RegistryError, VectorStore};
use weftruntime::{ComponentRegistry, InMemoryRecordStore};

/// Collaborators handed to the components that need them
#[derive(Clone)]
pub struct Services {
    pub records: Arc<dyn RecordStore>,
    pub vectors: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn EmbeddingService>,
    pub chat: Arc<dyn ChatService>,
}

impl Services {
    /// Offline backends: in-memory records and vectors, hashing embeddings,
    /// echo chat.
    pub fn in_memory() -> Self {
        Self {
            records: Arc::new(InMemoryRecordStore::new()),
            vectors: Arc::new(InMemoryVectorStore::new()),
            embedder: Arc::new(HashingEmbedder::default()),
            chat: Arc::new(EchoChatService),
        }
    }

    pub fn with_records(mut self, records: Arc<dyn RecordStore>) -> Self {
        self.records = records;
        self
    }

    pub fn with_vectors(mut self, vectors: Arc<dyn VectorStore>) -> Self {
        self.vectors = vectors;
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingService>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_chat(mut self, chat: Arc<dyn ChatService>) -> Self {
        self.chat = chat;
        self
    }
}

/// Register all standard components with a registry
pub fn register_all(registry: &mut ComponentRegistry, services: &Services) -> Result<(), RegistryError> {
    registry.register_factory(Arc::new(DocumentLoaderComponentFactory::new(services.records.clone())))?;
    registry.register_factory(Arc::new(TextChunkComponentFactory))?;
    registry.register_factory(Arc::new(EmbedComponentFactory::new(services.embedder.clone())))?;
    registry.register_factory(Arc::new(VectorStoreComponentFactory::new(services.vectors.clone())))?;
    registry.register_factory(Arc::new(RetrieveComponentFactory::new(
        services.embedder.clone(),
        services.vectors.clone(),
    )))?;
    registry.register_factory(Arc::new(ChatComponentFactory::new(services.chat.clone())))?;
    registry.register_factory(Arc::new(FormatComponentFactory))?;
    registry.register_factory(Arc::new(DebugComponentFactory))?;
    registry.register_factory(Arc::new(DelayComponentFactory))?;
    Ok(())
}
