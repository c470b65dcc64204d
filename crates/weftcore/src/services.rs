//! Capability interfaces for the collaborators the engine and its
//! components talk to. Implementations live outside this crate.

use crate::{RunId, RunResult, ServiceError, StoreError, Value, WorkflowDefinition, WorkflowId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stored document and its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }
}

/// Structured record store for workflows, run results and documents
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load_workflow(&self, id: WorkflowId) -> Result<WorkflowDefinition, StoreError>;

    async fn save_workflow(&self, workflow: WorkflowDefinition) -> Result<(), StoreError>;

    async fn list_workflows(&self) -> Result<Vec<WorkflowDefinition>, StoreError>;

    /// Returns `false` when nothing was stored under `id`
    async fn delete_workflow(&self, id: WorkflowId) -> Result<bool, StoreError>;

    async fn save_run_result(&self, result: RunResult) -> Result<(), StoreError>;

    async fn load_run_result(&self, run_id: RunId) -> Result<RunResult, StoreError>;

    async fn save_document(&self, document: DocumentRecord) -> Result<(), StoreError>;

    async fn load_document_metadata(&self, document_id: &str) -> Result<DocumentRecord, StoreError>;
}

/// One nearest-neighbour hit, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document_id: String,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Up to `top_k` entries ordered by descending similarity
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredDocument>, ServiceError>;

    async fn upsert(&self, document_id: &str, embedding: Vec<f32>, payload: Value) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatParameters {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Text completion backend
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn complete(&self, prompt: &str, parameters: &ChatParameters) -> Result<String, ServiceError>;
}

/// Text embedding backend
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;
}
