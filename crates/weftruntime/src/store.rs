use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use weftcore::{DocumentRecord, RecordStore, RunId, RunResult, StoreError, WorkflowDefinition, WorkflowId};

/// Process-local `RecordStore`, used by the CLI, the server and tests
#[derive(Default)]
pub struct InMemoryRecordStore {
    workflows: RwLock<HashMap<WorkflowId, WorkflowDefinition>>,
    runs: RwLock<HashMap<RunId, RunResult>>,
    documents: RwLock<HashMap<String, DocumentRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run_count(&self) -> usize {
        self.runs.read().await.len()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn load_workflow(&self, id: WorkflowId) -> Result<WorkflowDefinition, StoreError> {
        self.workflows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("workflow {}", id)))
    }

    async fn save_workflow(&self, workflow: WorkflowDefinition) -> Result<(), StoreError> {
        self.workflows.write().await.insert(workflow.id, workflow);
        Ok(())
    }

    async fn list_workflows(&self) -> Result<Vec<WorkflowDefinition>, StoreError> {
        let mut workflows: Vec<WorkflowDefinition> = self.workflows.read().await.values().cloned().collect();
        workflows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(workflows)
    }

    async fn delete_workflow(&self, id: WorkflowId) -> Result<bool, StoreError> {
        Ok(self.workflows.write().await.remove(&id).is_some())
    }

    async fn save_run_result(&self, result: RunResult) -> Result<(), StoreError> {
        self.runs.write().await.insert(result.run_id, result);
        Ok(())
    }

    async fn load_run_result(&self, run_id: RunId) -> Result<RunResult, StoreError> {
        self.runs
            .read()
            .await
            .get(&run_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("run {}", run_id)))
    }

    async fn save_document(&self, document: DocumentRecord) -> Result<(), StoreError> {
        self.documents.write().await.insert(document.id.clone(), document);
        Ok(())
    }

    async fn load_document_metadata(&self, document_id: &str) -> Result<DocumentRecord, StoreError> {
        self.documents
            .read()
            .await
            .get(document_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("document {}", document_id)))
    }
}
