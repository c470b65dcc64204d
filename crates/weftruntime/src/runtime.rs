use crate::executor::{ExecutorConfig, WorkflowExecutor};
use crate::plan::ExecutionPlan;
use crate::registry::ComponentRegistry;
use crate::store::InMemoryRecordStore;
use crate::validator::Validator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use weftcore::{
    EngineError, EventBus, ExecutionEvent, RecordStore, RunId, RunResult, ValidationError,
    WorkflowDefinition, WorkflowId,
};

/// Main runtime for validating and executing workflows
pub struct WeftRuntime {
    registry: Arc<ComponentRegistry>,
    executor: Arc<WorkflowExecutor>,
    event_bus: Arc<EventBus>,
    store: Arc<dyn RecordStore>,
}

impl WeftRuntime {
    /// Create a runtime with an empty registry and default settings
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_registry(Arc::new(ComponentRegistry::new()), config)
    }

    /// Create a runtime around a fully populated registry
    pub fn with_registry(registry: Arc<ComponentRegistry>, config: RuntimeConfig) -> Self {
        let executor = Arc::new(WorkflowExecutor::with_config(ExecutorConfig {
            max_parallel: config.max_parallel_nodes.max(1),
            node_timeout: config.node_timeout(),
        }));
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));

        Self {
            registry,
            executor,
            event_bus,
            store: Arc::new(InMemoryRecordStore::new()),
        }
    }

    /// Replace the record store
    pub fn with_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = store;
        self
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn validate(&self, workflow: &WorkflowDefinition) -> Result<ExecutionPlan, ValidationError> {
        Validator::new(&self.registry).validate(workflow)
    }

    /// Validate and execute a workflow directly (without storing it)
    pub async fn execute(&self, workflow: &WorkflowDefinition) -> Result<RunResult, EngineError> {
        self.execute_with_cancellation(workflow, CancellationToken::new())
            .await
    }

    pub async fn execute_with_cancellation(
        &self,
        workflow: &WorkflowDefinition,
        cancel: CancellationToken,
    ) -> Result<RunResult, EngineError> {
        let plan = Arc::new(self.validate(workflow)?);
        let result = self.executor.execute(plan, &self.event_bus, cancel).await?;

        if let Err(e) = self.store.save_run_result(result.clone()).await {
            tracing::error!(run_id = %result.run_id, error = %e, "Failed to persist run result");
        }
        Ok(result)
    }

    pub async fn save_workflow(&self, workflow: WorkflowDefinition) -> Result<(), EngineError> {
        tracing::info!(workflow_id = %workflow.id, "Saving workflow: {}", workflow.name);
        self.store.save_workflow(workflow).await?;
        Ok(())
    }

    /// Load a stored workflow and execute it
    pub async fn execute_workflow(&self, workflow_id: WorkflowId) -> Result<RunResult, EngineError> {
        let workflow = self.store.load_workflow(workflow_id).await?;
        self.execute(&workflow).await
    }

    pub async fn run_result(&self, run_id: RunId) -> Result<RunResult, EngineError> {
        Ok(self.store.load_run_result(run_id).await?)
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for WeftRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub max_parallel_nodes: usize,
    pub node_timeout_ms: Option<u64>,
    pub event_buffer_size: usize,
}

impl RuntimeConfig {
    pub fn node_timeout(&self) -> Option<Duration> {
        self.node_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_parallel_nodes: 10,
            node_timeout_ms: None,
            event_buffer_size: 1000,
        }
    }
}
