#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use weftcore::{
    Component, ComponentContext, ComponentDescriptor, ComponentError, ComponentOutput,
    DocumentRecord, InputPort, OutputPort, RecordStore, RunId, RunResult, StoreError, Value,
    ValueType, WorkflowDefinition, WorkflowId,
};
use weftruntime::{validate, ComponentFactory, ComponentRegistry, ExecutionPlan};

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Tracks how many probe nodes run at the same time
#[derive(Default)]
pub struct ConcurrencyProbe {
    current: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
enum Behavior {
    /// Emits config `value` (or its `in` input) on `value`
    Constant,
    /// Uppercases its required `text` input
    Upper,
    Fail,
    Panic,
    /// Declares a string output but emits a number
    WrongType,
    /// Sleeps for config `delay_ms`, then emits `value`
    Sleep,
    Probe(Arc<ConcurrencyProbe>),
}

struct TestFactory {
    type_name: &'static str,
    behavior: Behavior,
}

struct TestComponent {
    type_name: &'static str,
    behavior: Behavior,
}

impl ComponentFactory for TestFactory {
    fn create(&self, _config: &HashMap<String, Value>) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(TestComponent {
            type_name: self.type_name,
            behavior: self.behavior.clone(),
        }))
    }

    fn descriptor(&self) -> ComponentDescriptor {
        let descriptor = ComponentDescriptor::new(self.type_name).with_category("test");
        match self.behavior {
            Behavior::Upper => descriptor
                .with_input("text", InputPort::required(ValueType::String))
                .with_output("text", OutputPort::new(ValueType::String)),
            Behavior::WrongType => descriptor
                .with_input("in", InputPort::optional(ValueType::Any))
                .with_output("value", OutputPort::new(ValueType::String)),
            _ => descriptor
                .with_input("in", InputPort::optional(ValueType::Any))
                .with_input("other", InputPort::optional(ValueType::Any))
                .with_output("value", OutputPort::new(ValueType::Any)),
        }
    }
}

#[async_trait]
impl Component for TestComponent {
    fn component_type(&self) -> &str {
        self.type_name
    }

    async fn execute(&self, ctx: ComponentContext) -> Result<ComponentOutput, ComponentError> {
        match &self.behavior {
            Behavior::Constant => {
                let value = ctx
                    .config
                    .get("value")
                    .or_else(|| ctx.inputs.get("in"))
                    .cloned()
                    .unwrap_or(Value::Null);
                Ok(ComponentOutput::new().with_output("value", value))
            }
            Behavior::Upper => {
                let text = ctx.require_str("text")?;
                Ok(ComponentOutput::new().with_output("text", text.to_uppercase()))
            }
            Behavior::Fail => Err(ComponentError::ExecutionFailed("boom".to_string())),
            Behavior::Panic => panic!("component exploded"),
            Behavior::WrongType => Ok(ComponentOutput::new().with_output("value", 42.0)),
            Behavior::Sleep => {
                let delay = ctx.config_usize("delay_ms", 50)?;
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
                Ok(ComponentOutput::new().with_output("value", ctx.node_id.clone()))
            }
            Behavior::Probe(probe) => {
                probe.enter();
                tokio::time::sleep(Duration::from_millis(30)).await;
                probe.leave();
                Ok(ComponentOutput::new().with_output("value", ctx.node_id.clone()))
            }
        }
    }
}

fn register(registry: &mut ComponentRegistry, type_name: &'static str, behavior: Behavior) {
    registry
        .register_factory(Arc::new(TestFactory { type_name, behavior }))
        .expect("test component registers once");
}

/// Registry with every test component type
pub fn test_registry() -> ComponentRegistry {
    test_registry_with_probe(Arc::new(ConcurrencyProbe::default()))
}

pub fn test_registry_with_probe(probe: Arc<ConcurrencyProbe>) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    register(&mut registry, "test.constant", Behavior::Constant);
    register(&mut registry, "test.upper", Behavior::Upper);
    register(&mut registry, "test.fail", Behavior::Fail);
    register(&mut registry, "test.panic", Behavior::Panic);
    register(&mut registry, "test.wrong_type", Behavior::WrongType);
    register(&mut registry, "test.sleep", Behavior::Sleep);
    register(&mut registry, "test.probe", Behavior::Probe(probe));
    registry
}

/// Validate a workflow that is expected to be well formed
pub fn plan_for(registry: &ComponentRegistry, workflow: &WorkflowDefinition) -> ExecutionPlan {
    match validate(registry, workflow) {
        Ok(plan) => plan,
        Err(e) => panic!("workflow '{}' should validate: {}", workflow.name, e),
    }
}

/// Record store whose backend is down; counts attempted run-result writes
#[derive(Default)]
pub struct UnavailableStore {
    run_writes: AtomicUsize,
}

impl UnavailableStore {
    pub fn run_writes(&self) -> usize {
        self.run_writes.load(Ordering::SeqCst)
    }

    fn down<T>() -> Result<T, StoreError> {
        Err(StoreError::StoreUnavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl RecordStore for UnavailableStore {
    async fn load_workflow(&self, _id: WorkflowId) -> Result<WorkflowDefinition, StoreError> {
        Self::down()
    }

    async fn save_workflow(&self, _workflow: WorkflowDefinition) -> Result<(), StoreError> {
        Self::down()
    }

    async fn list_workflows(&self) -> Result<Vec<WorkflowDefinition>, StoreError> {
        Self::down()
    }

    async fn delete_workflow(&self, _id: WorkflowId) -> Result<bool, StoreError> {
        Self::down()
    }

    async fn save_run_result(&self, _result: RunResult) -> Result<(), StoreError> {
        self.run_writes.fetch_add(1, Ordering::SeqCst);
        Self::down()
    }

    async fn load_run_result(&self, _run_id: RunId) -> Result<RunResult, StoreError> {
        Self::down()
    }

    async fn save_document(&self, _document: DocumentRecord) -> Result<(), StoreError> {
        Self::down()
    }

    async fn load_document_metadata(&self, _document_id: &str) -> Result<DocumentRecord, StoreError> {
        Self::down()
    }
}
