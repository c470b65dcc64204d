use crate::context::Outputs;
use crate::registry::RegisteredComponent;
use std::any::Any;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use weftcore::{
    ComponentContext, ComponentDescriptor, EventEmitter, NodeExecutionError, NodeFailure, NodeSpec,
    RunId,
};

/// Successful execution of one node
#[derive(Debug, Clone)]
pub struct NodeRun {
    pub outputs: Outputs,
    pub duration_ms: u64,
}

/// Executes a single node in isolation.
///
/// The component runs on its own task, so a panic surfaces as a
/// [`NodeFailure::Panicked`] instead of tearing down the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct NodeRunner {
    timeout: Option<Duration>,
}

impl NodeRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn run(
        &self,
        node: &NodeSpec,
        inputs: Outputs,
        component: &RegisteredComponent,
        run_id: RunId,
        events: EventEmitter,
    ) -> Result<NodeRun, NodeExecutionError> {
        let fail = |cause: NodeFailure| NodeExecutionError::new(node.id.clone(), cause);

        let cancellation = CancellationToken::new();
        let ctx = ComponentContext {
            run_id,
            node_id: node.id.clone(),
            inputs,
            config: node.config.clone(),
            events,
            cancellation: cancellation.clone(),
        };

        let factory = component.factory.clone();
        let config = node.config.clone();
        let start = Instant::now();

        let mut handle = tokio::spawn(async move {
            let instance = factory
                .create(&config)
                .map_err(|e| NodeFailure::Instantiation(e.to_string()))?;
            instance.execute(ctx).await.map_err(NodeFailure::Component)
        });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    cancellation.cancel();
                    handle.abort();
                    tracing::warn!(node_id = %node.id, timeout_ms = limit.as_millis() as u64, "node timed out");
                    return Err(fail(NodeFailure::NodeTimeout {
                        millis: limit.as_millis() as u64,
                    }));
                }
            },
            None => handle.await,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let output = match joined {
            Ok(result) => result.map_err(fail)?,
            Err(join_error) if join_error.is_panic() => {
                return Err(fail(NodeFailure::Panicked(panic_message(join_error.into_panic()))));
            }
            Err(_) => return Err(fail(NodeFailure::Cancelled)),
        };

        check_outputs(&component.descriptor, &output.outputs)
            .map_err(|reason| fail(NodeFailure::SchemaMismatch(reason)))?;

        Ok(NodeRun {
            outputs: output.outputs,
            duration_ms,
        })
    }
}

/// Every declared output must be present with an accepted type, and nothing
/// undeclared may be emitted.
pub fn check_outputs(descriptor: &ComponentDescriptor, outputs: &Outputs) -> Result<(), String> {
    for (name, port) in &descriptor.outputs {
        match outputs.get(name) {
            None => return Err(format!("missing output '{}'", name)),
            Some(value) if !port.value_type.accepts(value) => {
                return Err(format!(
                    "output '{}' is {}, expected {}",
                    name,
                    value.value_type(),
                    port.value_type
                ));
            }
            Some(_) => {}
        }
    }

    let mut undeclared: Vec<&str> = outputs
        .keys()
        .filter(|name| !descriptor.outputs.contains_key(*name))
        .map(String::as_str)
        .collect();
    if !undeclared.is_empty() {
        undeclared.sort_unstable();
        return Err(format!("undeclared output(s): {}", undeclared.join(", ")));
    }
    Ok(())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
