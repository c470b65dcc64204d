use crate::plan::ExecutionPlan;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use weftcore::{
    ContextError, InputBinding, NodeErrorSummary, NodeFailure, NodeId, NodeReport, NodeStatus,
    RunId, RunPhase, RunResult, RunStatus, Value, WorkflowId,
};

pub type Outputs = HashMap<String, Value>;

#[derive(Debug, Default, Clone)]
struct Diagnostics {
    error: Option<NodeErrorSummary>,
    skipped_because: Option<NodeId>,
    duration_ms: Option<u64>,
}

/// Mutable per-run state: node statuses and recorded outputs.
///
/// Each node's output has exactly one writer; `set_output` refuses a second
/// write for the same node.
pub struct ExecutionContext {
    run_id: RunId,
    created_at: DateTime<Utc>,
    plan: Arc<ExecutionPlan>,
    phase: RwLock<RunPhase>,
    states: RwLock<Vec<NodeStatus>>,
    outputs: RwLock<HashMap<usize, Arc<Outputs>>>,
    diagnostics: RwLock<Vec<Diagnostics>>,
}

impl ExecutionContext {
    pub fn new(plan: Arc<ExecutionPlan>) -> Self {
        let len = plan.len();
        Self {
            run_id: RunId::new_v4(),
            created_at: Utc::now(),
            plan,
            phase: RwLock::new(RunPhase::Initializing),
            states: RwLock::new(vec![NodeStatus::Pending; len]),
            outputs: RwLock::new(HashMap::new()),
            diagnostics: RwLock::new(vec![Diagnostics::default(); len]),
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn workflow_id(&self) -> WorkflowId {
        self.plan.workflow_id()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn plan(&self) -> &Arc<ExecutionPlan> {
        &self.plan
    }

    pub async fn phase(&self) -> RunPhase {
        *self.phase.read().await
    }

    pub(crate) async fn set_phase(&self, phase: RunPhase) {
        *self.phase.write().await = phase;
    }

    /// Statuses indexed by plan position
    pub async fn snapshot(&self) -> Vec<NodeStatus> {
        self.states.read().await.clone()
    }

    pub async fn status(&self, node_id: &str) -> Result<NodeStatus, ContextError> {
        let position = self.position(node_id)?;
        Ok(self.status_at(position).await)
    }

    pub(crate) async fn status_at(&self, position: usize) -> NodeStatus {
        self.states.read().await[position]
    }

    /// Move a node along the state machine; returns the previous status.
    pub async fn transition(&self, node_id: &str, to: NodeStatus) -> Result<NodeStatus, ContextError> {
        let position = self.position(node_id)?;
        self.transition_at(position, to).await
    }

    pub(crate) async fn transition_at(&self, position: usize, to: NodeStatus) -> Result<NodeStatus, ContextError> {
        let mut states = self.states.write().await;
        let from = states[position];
        if !from.can_transition_to(to) {
            return Err(ContextError::InvalidTransition {
                node_id: self.plan.node_id(position).to_string(),
                from,
                to,
            });
        }
        states[position] = to;
        Ok(from)
    }

    /// Record a node's output. First writer wins; later writes fail.
    pub async fn set_output(&self, node_id: &str, outputs: Outputs) -> Result<(), ContextError> {
        let position = self.position(node_id)?;
        self.set_output_at(position, outputs).await
    }

    pub(crate) async fn set_output_at(&self, position: usize, outputs: Outputs) -> Result<(), ContextError> {
        let mut recorded = self.outputs.write().await;
        if recorded.contains_key(&position) {
            return Err(ContextError::DuplicateWrite(
                self.plan.node_id(position).to_string(),
            ));
        }
        recorded.insert(position, Arc::new(outputs));
        Ok(())
    }

    pub async fn output(&self, node_id: &str) -> Option<Arc<Outputs>> {
        let position = self.plan.position(node_id)?;
        self.outputs.read().await.get(&position).cloned()
    }

    /// Resolve a node's declared inputs against recorded upstream outputs.
    ///
    /// Inputs the node leaves unbound fall back to a config entry of the same
    /// name when the component declares that input.
    pub async fn bind_inputs(&self, node_id: &str) -> Result<Outputs, ContextError> {
        let position = self.position(node_id)?;
        self.bind_inputs_at(position).await
    }

    pub(crate) async fn bind_inputs_at(&self, position: usize) -> Result<Outputs, ContextError> {
        let node = self.plan.node(position);
        let recorded = self.outputs.read().await;
        let mut inputs = Outputs::new();

        for (input, binding) in &node.spec.inputs {
            let value = match binding {
                InputBinding::Literal { value } => value.clone(),
                InputBinding::Edge {
                    node: source,
                    output,
                } => self
                    .plan
                    .position(source)
                    .and_then(|source_position| recorded.get(&source_position))
                    .and_then(|outputs| outputs.get(output))
                    .cloned()
                    .ok_or_else(|| ContextError::UnresolvedInput {
                        node_id: node.spec.id.clone(),
                        input: input.clone(),
                        source_node: source.clone(),
                        output: output.clone(),
                    })?,
            };
            inputs.insert(input.clone(), value);
        }

        for input in node.component.descriptor.inputs.keys() {
            if inputs.contains_key(input) {
                continue;
            }
            if let Some(value) = node.spec.config.get(input) {
                inputs.insert(input.clone(), value.clone());
            }
        }

        Ok(inputs)
    }

    pub(crate) async fn record_failure(&self, position: usize, failure: &NodeFailure) {
        self.diagnostics.write().await[position].error = Some(NodeErrorSummary {
            kind: failure.kind().to_string(),
            message: failure.to_string(),
        });
    }

    pub(crate) async fn record_skip(&self, position: usize, upstream: &str) {
        self.diagnostics.write().await[position].skipped_because = Some(upstream.to_string());
    }

    pub(crate) async fn record_duration(&self, position: usize, duration_ms: u64) {
        self.diagnostics.write().await[position].duration_ms = Some(duration_ms);
    }

    /// Build the immutable run result from the current state.
    pub async fn finish(&self) -> RunResult {
        let states = self.states.read().await;
        let outputs = self.outputs.read().await;
        let diagnostics = self.diagnostics.read().await;

        let nodes: BTreeMap<NodeId, NodeReport> = (0..self.plan.len())
            .map(|position| {
                let diag = &diagnostics[position];
                let report = NodeReport {
                    status: states[position],
                    outputs: outputs.get(&position).map(|o| o.as_ref().clone()),
                    error: diag.error.clone(),
                    skipped_because: diag.skipped_because.clone(),
                    duration_ms: diag.duration_ms,
                };
                (self.plan.node_id(position).to_string(), report)
            })
            .collect();

        RunResult {
            run_id: self.run_id,
            workflow_id: self.plan.workflow_id(),
            status: overall_status(&self.plan, &states),
            nodes,
            started_at: self.created_at,
            finished_at: Utc::now(),
        }
    }

    fn position(&self, node_id: &str) -> Result<usize, ContextError> {
        self.plan
            .position(node_id)
            .ok_or_else(|| ContextError::UnknownNode(node_id.to_string()))
    }
}

/// SUCCEEDED iff every node succeeded; CANCELLED if cancellation stopped any
/// node; FAILED iff every sink failed or was skipped; otherwise PARTIAL.
pub fn overall_status(plan: &ExecutionPlan, states: &[NodeStatus]) -> RunStatus {
    if states.iter().all(|s| *s == NodeStatus::Succeeded) {
        return RunStatus::Succeeded;
    }
    if states.iter().any(|s| *s == NodeStatus::Cancelled) {
        return RunStatus::Cancelled;
    }
    let all_sinks_lost = plan
        .sinks()
        .into_iter()
        .all(|sink| matches!(states[sink], NodeStatus::Failed | NodeStatus::Skipped));
    if all_sinks_lost {
        RunStatus::Failed
    } else {
        RunStatus::Partial
    }
}
