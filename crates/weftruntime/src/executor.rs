use crate::context::ExecutionContext;
use crate::plan::ExecutionPlan;
use crate::runner::{NodeRun, NodeRunner};
use crate::scheduler::Scheduler;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use weftcore::{
    EngineError, EventBus, ExecutionEvent, NodeExecutionError, NodeFailure, NodeStatus, RunPhase,
    RunResult,
};

/// Limits applied to every run unless the workflow overrides them
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub max_parallel: usize,
    pub node_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallel: 10,
            node_timeout: None,
        }
    }
}

/// Drives a validated plan to completion with bounded parallelism
pub struct WorkflowExecutor {
    config: ExecutorConfig,
}

impl WorkflowExecutor {
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Execute a plan and return its run result.
    ///
    /// Node failures never surface as `Err`: they are recorded per node and
    /// their dependents are skipped. `Err` means the engine itself broke an
    /// invariant.
    pub async fn execute(
        &self,
        plan: Arc<ExecutionPlan>,
        event_bus: &EventBus,
        cancel: CancellationToken,
    ) -> Result<RunResult, EngineError> {
        let ctx = ExecutionContext::new(plan.clone());
        let run_id = ctx.run_id();
        let start_time = Instant::now();

        let max_parallel = plan
            .settings()
            .max_parallel_nodes
            .unwrap_or(self.config.max_parallel)
            .max(1);
        let node_timeout = plan
            .settings()
            .node_timeout_ms
            .map(Duration::from_millis)
            .or(self.config.node_timeout);

        event_bus.emit(ExecutionEvent::RunStarted {
            run_id,
            workflow_id: plan.workflow_id(),
            timestamp: Utc::now(),
        });
        tracing::info!(
            run_id = %run_id,
            workflow_id = %plan.workflow_id(),
            nodes = plan.len(),
            max_parallel,
            "Starting workflow run"
        );

        Self::enter_phase(&ctx, event_bus, RunPhase::Running).await;
        let outcome = self
            .run_loop(&ctx, event_bus, &cancel, NodeRunner::new(node_timeout), max_parallel)
            .await;

        if let Err(e) = outcome {
            Self::enter_phase(&ctx, event_bus, RunPhase::Failed).await;
            tracing::error!(run_id = %run_id, error = %e, "Workflow run aborted");
            return Err(e);
        }

        Self::enter_phase(&ctx, event_bus, RunPhase::Completed).await;
        let result = ctx.finish().await;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        event_bus.emit(ExecutionEvent::RunCompleted {
            run_id,
            status: result.status,
            duration_ms,
            timestamp: Utc::now(),
        });
        tracing::info!(
            run_id = %run_id,
            status = %result.status,
            duration_ms,
            "Workflow run finished"
        );

        Ok(result)
    }

    async fn enter_phase(ctx: &ExecutionContext, event_bus: &EventBus, phase: RunPhase) {
        ctx.set_phase(phase).await;
        event_bus.emit(ExecutionEvent::RunPhaseChanged {
            run_id: ctx.run_id(),
            phase,
            timestamp: Utc::now(),
        });
    }

    async fn run_loop(
        &self,
        ctx: &ExecutionContext,
        event_bus: &EventBus,
        cancel: &CancellationToken,
        runner: NodeRunner,
        max_parallel: usize,
    ) -> Result<(), EngineError> {
        let plan = ctx.plan().clone();
        let scheduler = Scheduler::new(&plan);
        let run_id = ctx.run_id();
        let mut running = FuturesUnordered::new();
        let mut cancelled = false;

        loop {
            if !cancelled && cancel.is_cancelled() {
                cancelled = true;
                tracing::warn!(run_id = %run_id, "Run cancelled, no further nodes will be dispatched");
                self.cancel_pending(ctx, event_bus).await?;
            }

            if !cancelled {
                let snapshot = ctx.snapshot().await;
                for position in scheduler.ready(&snapshot) {
                    ctx.transition_at(position, NodeStatus::Ready).await?;
                }

                let snapshot = ctx.snapshot().await;
                let dispatchable = (0..plan.len()).filter(|p| snapshot[*p] == NodeStatus::Ready);
                for position in dispatchable {
                    if running.len() >= max_parallel {
                        break;
                    }
                    // A failure earlier in this pass may have skipped it
                    if ctx.status_at(position).await != NodeStatus::Ready {
                        continue;
                    }

                    let node = plan.node(position);
                    ctx.transition_at(position, NodeStatus::Running).await?;
                    event_bus.emit(ExecutionEvent::NodeStarted {
                        run_id,
                        node_id: node.spec.id.clone(),
                        component_type: node.spec.component_type.clone(),
                        timestamp: Utc::now(),
                    });
                    tracing::debug!(run_id = %run_id, node_id = %node.spec.id, "Dispatching node");

                    let inputs = match ctx.bind_inputs_at(position).await {
                        Ok(inputs) => inputs,
                        Err(e) => {
                            let error = NodeExecutionError::new(
                                node.spec.id.clone(),
                                NodeFailure::UnresolvedInput(e.to_string()),
                            );
                            self.fail_node(ctx, event_bus, position, error).await?;
                            continue;
                        }
                    };

                    let runner = runner.clone();
                    let spec = node.spec.clone();
                    let component = node.component.clone();
                    let events = event_bus.create_emitter(run_id, node.spec.id.clone());
                    running.push(async move {
                        let result = runner.run(&spec, inputs, &component, run_id, events).await;
                        (position, result)
                    });
                }
            }

            if running.is_empty() {
                let snapshot = ctx.snapshot().await;
                if snapshot.iter().all(NodeStatus::is_terminal) {
                    break;
                }
                let can_progress = !cancelled
                    && (snapshot.contains(&NodeStatus::Ready)
                        || !scheduler.ready(&snapshot).is_empty());
                if can_progress {
                    continue;
                }

                let pending = (0..plan.len())
                    .filter(|p| !snapshot[*p].is_terminal())
                    .map(|p| plan.node_id(p).to_string())
                    .collect();
                return Err(EngineError::SchedulingDeadlock { pending });
            }

            tokio::select! {
                Some((position, result)) = running.next() => {
                    match result {
                        Ok(run) => self.complete_node(ctx, event_bus, position, run).await?,
                        Err(error) => self.fail_node(ctx, event_bus, position, error).await?,
                    }
                }
                _ = cancel.cancelled(), if !cancelled => {}
                else => {}
            }
        }

        Ok(())
    }

    async fn complete_node(
        &self,
        ctx: &ExecutionContext,
        event_bus: &EventBus,
        position: usize,
        run: NodeRun,
    ) -> Result<(), EngineError> {
        let node_id = ctx.plan().node_id(position).to_string();
        tracing::info!(
            run_id = %ctx.run_id(),
            node_id = %node_id,
            duration_ms = run.duration_ms,
            "Node succeeded"
        );

        // Outputs are recorded before the status flips, so no dependent can
        // be dispatched ahead of them.
        ctx.set_output_at(position, run.outputs.clone()).await?;
        ctx.record_duration(position, run.duration_ms).await;
        ctx.transition_at(position, NodeStatus::Succeeded).await?;

        event_bus.emit(ExecutionEvent::NodeSucceeded {
            run_id: ctx.run_id(),
            node_id,
            outputs: run.outputs,
            duration_ms: run.duration_ms,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Mark a node FAILED and skip every transitive dependent still waiting.
    async fn fail_node(
        &self,
        ctx: &ExecutionContext,
        event_bus: &EventBus,
        position: usize,
        error: NodeExecutionError,
    ) -> Result<(), EngineError> {
        tracing::error!(run_id = %ctx.run_id(), node_id = %error.node_id, "Node failed: {}", error.cause);

        ctx.transition_at(position, NodeStatus::Failed).await?;
        ctx.record_failure(position, &error.cause).await;
        event_bus.emit(ExecutionEvent::NodeFailed {
            run_id: ctx.run_id(),
            node_id: error.node_id.clone(),
            error: error.cause.to_string(),
            timestamp: Utc::now(),
        });

        for dependent in ctx.plan().transitive_dependents(position) {
            // A node already skipped keeps the first failure that reached it.
            let status = ctx.status_at(dependent).await;
            if !matches!(status, NodeStatus::Pending | NodeStatus::Ready) {
                continue;
            }
            ctx.transition_at(dependent, NodeStatus::Skipped).await?;
            ctx.record_skip(dependent, &error.node_id).await;

            let node_id = ctx.plan().node_id(dependent).to_string();
            tracing::info!(run_id = %ctx.run_id(), node_id = %node_id, upstream = %error.node_id, "Node skipped");
            event_bus.emit(ExecutionEvent::NodeSkipped {
                run_id: ctx.run_id(),
                node_id,
                upstream: error.node_id.clone(),
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    async fn cancel_pending(&self, ctx: &ExecutionContext, event_bus: &EventBus) -> Result<(), EngineError> {
        let snapshot = ctx.snapshot().await;
        for (position, status) in snapshot.into_iter().enumerate() {
            if matches!(status, NodeStatus::Pending | NodeStatus::Ready) {
                ctx.transition_at(position, NodeStatus::Cancelled).await?;
                event_bus.emit(ExecutionEvent::NodeCancelled {
                    run_id: ctx.run_id(),
                    node_id: ctx.plan().node_id(position).to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
        Ok(())
    }
}
