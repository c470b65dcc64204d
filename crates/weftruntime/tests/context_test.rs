mod common;

use common::{plan_for, test_registry};
use std::sync::Arc;
use weftcore::{ContextError, NodeSpec, NodeStatus, RunPhase, RunStatus, Value, WorkflowDefinition};
use weftruntime::{ExecutionContext, Outputs};

fn pipeline() -> WorkflowDefinition {
    WorkflowDefinition::new("pipeline")
        .with_node(NodeSpec::new("source", "test.constant").with_config("value", "hello"))
        .with_node(
            NodeSpec::new("shout", "test.upper")
                .with_input("text", "source", "value"),
        )
        .with_node(
            NodeSpec::new("tail", "test.constant")
                .with_input("in", "shout", "text")
                .with_literal("other", 7.0),
        )
}

fn context() -> ExecutionContext {
    let registry = test_registry();
    ExecutionContext::new(Arc::new(plan_for(&registry, &pipeline())))
}

fn outputs(name: &str, value: impl Into<Value>) -> Outputs {
    Outputs::from([(name.to_string(), value.into())])
}

#[tokio::test]
async fn test_new_context_is_pending() {
    let ctx = context();
    assert_eq!(ctx.phase().await, RunPhase::Initializing);
    assert_eq!(ctx.snapshot().await, vec![NodeStatus::Pending; 3]);
    assert!(ctx.output("source").await.is_none());
}

#[tokio::test]
async fn test_first_writer_wins() {
    let ctx = context();
    ctx.set_output("source", outputs("value", "first")).await.unwrap();

    let err = ctx
        .set_output("source", outputs("value", "second"))
        .await
        .unwrap_err();
    assert_eq!(err, ContextError::DuplicateWrite("source".to_string()));

    let recorded = ctx.output("source").await.unwrap();
    assert_eq!(recorded.get("value"), Some(&Value::from("first")));
}

#[tokio::test]
async fn test_bind_inputs_resolves_edges_and_literals() {
    let ctx = context();
    ctx.set_output("source", outputs("value", "hello")).await.unwrap();
    ctx.set_output("shout", outputs("text", "HELLO")).await.unwrap();

    let shout = ctx.bind_inputs("shout").await.unwrap();
    assert_eq!(shout.get("text"), Some(&Value::from("hello")));

    let tail = ctx.bind_inputs("tail").await.unwrap();
    assert_eq!(tail.get("in"), Some(&Value::from("HELLO")));
    assert_eq!(tail.get("other"), Some(&Value::from(7.0)));
}

#[tokio::test]
async fn test_bind_inputs_falls_back_to_config() {
    let ctx = context();
    let source = ctx.bind_inputs("source").await.unwrap();
    // `value` is config, not a declared input of test.constant
    assert!(source.is_empty());

    let registry = test_registry();
    let workflow = WorkflowDefinition::new("config")
        .with_node(NodeSpec::new("shout", "test.upper").with_config("text", "quiet"));
    let ctx = ExecutionContext::new(Arc::new(plan_for(&registry, &workflow)));
    let inputs = ctx.bind_inputs("shout").await.unwrap();
    assert_eq!(inputs.get("text"), Some(&Value::from("quiet")));
}

#[tokio::test]
async fn test_unresolved_input() {
    let ctx = context();
    let err = ctx.bind_inputs("shout").await.unwrap_err();
    assert_eq!(
        err,
        ContextError::UnresolvedInput {
            node_id: "shout".to_string(),
            input: "text".to_string(),
            source_node: "source".to_string(),
            output: "value".to_string(),
        }
    );
}

#[tokio::test]
async fn test_transitions_follow_state_machine() {
    let ctx = context();

    assert_eq!(ctx.transition("source", NodeStatus::Ready).await.unwrap(), NodeStatus::Pending);
    assert_eq!(ctx.transition("source", NodeStatus::Running).await.unwrap(), NodeStatus::Ready);
    assert_eq!(ctx.transition("source", NodeStatus::Succeeded).await.unwrap(), NodeStatus::Running);

    // Terminal states never change again
    let err = ctx.transition("source", NodeStatus::Failed).await.unwrap_err();
    assert!(matches!(err, ContextError::InvalidTransition { .. }));

    // Pending cannot jump straight to running
    let err = ctx.transition("shout", NodeStatus::Running).await.unwrap_err();
    assert_eq!(
        err,
        ContextError::InvalidTransition {
            node_id: "shout".to_string(),
            from: NodeStatus::Pending,
            to: NodeStatus::Running,
        }
    );

    let err = ctx.transition("ghost", NodeStatus::Ready).await.unwrap_err();
    assert_eq!(err, ContextError::UnknownNode("ghost".to_string()));
}

#[tokio::test]
async fn test_finish_reports_every_node() {
    let ctx = context();
    ctx.transition("source", NodeStatus::Ready).await.unwrap();
    ctx.transition("source", NodeStatus::Running).await.unwrap();
    ctx.set_output("source", outputs("value", "hello")).await.unwrap();
    ctx.transition("source", NodeStatus::Succeeded).await.unwrap();
    ctx.transition("shout", NodeStatus::Skipped).await.unwrap();
    ctx.transition("tail", NodeStatus::Skipped).await.unwrap();

    let result = ctx.finish().await;
    assert_eq!(result.run_id, ctx.run_id());
    assert_eq!(result.nodes.len(), 3);
    assert_eq!(result.status_of("source"), Some(NodeStatus::Succeeded));
    assert_eq!(result.output("source", "value"), Some(&Value::from("hello")));
    assert_eq!(result.count(NodeStatus::Skipped), 2);
    // The only sink was skipped
    assert_eq!(result.status, RunStatus::Failed);
}
