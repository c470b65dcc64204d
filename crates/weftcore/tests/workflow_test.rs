use weftcore::{
    InputBinding, NodeSpec, NodeStatus, Value, ValueType, Violation, WorkflowDefinition,
};

#[test]
fn test_workflow_json_shape() {
    let json = r#"{
        "id": "6f1c2b7e-3c1a-4d2b-9a57-0c1d2e3f4a5b",
        "name": "qa",
        "nodes": [
            {
                "id": "retrieve",
                "component_type": "vector.retrieve",
                "config": { "top_k": { "type": "Number", "value": 3 } },
                "inputs": {
                    "query": { "kind": "literal", "value": { "type": "String", "value": "why?" } }
                }
            },
            {
                "id": "answer",
                "component_type": "chat.complete",
                "inputs": {
                    "context": { "kind": "edge", "node": "retrieve", "output": "context" },
                    "prompt": { "kind": "literal", "value": { "type": "String", "value": "why?" } }
                }
            }
        ],
        "settings": { "max_parallel_nodes": 2 }
    }"#;

    let workflow: WorkflowDefinition = serde_json::from_str(json).unwrap();
    assert_eq!(workflow.nodes.len(), 2);
    assert_eq!(workflow.settings.max_parallel_nodes, Some(2));
    assert_eq!(workflow.settings.node_timeout_ms, None);
    assert_eq!(workflow.edges(), vec![("retrieve".to_string(), "answer".to_string())]);

    let retrieve = workflow.find_node("retrieve").unwrap();
    assert_eq!(retrieve.config.get("top_k"), Some(&Value::Number(3.0)));
    assert_eq!(
        workflow.find_node("answer").unwrap().inputs.get("context"),
        Some(&InputBinding::Edge {
            node: "retrieve".to_string(),
            output: "context".to_string()
        })
    );
}

#[test]
fn test_upstream_nodes_are_distinct() {
    let node = NodeSpec::new("join", "merge")
        .with_input("left", "source", "a")
        .with_input("right", "source", "b")
        .with_input("extra", "other", "c")
        .with_literal("flag", true);

    let upstream: Vec<_> = node.upstream_nodes().collect();
    assert_eq!(upstream, vec!["other", "source"]);
}

#[test]
fn test_value_types() {
    assert_eq!(Value::from("x").value_type(), ValueType::String);
    assert_eq!(Value::from(vec![Value::Null]).value_type(), ValueType::Array);
    assert!(ValueType::Any.accepts(&Value::Bool(true)));
    assert!(!ValueType::Number.accepts(&Value::from("1")));
    assert!(ValueType::String.is_compatible_with(ValueType::Any));
    assert!(!ValueType::String.is_compatible_with(ValueType::Array));
}

#[test]
fn test_node_state_machine() {
    assert!(NodeStatus::Pending.can_transition_to(NodeStatus::Ready));
    assert!(NodeStatus::Ready.can_transition_to(NodeStatus::Cancelled));
    assert!(!NodeStatus::Pending.can_transition_to(NodeStatus::Succeeded));
    assert!(!NodeStatus::Succeeded.can_transition_to(NodeStatus::Failed));
    assert!(NodeStatus::Skipped.is_terminal());
    assert!(!NodeStatus::Running.is_terminal());
    assert_eq!(NodeStatus::Cancelled.to_string(), "CANCELLED");
}

#[test]
fn test_violation_serialization() {
    let violation = Violation::CyclicDependency {
        cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
    };
    let json = serde_json::to_value(&violation).unwrap();
    assert_eq!(json["kind"], "cyclic_dependency");
    assert_eq!(violation.to_string(), "cyclic dependency: a -> b -> a");
}
