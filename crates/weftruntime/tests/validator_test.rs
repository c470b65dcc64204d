mod common;

use common::test_registry;
use weftcore::{NodeSpec, ValidationError, ValueType, Violation, WorkflowDefinition};
use weftruntime::{validate, ComponentRegistry};

fn rejected(registry: &ComponentRegistry, workflow: &WorkflowDefinition) -> ValidationError {
    match validate(registry, workflow) {
        Err(e) => e,
        Ok(_) => panic!("workflow '{}' should be rejected", workflow.name),
    }
}

fn constant(id: &str) -> NodeSpec {
    NodeSpec::new(id, "test.constant").with_config("value", 1.0)
}

#[test]
fn test_valid_workflow_produces_plan() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("chain")
        .with_node(constant("a"))
        .with_node(NodeSpec::new("b", "test.constant").with_input("in", "a", "value"))
        .with_node(NodeSpec::new("c", "test.constant").with_input("in", "b", "value"));

    let plan = validate(&registry, &workflow).unwrap();
    assert_eq!(plan.len(), 3);
    assert_eq!(plan.dependencies(1), vec![0]);
    assert_eq!(plan.dependents(1), vec![2]);
    assert_eq!(plan.sinks(), vec![2]);
}

#[test]
fn test_three_node_cycle() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("cycle")
        .with_node(NodeSpec::new("a", "test.constant").with_input("in", "c", "value"))
        .with_node(NodeSpec::new("b", "test.constant").with_input("in", "a", "value"))
        .with_node(NodeSpec::new("c", "test.constant").with_input("in", "b", "value"));

    let err = rejected(&registry, &workflow);
    assert!(err.has_cycle());

    let cycle = err
        .violations
        .iter()
        .find_map(|v| match v {
            Violation::CyclicDependency { cycle } => Some(cycle.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(cycle.len(), 4);
    assert_eq!(cycle.first(), cycle.last());
    for id in ["a", "b", "c"] {
        assert!(cycle.contains(&id.to_string()));
    }
}

#[test]
fn test_self_loop_is_a_cycle() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("self")
        .with_node(NodeSpec::new("a", "test.constant").with_input("in", "a", "value"));

    let err = rejected(&registry, &workflow);
    assert_eq!(
        err.violations,
        vec![Violation::CyclicDependency {
            cycle: vec!["a".to_string(), "a".to_string()]
        }]
    );
}

#[test]
fn test_duplicate_node_id() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("dupes")
        .with_node(constant("n1"))
        .with_node(constant("n1"))
        .with_node(constant("n2"));

    let err = rejected(&registry, &workflow);
    assert_eq!(
        err.violations,
        vec![Violation::DuplicateNodeId {
            node_id: "n1".to_string()
        }]
    );
}

#[test]
fn test_missing_required_input() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("missing").with_node(NodeSpec::new("shout", "test.upper"));

    let err = rejected(&registry, &workflow);
    assert_eq!(
        err.violations,
        vec![Violation::MissingRequiredInput {
            node_id: "shout".to_string(),
            input: "text".to_string()
        }]
    );
}

#[test]
fn test_required_input_satisfied_by_config() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("config")
        .with_node(NodeSpec::new("shout", "test.upper").with_config("text", "hello"));

    assert!(validate(&registry, &workflow).is_ok());
}

#[test]
fn test_dangling_edges() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("dangling")
        .with_node(constant("a"))
        .with_node(NodeSpec::new("b", "test.constant").with_input("in", "ghost", "value"))
        .with_node(NodeSpec::new("c", "test.constant").with_input("in", "a", "missing_output"));

    let err = rejected(&registry, &workflow);
    assert_eq!(
        err.violations,
        vec![
            Violation::DanglingEdge {
                node_id: "b".to_string(),
                input: "in".to_string()
            },
            Violation::DanglingEdge {
                node_id: "c".to_string(),
                input: "in".to_string()
            },
        ]
    );
}

#[test]
fn test_type_checks_on_bindings() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("types")
        .with_node(NodeSpec::new("wrong", "test.wrong_type"))
        .with_node(NodeSpec::new("literal", "test.upper").with_literal("text", 3.0))
        .with_node(NodeSpec::new("extra", "test.constant").with_literal("bogus", true));

    let err = rejected(&registry, &workflow);
    assert!(err.violations.contains(&Violation::LiteralTypeMismatch {
        node_id: "literal".to_string(),
        input: "text".to_string(),
        expected: ValueType::String,
        actual: ValueType::Number,
    }));
    assert!(err.violations.contains(&Violation::UnknownInput {
        node_id: "extra".to_string(),
        input: "bogus".to_string(),
    }));
}

#[test]
fn test_all_violations_collected() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("broken")
        .with_node(constant("a"))
        .with_node(constant("a"))
        .with_node(NodeSpec::new("b", "text.summarize"))
        .with_node(NodeSpec::new("c", "test.upper"))
        .with_node(NodeSpec::new("d", "test.constant").with_input("in", "e", "value"))
        .with_node(NodeSpec::new("e", "test.constant").with_input("in", "d", "value"));

    let err = rejected(&registry, &workflow);
    assert_eq!(err.violations.len(), 4);
    assert!(matches!(err.violations[0], Violation::DuplicateNodeId { .. }));
    assert!(matches!(err.violations[1], Violation::UnknownComponentType { .. }));
    assert!(matches!(err.violations[2], Violation::MissingRequiredInput { .. }));
    assert!(matches!(err.violations[3], Violation::CyclicDependency { .. }));
}

#[test]
fn test_validation_is_deterministic() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("repeat")
        .with_node(NodeSpec::new("a", "test.constant").with_input("in", "b", "value"))
        .with_node(NodeSpec::new("b", "test.constant").with_input("in", "a", "value"))
        .with_node(NodeSpec::new("c", "no.such.type"));

    let first = rejected(&registry, &workflow);
    let second = rejected(&registry, &workflow);
    assert_eq!(first, second);
}

#[test]
fn test_config_fallback_is_type_checked() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("config types")
        .with_node(NodeSpec::new("shout", "test.upper").with_config("text", 5.0));

    let err = rejected(&registry, &workflow);
    assert_eq!(
        err.violations,
        vec![Violation::LiteralTypeMismatch {
            node_id: "shout".to_string(),
            input: "text".to_string(),
            expected: ValueType::String,
            actual: ValueType::Number,
        }]
    );

    // A bound input shadows the config entry of the same name
    let bound = WorkflowDefinition::new("bound")
        .with_node(
            NodeSpec::new("shout", "test.upper")
                .with_literal("text", "hello")
                .with_config("text", 5.0),
        );
    assert!(validate(&registry, &bound).is_ok());
}

fn chain(len: usize, closed: bool) -> WorkflowDefinition {
    let mut workflow = WorkflowDefinition::new("long chain");
    for i in 0..len {
        let mut node = NodeSpec::new(format!("n{}", i), "test.constant");
        if i > 0 {
            node = node.with_input("in", format!("n{}", i - 1), "value");
        } else if closed {
            node = node.with_input("in", format!("n{}", len - 1), "value");
        }
        workflow.add_node(node);
    }
    workflow
}

fn on_small_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn test_long_chain_validates_on_small_stack() {
    let len = on_small_stack(|| {
        let registry = test_registry();
        validate(&registry, &chain(100_000, false)).map(|plan| plan.len()).ok()
    });
    assert_eq!(len, Some(100_000));
}

#[test]
fn test_long_cycle_reported_on_small_stack() {
    let violations = on_small_stack(|| {
        let registry = test_registry();
        rejected(&registry, &chain(100_000, true)).violations
    });

    assert_eq!(violations.len(), 1);
    match &violations[0] {
        Violation::CyclicDependency { cycle } => {
            assert_eq!(cycle.len(), 100_001);
            assert_eq!(cycle.first().map(String::as_str), Some("n0"));
            assert_eq!(cycle.last().map(String::as_str), Some("n0"));
            assert_eq!(cycle[1], "n1");
        }
        other => panic!("expected a cycle, got {}", other),
    }
}
