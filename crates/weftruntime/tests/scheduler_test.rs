mod common;

use common::{plan_for, test_registry};
use std::collections::HashMap;
use weftcore::{NodeSpec, NodeStatus, WorkflowDefinition};
use weftruntime::{ExecutionPlan, Scheduler};

fn diamond() -> WorkflowDefinition {
    // a -> b, a -> c, (b, c) -> d, plus an isolated e
    WorkflowDefinition::new("diamond")
        .with_node(NodeSpec::new("a", "test.constant"))
        .with_node(NodeSpec::new("b", "test.constant").with_input("in", "a", "value"))
        .with_node(NodeSpec::new("c", "test.constant").with_input("in", "a", "value"))
        .with_node(
            NodeSpec::new("d", "test.constant")
                .with_input("in", "b", "value")
                .with_input("other", "c", "value"),
        )
        .with_node(NodeSpec::new("e", "test.constant"))
}

fn assert_respects_edges(plan: &ExecutionPlan, order: &[String]) {
    let index: HashMap<&str, usize> = order.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
    for position in 0..plan.len() {
        for dependency in plan.dependencies(position) {
            assert!(
                index[plan.node_id(dependency)] < index[plan.node_id(position)],
                "{} must come before {}",
                plan.node_id(dependency),
                plan.node_id(position)
            );
        }
    }
}

#[test]
fn test_topological_order_ties_follow_declaration() {
    let registry = test_registry();
    let plan = plan_for(&registry, &diamond());
    let order = Scheduler::new(&plan).topological_order();

    assert_eq!(order, vec!["a", "b", "c", "d", "e"]);
    assert_respects_edges(&plan, &order);
}

#[test]
fn test_topological_order_reversed_declaration() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("reversed")
        .with_node(NodeSpec::new("sink", "test.constant").with_input("in", "mid", "value"))
        .with_node(NodeSpec::new("mid", "test.constant").with_input("in", "root", "value"))
        .with_node(NodeSpec::new("root", "test.constant"));

    let plan = plan_for(&registry, &workflow);
    let order = Scheduler::new(&plan).topological_order();

    assert_eq!(order, vec!["root", "mid", "sink"]);
    assert_respects_edges(&plan, &order);
}

#[test]
fn test_independent_nodes_keep_declaration_order() {
    let registry = test_registry();
    let workflow = WorkflowDefinition::new("flat")
        .with_node(NodeSpec::new("z", "test.constant"))
        .with_node(NodeSpec::new("y", "test.constant"))
        .with_node(NodeSpec::new("x", "test.constant"));

    let plan = plan_for(&registry, &workflow);
    assert_eq!(Scheduler::new(&plan).topological_order(), vec!["z", "y", "x"]);
}

#[test]
fn test_batches_and_concurrency() {
    let registry = test_registry();
    let plan = plan_for(&registry, &diamond());
    let scheduler = Scheduler::new(&plan);

    assert_eq!(
        scheduler.batches(),
        vec![vec!["a", "e"], vec!["b", "c"], vec!["d"]]
    );
    assert_eq!(scheduler.concurrent_with("b"), vec!["c"]);
    assert_eq!(scheduler.concurrent_with("a"), vec!["e"]);
    assert!(scheduler.concurrent_with("d").is_empty());
    assert!(scheduler.concurrent_with("nope").is_empty());
}

#[test]
fn test_ready_requires_all_dependencies_succeeded() {
    let registry = test_registry();
    let plan = plan_for(&registry, &diamond());
    let scheduler = Scheduler::new(&plan);

    let mut states = vec![NodeStatus::Pending; plan.len()];
    assert_eq!(scheduler.ready(&states), vec![0, 4]);

    states[0] = NodeStatus::Succeeded;
    states[4] = NodeStatus::Running;
    assert_eq!(scheduler.ready(&states), vec![1, 2]);

    states[1] = NodeStatus::Succeeded;
    states[2] = NodeStatus::Failed;
    assert!(scheduler.ready(&states).is_empty());

    states[2] = NodeStatus::Succeeded;
    assert_eq!(scheduler.ready(&states), vec![3]);
}
