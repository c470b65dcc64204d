//! Workflow execution engine
//!
//! This crate validates workflow definitions against the component registry,
//! schedules them topologically and runs nodes in parallel with per-node
//! failure isolation.

mod context;
mod executor;
mod plan;
mod registry;
mod runner;
mod runtime;
mod scheduler;
mod store;
mod validator;

pub use context::{overall_status, ExecutionContext, Outputs};
pub use executor::{ExecutorConfig, WorkflowExecutor};
pub use plan::{ExecutionPlan, PlannedNode};
pub use registry::{ComponentFactory, ComponentRegistry, RegisteredComponent};
pub use runner::{check_outputs, NodeRun, NodeRunner};
pub use runtime::{RuntimeConfig, WeftRuntime};
pub use scheduler::Scheduler;
pub use store::InMemoryRecordStore;
pub use validator::{validate, Validator};
