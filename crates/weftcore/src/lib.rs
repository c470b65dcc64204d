//! Core abstractions for the Weft workflow engine
//!
//! This crate provides the data model, the component contract, the error
//! taxonomy and the collaborator interfaces that every other crate shares.
//! It contains no scheduling logic.

mod component;
mod error;
pub mod events;
mod run;
mod schema;
pub mod services;
mod value;
mod workflow;

pub use component::{Component, ComponentContext, ComponentOutput};
pub use error::{
    ComponentError, ContextError, EngineError, NodeExecutionError, NodeFailure, RegistryError,
    ServiceError, StoreError, ValidationError, Violation,
};
pub use events::*;
pub use run::{NodeErrorSummary, NodeReport, NodeStatus, RunId, RunPhase, RunResult, RunStatus};
pub use schema::{ComponentDescriptor, InputPort, InputSchema, OutputPort, OutputSchema};
pub use services::{
    ChatParameters, ChatService, DocumentRecord, EmbeddingService, RecordStore, ScoredDocument,
    VectorStore,
};
pub use value::{Value, ValueType};
pub use workflow::{InputBinding, NodeId, NodeSpec, Position, WorkflowDefinition, WorkflowId, WorkflowSettings};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
