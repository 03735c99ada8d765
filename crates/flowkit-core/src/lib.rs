//! # Flowkit Core
//!
//! Dispatch machinery for the flowkit runtime.
//!
//! ## Components
//!
//! - [`CallbackRegistry`] - Named callbacks per hook point
//! - [`AgentRegistry`] - Named agent handlers
//! - [`Orchestrator`] - Routing strategies built by [`build_orchestrator`]

pub mod callback;
pub mod orchestrator;
pub mod registry;

mod panic;

pub use callback::CallbackRegistry;
pub use orchestrator::{
    build_orchestrator, route_target, AgentInvoker, CollaborativeOrchestrator, LoopOrchestrator,
    MixedOrchestrator, OrchestrationMode, Orchestrator, OrchestratorConfig, RouteOrchestrator,
    SequentialOrchestrator,
};
pub use registry::AgentRegistry;
